use crate::instance::ShapeInstance;
use crate::math::Ray;

/// A successful hit test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickResult {
    /// Index into the instance list
    pub index: usize,
    /// Distance along the ray to the hit point
    pub distance: f32,
}

/// Test `ray` against every pickable instance's bounding sphere at scene
/// time `time` and return the closest hit. Spheres follow the instances
/// through their ambient bob and entry scaling, so a shape mid-reveal is
/// only as clickable as it is big.
pub fn pick(ray: &Ray, instances: &[ShapeInstance], time: f32) -> Option<PickResult> {
    let mut best: Option<PickResult> = None;

    for (index, inst) in instances.iter().enumerate() {
        if !inst.pickable() {
            continue;
        }
        let center = inst.position_at(time);
        let radius = inst.world_radius();
        if let Some(distance) = ray.intersect_sphere(center, radius) {
            let closer = match best {
                Some(ref hit) => distance < hit.distance,
                None => true,
            };
            if closer {
                best = Some(PickResult { index, distance });
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::ShapeInstance;
    use crate::motion::FloatMotion;
    use crate::scene::ShapeKind;
    use glam::Vec3;

    fn revealed_instance(kind: ShapeKind, home: Vec3, bounding_radius: f32) -> ShapeInstance {
        let scope = crate::anim::Animator::new().create_scope();
        let mut inst = ShapeInstance::new(
            kind,
            home,
            0.5,
            bounding_radius,
            0,
            FloatMotion::from_radius_factor(0.5, 0.0),
            scope,
        );
        inst.visible = true;
        inst.scale = 1.0;
        inst
    }

    fn toward(origin: Vec3, target: Vec3) -> Ray {
        Ray::new(origin, (target - origin).normalize())
    }

    #[test]
    fn ray_through_center_hits() {
        let inst = revealed_instance(ShapeKind::Icosahedron, Vec3::ZERO, 3.0);
        let instances = vec![inst];
        let ray = toward(Vec3::new(0.0, 0.0, 25.0), instances[0].position_at(0.0));

        let hit = pick(&ray, &instances, 0.0).unwrap();
        assert_eq!(hit.index, 0);
        assert!((hit.distance - 22.0).abs() < 0.5);
    }

    #[test]
    fn ray_far_off_axis_misses() {
        let inst = revealed_instance(ShapeKind::Icosahedron, Vec3::ZERO, 3.0);
        let instances = vec![inst];
        let ray = Ray::new(Vec3::new(0.0, 0.0, 25.0), Vec3::new(1.0, 0.0, 0.0));

        assert!(pick(&ray, &instances, 0.0).is_none());
    }

    #[test]
    fn closest_of_two_overlapping_wins() {
        let near = revealed_instance(ShapeKind::Torus, Vec3::new(0.0, 0.0, 10.0), 1.0);
        let far = revealed_instance(ShapeKind::Octahedron, Vec3::new(0.0, 0.0, -8.0), 2.0);
        let instances = vec![far, near];
        let ray = Ray::new(Vec3::new(0.0, 0.0, 25.0), Vec3::new(0.0, 0.0, -1.0));

        let hit = pick(&ray, &instances, 0.0).unwrap();
        assert_eq!(hit.index, 1, "the nearer torus should shadow the octahedron");
    }

    #[test]
    fn hidden_instances_are_not_pickable() {
        let mut inst = revealed_instance(ShapeKind::Capsule, Vec3::ZERO, 1.3);
        inst.visible = false;
        let instances = vec![inst];
        let ray = Ray::new(Vec3::new(0.0, 0.0, 25.0), Vec3::new(0.0, 0.0, -1.0));

        assert!(pick(&ray, &instances, 0.0).is_none());
    }

    #[test]
    fn zero_scale_instances_are_not_pickable() {
        let mut inst = revealed_instance(ShapeKind::Capsule, Vec3::ZERO, 1.3);
        inst.scale = 0.0;
        let instances = vec![inst];
        let ray = Ray::new(Vec3::new(0.0, 0.0, 25.0), Vec3::new(0.0, 0.0, -1.0));

        assert!(pick(&ray, &instances, 0.0).is_none());
    }

    #[test]
    fn shrunken_instance_needs_a_tighter_ray() {
        let mut inst = revealed_instance(ShapeKind::Dodecahedron, Vec3::ZERO, 1.5);
        inst.scale = 0.1;
        let instances = vec![inst];

        // Grazing ray that would hit the full-size sphere misses the shrunken one
        let graze = Ray::new(Vec3::new(1.0, 0.0, 25.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(pick(&graze, &instances, 0.0).is_none());

        let center = toward(Vec3::new(0.0, 0.0, 25.0), instances[0].position_at(0.0));
        assert!(pick(&center, &instances, 0.0).is_some());
    }

    #[test]
    fn bob_moves_the_hit_sphere() {
        // radius_factor 0.5 bobs up to 0.25 units, more than this radius
        let instances = vec![revealed_instance(ShapeKind::Icosahedron, Vec3::ZERO, 0.2)];

        // Peak of the bob: inner time (elapsed / 4) * speed reaches pi/2
        let speed = instances[0].motion.speed;
        let peak_time = std::f32::consts::FRAC_PI_2 * 4.0 / speed;
        let offset = instances[0].position_at(peak_time) - Vec3::ZERO;
        assert!(offset.y > 0.2, "bob should clear the bounding radius");

        let stale = Ray::new(Vec3::new(0.0, 0.0, 25.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(pick(&stale, &instances, peak_time).is_none());

        let tracking = toward(Vec3::new(0.0, 0.0, 25.0), instances[0].position_at(peak_time));
        assert!(pick(&tracking, &instances, peak_time).is_some());
    }
}
