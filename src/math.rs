use glam::Vec3;

/// Ray with origin and direction for pointer picking
#[derive(Copy, Clone, Debug)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }

    /// Test ray-sphere intersection, returning the nearest positive hit distance
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let a = self.dir.dot(self.dir);
        let half_b = oc.dot(self.dir);
        let c = oc.dot(oc) - radius * radius;

        let discriminant = half_b * half_b - a * c;

        if discriminant < 0.0 {
            return None;
        }

        let sqrt_d = discriminant.sqrt();
        let t = (-half_b - sqrt_d) / a;

        if t > 1e-4 {
            Some(t)
        } else {
            let t = (-half_b + sqrt_d) / a;
            if t > 1e-4 {
                Some(t)
            } else {
                None
            }
        }
    }
}

/// Linearly remap `value` from [in_min, in_max] to [out_min, out_max]
pub fn map_range(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    if (in_max - in_min).abs() < f32::EPSILON {
        return out_min;
    }
    out_min + (value - in_min) / (in_max - in_min) * (out_max - out_min)
}
