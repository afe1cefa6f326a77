use crate::anim::{Channel, ChannelId, ChannelStore, ScopeId};
use crate::motion::FloatMotion;
use crate::scene::ShapeKind;
use glam::Vec3;

/// Seconds between mount and the start of the pop-in
pub const REVEAL_DELAY: f32 = 0.3;
/// Seconds the pop-in scale tween runs
pub const REVEAL_DURATION: f32 = 1.0;
/// Seconds for one leg of the click spin (the yoyo doubles it)
pub const SPIN_DURATION: f32 = 1.3;
/// Upper bound of the per-axis random spin offset, radians
pub const SPIN_MAX_OFFSET: f32 = 2.0;

/// Entry animation progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPhase {
    /// Mounted but not yet shown; scale is zero
    Hidden,
    /// Visible and scaling up from zero
    Revealing,
    /// Entry finished; only ambient motion and click tweens apply
    Idle,
}

/// One mounted shape: fixed placement plus the mutable state pointer events
/// and tweens drive.
#[derive(Debug)]
pub struct ShapeInstance {
    pub kind: ShapeKind,
    /// World anchor, already spread by the registry
    pub home: Vec3,
    pub radius_factor: f32,
    /// Radius of the natural-size mesh, for picking
    pub bounding_radius: f32,
    pub material_index: usize,
    pub visible: bool,
    /// Uniform scale multiplier on the natural size; the entry tween drives
    /// this 0 to 1
    pub scale: f32,
    /// Base rotation in radians; click tweens write here while ambient sway
    /// is layered on top per frame
    pub rotation: Vec3,
    pub motion: FloatMotion,
    pub phase: EntryPhase,
    /// Seconds since mount
    pub age: f32,
    pub scope: ScopeId,
}

impl ShapeInstance {
    pub fn new(
        kind: ShapeKind,
        home: Vec3,
        radius_factor: f32,
        bounding_radius: f32,
        material_index: usize,
        motion: FloatMotion,
        scope: ScopeId,
    ) -> Self {
        Self {
            kind,
            home,
            radius_factor,
            bounding_radius,
            material_index,
            visible: false,
            scale: 0.0,
            rotation: Vec3::ZERO,
            motion,
            phase: EntryPhase::Hidden,
            age: 0.0,
            scope,
        }
    }

    /// Advance the entry timer. Visibility flips exactly once, when the
    /// reveal delay elapses, and never reverts.
    pub fn tick(&mut self, dt: f32) {
        self.age += dt;
        if self.phase == EntryPhase::Hidden && self.age >= REVEAL_DELAY {
            self.visible = true;
            self.phase = EntryPhase::Revealing;
        }
    }

    /// Called once the entry scale tween has finished
    pub fn finish_reveal(&mut self) {
        if self.phase == EntryPhase::Revealing {
            self.phase = EntryPhase::Idle;
        }
    }

    /// Full rotation at `time`: tweened base plus ambient sway
    pub fn rotation_at(&self, time: f32) -> Vec3 {
        self.rotation + self.motion.rotation_offset(time)
    }

    /// Full position at `time`: home anchor plus ambient bob
    pub fn position_at(&self, time: f32) -> Vec3 {
        self.home + self.motion.position_offset(time)
    }

    /// Picking radius in world units at the current scale
    pub fn world_radius(&self) -> f32 {
        self.bounding_radius * self.scale
    }

    /// Whether pointer rays may hit this instance
    pub fn pickable(&self) -> bool {
        self.visible && self.scale > f32::EPSILON
    }
}

impl ChannelStore for Vec<ShapeInstance> {
    fn channel(&self, id: ChannelId) -> f32 {
        match self.get(id.instance) {
            Some(inst) => match id.channel {
                Channel::Scale => inst.scale,
                Channel::RotationX => inst.rotation.x,
                Channel::RotationY => inst.rotation.y,
                Channel::RotationZ => inst.rotation.z,
            },
            None => 0.0,
        }
    }

    fn set_channel(&mut self, id: ChannelId, value: f32) {
        if let Some(inst) = self.get_mut(id.instance) {
            match id.channel {
                Channel::Scale => inst.scale = value,
                Channel::RotationX => inst.rotation.x = value,
                Channel::RotationY => inst.rotation.y = value,
                Channel::RotationZ => inst.rotation.z = value,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::Animator;

    fn instance(scope: ScopeId) -> ShapeInstance {
        ShapeInstance::new(
            ShapeKind::Icosahedron,
            Vec3::ZERO,
            0.3,
            3.0,
            0,
            FloatMotion::from_radius_factor(0.3, 0.0),
            scope,
        )
    }

    #[test]
    fn starts_hidden_at_zero_scale() {
        let mut animator = Animator::new();
        let inst = instance(animator.create_scope());
        assert_eq!(inst.phase, EntryPhase::Hidden);
        assert!(!inst.visible);
        assert_eq!(inst.scale, 0.0);
        assert!(!inst.pickable());
    }

    #[test]
    fn visibility_flips_when_the_delay_elapses() {
        let mut animator = Animator::new();
        let mut inst = instance(animator.create_scope());

        inst.tick(0.2);
        assert!(!inst.visible);
        assert_eq!(inst.phase, EntryPhase::Hidden);

        inst.tick(0.2);
        assert!(inst.visible);
        assert_eq!(inst.phase, EntryPhase::Revealing);
    }

    #[test]
    fn visibility_never_reverts() {
        let mut animator = Animator::new();
        let mut inst = instance(animator.create_scope());
        for _ in 0..100 {
            inst.tick(0.1);
        }
        assert!(inst.visible);
    }

    #[test]
    fn finish_reveal_only_applies_once_revealing() {
        let mut animator = Animator::new();
        let mut inst = instance(animator.create_scope());

        inst.finish_reveal();
        assert_eq!(inst.phase, EntryPhase::Hidden);

        inst.tick(0.4);
        inst.finish_reveal();
        assert_eq!(inst.phase, EntryPhase::Idle);
    }

    #[test]
    fn transform_composes_base_and_ambient_parts() {
        let mut animator = Animator::new();
        let mut inst = instance(animator.create_scope());
        inst.rotation = Vec3::new(1.0, 2.0, 3.0);

        let ambient = inst.motion.rotation_offset(5.0);
        assert_eq!(inst.rotation_at(5.0), inst.rotation + ambient);

        let bob = inst.motion.position_offset(5.0);
        assert_eq!(inst.position_at(5.0), inst.home + bob);
    }

    #[test]
    fn channel_store_routes_to_fields() {
        let mut animator = Animator::new();
        let scope = animator.create_scope();
        let mut instances = vec![instance(scope)];

        instances.set_channel(ChannelId::new(0, Channel::Scale), 0.5);
        instances.set_channel(ChannelId::new(0, Channel::RotationY), 1.25);

        assert_eq!(instances[0].scale, 0.5);
        assert_eq!(instances[0].rotation.y, 1.25);
        assert_eq!(instances.channel(ChannelId::new(0, Channel::Scale)), 0.5);
        assert_eq!(
            instances.channel(ChannelId::new(0, Channel::RotationY)),
            1.25
        );
    }

    #[test]
    fn channel_store_ignores_out_of_range_instances() {
        let mut animator = Animator::new();
        let scope = animator.create_scope();
        let mut instances = vec![instance(scope)];

        instances.set_channel(ChannelId::new(9, Channel::Scale), 0.5);
        assert_eq!(instances.channel(ChannelId::new(9, Channel::Scale)), 0.0);
        assert_eq!(instances[0].scale, 0.0);
    }
}
