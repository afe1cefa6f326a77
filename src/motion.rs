use crate::math::map_range;
use glam::Vec3;

/// Continuous bobbing and swaying applied to a shape for its whole lifetime.
///
/// Pure function of scene time: callers add the returned offsets on top of
/// the instance's base transform each frame, so click-driven rotation tweens
/// and ambient sway never fight over the same value.
#[derive(Debug, Clone, Copy)]
pub struct FloatMotion {
    pub speed: f32,
    pub rotation_intensity: f32,
    pub float_intensity: f32,
    pub floating_range: [f32; 2],
    /// Per-instance time offset so the five shapes drift out of sync
    pub phase: f32,
}

impl FloatMotion {
    /// Motion profile derived from a descriptor's radius factor: bigger
    /// shapes sway faster and wider.
    pub fn from_radius_factor(radius_factor: f32, phase: f32) -> Self {
        Self {
            speed: 5.0 * radius_factor,
            rotation_intensity: 6.0 * radius_factor,
            float_intensity: 5.0 * radius_factor,
            floating_range: [-0.1, 0.1],
            phase,
        }
    }

    pub fn rotation_offset(&self, time: f32) -> Vec3 {
        let t = (self.phase + time) / 4.0 * self.speed;
        Vec3::new(
            t.cos() / 8.0 * self.rotation_intensity,
            t.sin() / 8.0 * self.rotation_intensity,
            t.sin() / 20.0 * self.rotation_intensity,
        )
    }

    pub fn position_offset(&self, time: f32) -> Vec3 {
        let t = (self.phase + time) / 4.0 * self.speed;
        let yt = t.sin() / 10.0;
        let y = map_range(
            yt,
            -0.1,
            0.1,
            self.floating_range[0],
            self.floating_range[1],
        ) * self.float_intensity;
        Vec3::new(0.0, y, 0.0)
    }
}
