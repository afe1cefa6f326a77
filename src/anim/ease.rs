use std::f32::consts::PI;

/// Easing curve applied to tween progress
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ease {
    Linear,
    /// Overshoots past the target and settles with decaying oscillation.
    /// `amplitude` controls overshoot height, `period` the oscillation width.
    ElasticOut { amplitude: f32, period: f32 },
}

impl Ease {
    /// The bouncy entrance/spin curve used across the scene
    pub fn elastic_out(amplitude: f32, period: f32) -> Self {
        Ease::ElasticOut { amplitude, period }
    }

    /// Evaluate the curve at normalized progress `t`. Input outside [0, 1]
    /// clamps to the endpoints so finished tweens land exactly on target.
    pub fn sample(&self, t: f32) -> f32 {
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        match *self {
            Ease::Linear => t,
            Ease::ElasticOut { amplitude, period } => {
                let p = period.max(1e-4);
                let (a, s) = if amplitude < 1.0 {
                    (1.0, p / 4.0)
                } else {
                    (amplitude, p / (2.0 * PI) * (1.0 / amplitude).asin())
                };
                a * (2.0_f32).powf(-10.0 * t) * ((t - s) * (2.0 * PI) / p).sin() + 1.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_is_identity() {
        let ease = Ease::Linear;
        assert_eq!(ease.sample(0.0), 0.0);
        assert_eq!(ease.sample(1.0), 1.0);
        assert!((ease.sample(0.25) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn elastic_endpoints_are_exact() {
        let ease = Ease::elastic_out(1.0, 0.3);
        assert_eq!(ease.sample(0.0), 0.0);
        assert_eq!(ease.sample(1.0), 1.0);
        assert_eq!(ease.sample(-0.5), 0.0);
        assert_eq!(ease.sample(2.0), 1.0);
    }

    #[test]
    fn elastic_overshoots_past_one() {
        let ease = Ease::elastic_out(1.0, 0.3);
        // First oscillation peak sits at t = period/4 + period/4
        let peak = ease.sample(0.15);
        assert!(peak > 1.3, "expected pronounced overshoot, got {}", peak);
    }

    #[test]
    fn elastic_matches_reference_value() {
        let ease = Ease::elastic_out(1.0, 0.3);
        // 2^-5 * sin((0.5 - 0.075) * 2pi / 0.3) + 1
        let v = ease.sample(0.5);
        assert!((v - 1.015625).abs() < 1e-3, "got {}", v);
    }

    #[test]
    fn elastic_oscillation_decays() {
        let ease = Ease::elastic_out(1.0, 0.3);
        let early = (ease.sample(0.15) - 1.0).abs();
        let late = (ease.sample(0.75) - 1.0).abs();
        assert!(late < early);
    }

    #[test]
    fn sub_unit_amplitude_clamps_to_one() {
        let soft = Ease::elastic_out(0.2, 0.3);
        let unit = Ease::elastic_out(1.0, 0.3);
        for i in 1..10 {
            let t = i as f32 / 10.0;
            assert!((soft.sample(t) - unit.sample(t)).abs() < 1e-6);
        }
    }
}
