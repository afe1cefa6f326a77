use super::ease::Ease;

/// Animatable scalar channel on a shape instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Scale,
    RotationX,
    RotationY,
    RotationZ,
}

/// Address of one channel on one instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId {
    pub instance: usize,
    pub channel: Channel,
}

impl ChannelId {
    pub fn new(instance: usize, channel: Channel) -> Self {
        Self { instance, channel }
    }
}

/// A single in-flight interpolation from `start` to `end`.
///
/// `start` doubles as the captured pre-tween value: releasing the owning
/// scope writes it back, and a completed yoyo ends on it.
#[derive(Debug, Clone)]
pub struct Tween {
    pub target: ChannelId,
    pub start: f32,
    pub end: f32,
    pub duration: f32,
    pub delay: f32,
    pub ease: Ease,
    pub yoyo: bool,
}

impl Tween {
    pub fn new(target: ChannelId, start: f32, end: f32, duration: f32) -> Self {
        Self {
            target,
            start,
            end,
            duration: duration.max(1e-6),
            delay: 0.0,
            ease: Ease::Linear,
            yoyo: false,
        }
    }

    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay.max(0.0);
        self
    }

    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    /// Play forward to the target, then mirror back to the start value
    pub fn with_yoyo(mut self) -> Self {
        self.yoyo = true;
        self
    }

    /// Wall-clock span from spawn to the final write
    pub fn total_duration(&self) -> f32 {
        let play = if self.yoyo {
            self.duration * 2.0
        } else {
            self.duration
        };
        self.delay + play
    }

    pub fn finished(&self, elapsed: f32) -> bool {
        elapsed >= self.total_duration()
    }

    /// Channel value at `elapsed` seconds since spawn
    pub fn sample(&self, elapsed: f32) -> f32 {
        let active = elapsed - self.delay;
        if active <= 0.0 {
            return self.start;
        }
        let progress = if !self.yoyo {
            (active / self.duration).min(1.0)
        } else if active < self.duration {
            active / self.duration
        } else {
            // Mirrored leg runs the same curve backwards in time so the
            // final write is exactly `start`.
            ((self.duration * 2.0 - active) / self.duration).max(0.0)
        };
        self.start + (self.end - self.start) * self.ease.sample(progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> ChannelId {
        ChannelId::new(0, Channel::Scale)
    }

    #[test]
    fn holds_start_value_during_delay() {
        let tween = Tween::new(channel(), 2.0, 5.0, 1.0).with_delay(0.3);
        assert_eq!(tween.sample(0.0), 2.0);
        assert_eq!(tween.sample(0.29), 2.0);
        assert!(!tween.finished(0.29));
    }

    #[test]
    fn linear_interpolates_after_delay() {
        let tween = Tween::new(channel(), 0.0, 10.0, 1.0).with_delay(0.5);
        let v = tween.sample(1.0);
        assert!((v - 5.0).abs() < 1e-5);
    }

    #[test]
    fn reaches_end_exactly() {
        let tween = Tween::new(channel(), 0.0, 1.0, 1.0).with_ease(Ease::elastic_out(1.0, 0.3));
        assert_eq!(tween.sample(1.0), 1.0);
        assert_eq!(tween.sample(5.0), 1.0);
        assert!(tween.finished(1.0));
    }

    #[test]
    fn yoyo_returns_to_start_exactly() {
        let tween = Tween::new(channel(), 0.7, 2.7, 1.3)
            .with_ease(Ease::elastic_out(1.0, 0.3))
            .with_yoyo();
        assert_eq!(tween.total_duration(), 2.6);
        assert!(!tween.finished(2.59));
        assert!(tween.finished(2.6));
        assert_eq!(tween.sample(2.6), 0.7);
        assert_eq!(tween.sample(3.0), 0.7);
    }

    #[test]
    fn yoyo_reaches_target_at_half() {
        let tween = Tween::new(channel(), 1.0, 3.0, 1.0).with_yoyo();
        assert!((tween.sample(1.0) - 3.0).abs() < 1e-5);
    }

    #[test]
    fn yoyo_reverse_leg_mirrors_forward_leg() {
        let tween = Tween::new(channel(), 0.0, 4.0, 1.0)
            .with_ease(Ease::elastic_out(1.0, 0.3))
            .with_yoyo();
        let forward = tween.sample(0.4);
        let mirrored = tween.sample(1.6);
        assert!((forward - mirrored).abs() < 1e-5);
    }

    #[test]
    fn zero_duration_is_clamped_not_divided() {
        let tween = Tween::new(channel(), 0.0, 1.0, 0.0);
        let v = tween.sample(0.1);
        assert!(v.is_finite());
        assert_eq!(v, 1.0);
    }
}
