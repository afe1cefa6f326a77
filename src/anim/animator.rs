use super::tween::{ChannelId, Tween};

/// Handle grouping every tween spawned by one instance. Releasing the scope
/// cancels and reverts the whole group in one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u64);

/// Reads and writes the scalar channels tweens drive
pub trait ChannelStore {
    fn channel(&self, id: ChannelId) -> f32;
    fn set_channel(&mut self, id: ChannelId, value: f32);
}

#[derive(Debug)]
struct ActiveTween {
    scope: ScopeId,
    tween: Tween,
    elapsed: f32,
}

/// Frame-ticked tween timeline.
///
/// Tweens advance together on [`Animator::advance`] and write their sampled
/// values straight into the caller's channel store. Finished tweens write
/// their terminal value once and are dropped. [`Animator::release`] is the
/// cleanup path: it synchronously removes a scope's tweens and restores each
/// captured start value, so a torn-down instance is never mutated afterwards.
#[derive(Debug, Default)]
pub struct Animator {
    tweens: Vec<ActiveTween>,
    next_scope: u64,
}

impl Animator {
    pub fn new() -> Self {
        Self {
            tweens: Vec::new(),
            next_scope: 0,
        }
    }

    pub fn create_scope(&mut self) -> ScopeId {
        let id = ScopeId(self.next_scope);
        self.next_scope += 1;
        id
    }

    /// Register a tween under `scope`. It starts advancing on the next tick.
    pub fn spawn(&mut self, scope: ScopeId, tween: Tween) {
        self.tweens.push(ActiveTween {
            scope,
            tween,
            elapsed: 0.0,
        });
    }

    /// Advance every tween by `dt` seconds and write sampled values
    pub fn advance(&mut self, dt: f32, store: &mut dyn ChannelStore) {
        for active in &mut self.tweens {
            active.elapsed += dt;
            store.set_channel(active.tween.target, active.tween.sample(active.elapsed));
        }
        self.tweens.retain(|active| !active.tween.finished(active.elapsed));
    }

    /// Cancel every tween under `scope` and restore captured start values.
    /// Newest-first so the oldest captured value lands last when tweens
    /// share a channel.
    pub fn release(&mut self, scope: ScopeId, store: &mut dyn ChannelStore) {
        for active in self.tweens.iter().rev() {
            if active.scope == scope {
                store.set_channel(active.tween.target, active.tween.start);
            }
        }
        self.tweens.retain(|active| active.scope != scope);
    }

    /// Drop every tween without touching channel values
    pub fn clear(&mut self) {
        self.tweens.clear();
    }

    pub fn is_scope_active(&self, scope: ScopeId) -> bool {
        self.tweens.iter().any(|active| active.scope == scope)
    }

    pub fn is_channel_active(&self, id: ChannelId) -> bool {
        self.tweens.iter().any(|active| active.tween.target == id)
    }

    pub fn active_count(&self) -> usize {
        self.tweens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tweens.is_empty()
    }
}
