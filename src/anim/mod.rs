pub mod animator;
pub mod ease;
pub mod tween;

pub use animator::{Animator, ChannelStore, ScopeId};
pub use ease::Ease;
pub use tween::{Channel, ChannelId, Tween};
