pub mod anim;
pub mod assets;
pub mod audio;
pub mod camera;
pub mod cli;
pub mod clock;
pub mod config;
pub mod cursor;
pub mod geometry;
pub mod instance;
pub mod math;
pub mod motion;
pub mod picking;
pub mod renderer;
pub mod rng;
pub mod scene;

pub use anim::{Animator, Channel, ChannelId, ChannelStore, Ease, ScopeId, Tween};
pub use assets::SoundSet;
pub use audio::AudioMixer;
pub use camera::SceneCamera;
pub use clock::Clock;
pub use config::AppConfig;
pub use cursor::{CursorSink, HoverTracker};
pub use instance::ShapeInstance;
pub use picking::{pick, PickResult};
pub use rng::{RandomSource, SeededRandom, SequenceRandom, ThreadRandom};
pub use scene::{ClickFeedback, Scene, ShapeKind};
