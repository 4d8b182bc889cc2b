//! HUD and text effects

pub mod hud;
pub mod sequencer;

pub use hud::{Hud, HudEvent, LevelStatus};
pub use sequencer::{Effect, Sequencer, SequencerEvent};
