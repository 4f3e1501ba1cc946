pub mod player;
pub mod recorder;

pub use player::{Player, PlayerServices, PlayerState, ReverbSettings};
pub use recorder::{Recorder, RecorderState};
