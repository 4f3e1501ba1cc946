pub mod capture;
pub mod clip;
pub mod effects;
pub mod format;
pub mod pitch_shift;
pub mod reverb;
pub mod sink;
pub mod source;
pub mod wav_sink;

pub use capture::AudioCapture;
pub use clip::AudioClip;
pub use effects::{EffectStage, EffectsChain};
pub use format::AudioFormat;
pub use reverb::ReverbPreset;
pub use sink::AudioSink;
pub use source::ClipSource;
pub use wav_sink::WavSink;
