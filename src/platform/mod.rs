//! Contracts for the platform services the Recorder and Player drive.
//!
//! The state machines in `services` only ever talk to these traits; the real
//! implementations here sit on cpal, rodio, hound and tokio.

pub mod capture;
pub mod graph;
pub mod playback;
pub mod storage;
pub mod timer;

pub use capture::CpalCapture;
pub use graph::RodioGraph;
pub use playback::RodioPlayback;
pub use storage::RecordingsDir;
pub use timer::TokioTimer;

use crate::audio::{AudioClip, EffectsChain};
use crate::error::{CaptureError, GraphError, PlaybackError};
use crate::messages::{CaptureHandle, PlaybackId};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::watch;

/// Records from an input device into a destination file
#[async_trait(?Send)]
pub trait CaptureService {
    fn start_capture(&mut self, destination: &Path) -> Result<CaptureHandle, CaptureError>;

    fn pause(&mut self, handle: CaptureHandle) -> Result<(), CaptureError>;

    fn resume(&mut self, handle: CaptureHandle) -> Result<(), CaptureError>;

    /// Finalize the destination file. Ok means the recording is usable.
    async fn stop(&mut self, handle: CaptureHandle) -> Result<(), CaptureError>;

    /// Drop a capture without finalizing it
    fn abort(&mut self, handle: CaptureHandle);
}

/// Variable-rate playback of a single clip
pub trait PlaybackService {
    fn load(&mut self, clip: &AudioClip) -> Result<(), PlaybackError>;

    fn set_rate(&mut self, rate: f32);

    fn rewind(&mut self);

    /// Start playing; completion is reported as `PlayerEvent::PlaybackFinished`
    fn play(&mut self, id: PlaybackId) -> Result<(), PlaybackError>;

    fn stop(&mut self);

    fn is_playing(&self) -> bool;
}

/// Runs a clip through an effects chain to the output
pub trait EffectsGraph {
    fn start(
        &mut self,
        chain: &EffectsChain,
        clip: &AudioClip,
        id: PlaybackId,
    ) -> Result<(), GraphError>;

    fn stop(&mut self);

    /// Drop every stage so the next `start` builds from nothing
    fn reset(&mut self);

    fn is_empty(&self) -> bool;
}

/// One-shot timers that report back as `PlayerEvent::TimerFired`
pub trait TimerService {
    fn schedule_once(&mut self, after: Duration, id: PlaybackId);

    fn invalidate(&mut self, id: PlaybackId);
}

/// Where recordings live on disk
pub trait FileStore {
    /// A fresh location named after the given time
    fn unique_location(&self, now: DateTime<Local>) -> std::io::Result<PathBuf>;

    fn delete(&self, location: &Path) -> std::io::Result<()>;
}

/// Visibility of the "playback in progress" control
pub trait IndicatorSink {
    fn set_visible(&mut self, visible: bool);
}

impl IndicatorSink for watch::Sender<bool> {
    fn set_visible(&mut self, visible: bool) {
        self.send_replace(visible);
    }
}
