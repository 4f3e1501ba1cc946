use std::path::{Path, PathBuf};

/// A finished recording, handed from the record screen to the playback screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAudio {
    location: PathBuf,
    title: String,
}

impl RecordedAudio {
    pub fn new(location: PathBuf, title: String) -> Self {
        Self { location, title }
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

/// Identifies one capture started by a capture service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaptureHandle(pub u64);

/// Why a capture session ended without a recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureFailure {
    pub reason: String,
}

/// Completion event of a Recorder session; exactly one per session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecorderEvent {
    Finished(RecordedAudio),
    Failed(CaptureFailure),
}

/// Identifies one playback started by the Player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaybackId(pub u64);

/// Asynchronous notifications delivered back to the Player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The simple path ran to the end
    PlaybackFinished { id: PlaybackId },
    /// The effects graph drained, reverb tail included
    EffectsFinished { id: PlaybackId },
    /// The completion timer armed for an effects playback expired
    TimerFired { id: PlaybackId },
}

/// Commands typed into the console shell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellCommand {
    Record,
    Pause,
    Resume,
    Stop,
    Slow,
    Fast,
    Chipmunk,
    DarthVader,
    Back,
    Help,
    Quit,
}

impl ShellCommand {
    pub fn parse(line: &str) -> Option<Self> {
        let command = match line.trim().to_ascii_lowercase().as_str() {
            "record" | "r" => Self::Record,
            "pause" | "p" => Self::Pause,
            "resume" => Self::Resume,
            "stop" | "s" => Self::Stop,
            "slow" => Self::Slow,
            "fast" => Self::Fast,
            "chipmunk" => Self::Chipmunk,
            "vader" | "darth" | "darthvader" => Self::DarthVader,
            "back" | "b" => Self::Back,
            "help" | "?" => Self::Help,
            "quit" | "q" | "exit" => Self::Quit,
            _ => return None,
        };
        Some(command)
    }
}
