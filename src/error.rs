use thiserror::Error;

/// Errors raised by the Recorder and Player state machines
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("cannot {operation} while {state}")]
    InvalidStateTransition {
        operation: &'static str,
        state: &'static str,
    },

    #[error("no playable resource loaded")]
    NoResource,

    #[error("playback rate must be a positive finite number, got {0}")]
    InvalidRate(f32),

    #[error("pitch shift must be a finite number of cents, got {0}")]
    InvalidPitch(f32),

    #[error("effects graph construction failed: {0}")]
    GraphConstruction(#[from] GraphError),

    #[error("playback failed: {0}")]
    Playback(#[from] PlaybackError),
}

/// Errors from the audio capture service
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CaptureError {
    #[error("input device error: {0}")]
    Device(String),

    #[error("failed to write recording: {0}")]
    Storage(String),

    #[error("audio stream error: {0}")]
    Stream(String),

    #[error("no capture is running for this handle")]
    UnknownHandle,
}

/// Errors from loading or driving the simple playback path
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaybackError {
    #[error("failed to open {path}: {reason}")]
    Open { path: String, reason: String },

    #[error("failed to decode audio: {0}")]
    Decode(String),

    #[error("unsupported audio: {0}")]
    Unsupported(String),

    #[error("audio output unavailable: {0}")]
    Output(String),
}

/// Errors from building or starting the effects graph
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("chain has no source stage")]
    MissingSource,

    #[error("chain is not connected to an output")]
    MissingOutput,

    #[error("chain already has a source stage")]
    DuplicateSource,

    #[error("stage connected after the output")]
    StageAfterOutput,

    #[error("clip has no samples to run through the chain")]
    EmptyClip,
}
