use crate::error::SessionError;
use crate::messages::{CaptureFailure, CaptureHandle, RecordedAudio, RecorderEvent};
use crate::platform::{CaptureService, FileStore};
use chrono::Local;
use std::path::PathBuf;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Paused,
    Finished,
    Failed,
}

impl RecorderState {
    fn describe(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Paused => "paused",
            Self::Finished => "finished",
            Self::Failed => "failed",
        }
    }
}

struct Session {
    handle: Option<CaptureHandle>,
    location: PathBuf,
}

/// Drives one capture session at a time
///
/// Every session ends with exactly one event on the completion channel:
/// `Finished` with the recording, or `Failed`. Device and storage problems
/// never surface as errors from the methods here; they move the session to
/// `Failed` instead, and `reset` makes it ready for another `start`.
pub struct Recorder {
    state: RecorderState,
    capture: Box<dyn CaptureService>,
    store: Box<dyn FileStore>,
    events: mpsc::UnboundedSender<RecorderEvent>,
    session: Option<Session>,
}

impl Recorder {
    pub fn new(
        capture: Box<dyn CaptureService>,
        store: Box<dyn FileStore>,
        events: mpsc::UnboundedSender<RecorderEvent>,
    ) -> Self {
        Self {
            state: RecorderState::Idle,
            capture,
            store,
            events,
            session: None,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn start(&mut self) -> Result<(), SessionError> {
        self.expect("start", &[RecorderState::Idle])?;

        let location = match self.store.unique_location(Local::now()) {
            Ok(location) => location,
            Err(e) => {
                self.fail(format!("cannot allocate a recording file: {}", e));
                return Ok(());
            }
        };

        self.session = Some(Session {
            handle: None,
            location: location.clone(),
        });

        match self.capture.start_capture(&location) {
            Ok(handle) => {
                if let Some(session) = self.session.as_mut() {
                    session.handle = Some(handle);
                }
                self.state = RecorderState::Recording;
                tracing::info!("Recording started");
            }
            Err(e) => self.fail(e.to_string()),
        }
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), SessionError> {
        self.expect("pause", &[RecorderState::Recording])?;
        let handle = self.live_handle("pause")?;

        match self.capture.pause(handle) {
            Ok(()) => {
                self.state = RecorderState::Paused;
                tracing::info!("Recording paused");
            }
            Err(e) => self.fail(e.to_string()),
        }
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), SessionError> {
        self.expect("resume", &[RecorderState::Paused])?;
        let handle = self.live_handle("resume")?;

        match self.capture.resume(handle) {
            Ok(()) => {
                self.state = RecorderState::Recording;
                tracing::info!("Recording resumed");
            }
            Err(e) => self.fail(e.to_string()),
        }
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<(), SessionError> {
        self.expect("stop", &[RecorderState::Recording, RecorderState::Paused])?;
        let handle = self.live_handle("stop")?;

        if let Err(e) = self.capture.stop(handle).await {
            self.fail(e.to_string());
            return Ok(());
        }

        let Some(session) = self.session.take() else {
            self.fail("capture session went missing".into());
            return Ok(());
        };

        let title = session
            .location
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "recording".to_string());

        self.state = RecorderState::Finished;
        tracing::info!("Recording stopped: {}", title);
        self.emit(RecorderEvent::Finished(RecordedAudio::new(
            session.location,
            title,
        )));
        Ok(())
    }

    /// A fault reported by the capture service outside of any call
    pub fn capture_failed(&mut self, handle: CaptureHandle, reason: String) {
        let live = self.session.as_ref().and_then(|s| s.handle) == Some(handle);
        if !live || !matches!(self.state, RecorderState::Recording | RecorderState::Paused) {
            tracing::debug!("Ignoring fault from stale capture {:?}: {}", handle, reason);
            return;
        }
        self.fail(reason);
    }

    /// Return a finished or failed session to idle
    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.expect(
            "reset",
            &[
                RecorderState::Idle,
                RecorderState::Finished,
                RecorderState::Failed,
            ],
        )?;
        self.state = RecorderState::Idle;
        Ok(())
    }

    fn expect(
        &self,
        operation: &'static str,
        allowed: &[RecorderState],
    ) -> Result<(), SessionError> {
        if allowed.contains(&self.state) {
            return Ok(());
        }
        tracing::warn!("Rejected {} while {}", operation, self.state.describe());
        Err(SessionError::InvalidStateTransition {
            operation,
            state: self.state.describe(),
        })
    }

    fn live_handle(&self, operation: &'static str) -> Result<CaptureHandle, SessionError> {
        self.session
            .as_ref()
            .and_then(|s| s.handle)
            .ok_or_else(|| {
                tracing::warn!("Rejected {} without a live capture", operation);
                SessionError::InvalidStateTransition {
                    operation,
                    state: self.state.describe(),
                }
            })
    }

    fn fail(&mut self, reason: String) {
        if let Some(session) = self.session.take() {
            if let Some(handle) = session.handle {
                self.capture.abort(handle);
            }
            match self.store.delete(&session.location) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(
                    "Failed to remove partial recording {:?}: {}",
                    session.location,
                    e
                ),
            }
        }

        tracing::error!("Recording failed: {}", reason);
        self.state = RecorderState::Failed;
        self.emit(RecorderEvent::Failed(CaptureFailure { reason }));
    }

    fn emit(&self, event: RecorderEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("Nobody is listening for recorder events");
        }
    }
}
