use super::CaptureService;
use crate::audio::{AudioCapture, AudioFormat, AudioSink, WavSink};
use crate::error::CaptureError;
use crate::messages::CaptureHandle;
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

struct ActiveCapture {
    handle: CaptureHandle,
    capture: AudioCapture,
    writer: JoinHandle<Result<u64>>,
}

/// Captures the default input device into a WAV file
///
/// Holds a cpal::Stream while recording, which is !Send, so this has to live
/// on a LocalSet like everything else that owns one.
pub struct CpalCapture {
    format: AudioFormat,
    faults: mpsc::UnboundedSender<(CaptureHandle, String)>,
    next_handle: u64,
    active: Option<ActiveCapture>,
}

impl CpalCapture {
    /// Device faults raised mid-recording are reported on `faults`
    pub fn new(format: AudioFormat, faults: mpsc::UnboundedSender<(CaptureHandle, String)>) -> Self {
        Self {
            format,
            faults,
            next_handle: 0,
            active: None,
        }
    }

    fn active(&self, handle: CaptureHandle) -> Result<&ActiveCapture, CaptureError> {
        self.active
            .as_ref()
            .filter(|active| active.handle == handle)
            .ok_or(CaptureError::UnknownHandle)
    }

    async fn write_chunks(
        mut sink: WavSink,
        mut chunk_rx: mpsc::Receiver<Vec<f32>>,
    ) -> Result<u64> {
        while let Some(chunk) = chunk_rx.recv().await {
            sink.write_chunk(chunk)?;
        }
        sink.finalize().await
    }
}

#[async_trait(?Send)]
impl CaptureService for CpalCapture {
    fn start_capture(&mut self, destination: &Path) -> Result<CaptureHandle, CaptureError> {
        if self.active.is_some() {
            return Err(CaptureError::Device("a capture is already running".into()));
        }

        self.next_handle += 1;
        let handle = CaptureHandle(self.next_handle);

        let sink = WavSink::create(destination, self.format)
            .map_err(|e| CaptureError::Storage(format!("{:#}", e)))?;

        let (chunk_tx, chunk_rx) = mpsc::channel(100);
        let faults = self.faults.clone();
        let capture = AudioCapture::start(self.format, chunk_tx, move |reason| {
            let _ = faults.send((handle, reason));
        })
        .map_err(|e| CaptureError::Device(format!("{:#}", e)))?;

        let writer = tokio::task::spawn_local(Self::write_chunks(sink, chunk_rx));

        tracing::info!("Capturing into {:?}", destination);
        self.active = Some(ActiveCapture {
            handle,
            capture,
            writer,
        });
        Ok(handle)
    }

    fn pause(&mut self, handle: CaptureHandle) -> Result<(), CaptureError> {
        self.active(handle)?
            .capture
            .pause()
            .map_err(|e| CaptureError::Stream(format!("{:#}", e)))
    }

    fn resume(&mut self, handle: CaptureHandle) -> Result<(), CaptureError> {
        self.active(handle)?
            .capture
            .resume()
            .map_err(|e| CaptureError::Stream(format!("{:#}", e)))
    }

    async fn stop(&mut self, handle: CaptureHandle) -> Result<(), CaptureError> {
        self.active(handle)?;
        let Some(active) = self.active.take() else {
            return Err(CaptureError::UnknownHandle);
        };

        // Closing the bridge ends the writer loop, which then finalizes the file
        active.capture.shutdown().await;

        let written = active
            .writer
            .await
            .map_err(|e| CaptureError::Storage(format!("writer task failed: {}", e)))?
            .map_err(|e| CaptureError::Storage(format!("{:#}", e)))?;

        if written == 0 {
            return Err(CaptureError::Device("no audio was captured".into()));
        }

        tracing::info!("Capture finalized with {} samples", written);
        Ok(())
    }

    fn abort(&mut self, handle: CaptureHandle) {
        if self.active(handle).is_err() {
            return;
        }
        if let Some(active) = self.active.take() {
            active.writer.abort();
            drop(active.capture);
            tracing::info!("Capture aborted");
        }
    }
}
