use super::format::AudioFormat;
use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleRate, StreamConfig};
use ringbuf::{HeapRb, traits::*};
use std::sync::Arc;
use tokio::sync::{Notify, mpsc, oneshot};
use tokio::task::JoinHandle;

/// A running input stream plus the task bridging it onto a tokio channel.
///
/// Dropping the stream stops the device callback; `shutdown` then flushes
/// whatever is left in the ring buffer and closes the chunk channel.
pub struct AudioCapture {
    stream: cpal::Stream,
    shutdown: Option<oneshot::Sender<()>>,
    bridge: JoinHandle<()>,
}

impl AudioCapture {
    /// Start audio capture
    ///
    /// Audio chunks are sent via chunk_tx. Stream errors reported by the device
    /// callback are passed to on_error.
    pub fn start(
        format: AudioFormat,
        chunk_tx: mpsc::Sender<Vec<f32>>,
        mut on_error: impl FnMut(String) + Send + 'static,
    ) -> Result<Self> {
        let ring = HeapRb::<f32>::new(format.samples_for_duration(60.0));
        let (mut producer, consumer) = ring.split();

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .context("No input audio device available")?;

        let config = StreamConfig {
            channels: format.channels,
            sample_rate: SampleRate(format.sample_rate),
            buffer_size: BufferSize::Default,
        };

        let notify = Arc::new(Notify::new());
        let notify_callback = notify.clone();

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                    producer.push_slice(data);
                    notify_callback.notify_one();
                },
                move |err| on_error(err.to_string()),
                None,
            )
            .context("Failed to build input stream")?;

        stream.play().context("Failed to start audio stream")?;

        let (shutdown, shutdown_rx) = oneshot::channel();
        let chunk_size = format.samples_for_duration(0.5);
        let bridge = tokio::task::spawn_local(Self::bridge_task(
            consumer,
            chunk_tx,
            chunk_size,
            notify,
            shutdown_rx,
        ));

        tracing::info!("Audio capture started");
        Ok(Self {
            stream,
            shutdown: Some(shutdown),
            bridge,
        })
    }

    pub fn pause(&self) -> Result<()> {
        self.stream.pause().context("Failed to pause audio stream")
    }

    pub fn resume(&self) -> Result<()> {
        self.stream.play().context("Failed to resume audio stream")
    }

    /// Stop the device and wait until every buffered sample has been handed off
    pub async fn shutdown(mut self) {
        drop(self.stream);
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Err(e) = self.bridge.await {
            tracing::warn!("Capture bridge task ended abnormally: {}", e);
        }
        tracing::info!("Audio capture stopped");
    }

    async fn bridge_task(
        mut consumer: impl Consumer<Item = f32>,
        tx: mpsc::Sender<Vec<f32>>,
        chunk_size: usize,
        notify: Arc<Notify>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                _ = notify.notified() => {
                    let available = consumer.occupied_len();
                    if available >= chunk_size {
                        let mut chunk = vec![0.0f32; chunk_size];
                        let n = consumer.pop_slice(&mut chunk);
                        chunk.truncate(n);

                        if tx.send(chunk).await.is_err() {
                            break;
                        }
                    }
                }
                _ = &mut shutdown => {
                    let remaining = consumer.occupied_len();
                    if remaining > 0 {
                        let mut chunk = vec![0.0f32; remaining];
                        let n = consumer.pop_slice(&mut chunk);
                        chunk.truncate(n);
                        let _ = tx.send(chunk).await;
                    }
                    break;
                }
            }
        }
    }
}
