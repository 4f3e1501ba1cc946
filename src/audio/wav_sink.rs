use super::format::AudioFormat;
use super::sink::AudioSink;
use anyhow::{Context, Result};
use async_trait::async_trait;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::{Seek, Write};
use std::path::Path;
use tokio::sync::{mpsc, oneshot};

enum WavCommand {
    WriteChunk(Vec<f32>),
    Finalize { reply: oneshot::Sender<Result<u64>> },
}

/// 16-bit PCM WAV writer running on its own blocking thread.
///
/// The first write error is remembered and reported from `finalize`, so a
/// full disk turns into a failed recording rather than a truncated file that
/// looks fine.
pub struct WavSink {
    tx: mpsc::UnboundedSender<WavCommand>,
}

impl WavSink {
    pub fn create(path: &Path, format: AudioFormat) -> Result<Self> {
        let writer = WavWriter::create(path, Self::spec(format))
            .with_context(|| format!("Failed to create WAV writer at {:?}", path))?;

        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::spawn(move || Self::writer_thread(writer, rx));

        Ok(Self { tx })
    }

    fn spec(format: AudioFormat) -> WavSpec {
        WavSpec {
            channels: format.channels,
            sample_rate: format.sample_rate,
            bits_per_sample: AudioFormat::BITS_PER_SAMPLE,
            sample_format: SampleFormat::Int,
        }
    }

    fn writer_thread<W: Write + Seek>(
        mut writer: WavWriter<W>,
        mut rx: mpsc::UnboundedReceiver<WavCommand>,
    ) {
        let mut written: u64 = 0;
        let mut failure: Option<anyhow::Error> = None;

        while let Some(cmd) = rx.blocking_recv() {
            match cmd {
                WavCommand::WriteChunk(samples) => {
                    if failure.is_some() {
                        continue;
                    }
                    for sample in samples {
                        if let Err(e) = writer.write_sample(to_pcm16(sample)) {
                            failure = Some(anyhow::anyhow!("Failed to write sample: {}", e));
                            break;
                        }
                        written += 1;
                    }
                }
                WavCommand::Finalize { reply } => {
                    let result = match failure.take() {
                        Some(e) => Err(e),
                        None => writer
                            .finalize()
                            .map(|_| written)
                            .map_err(|e| anyhow::anyhow!("Failed to finalize WAV: {}", e)),
                    };
                    let _ = reply.send(result);
                    return;
                }
            }
        }
    }
}

/// Convert f32 (-1.0 to 1.0) to i16
fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

#[async_trait]
impl AudioSink for WavSink {
    fn write_chunk(&mut self, samples: Vec<f32>) -> Result<()> {
        self.tx
            .send(WavCommand::WriteChunk(samples))
            .map_err(|e| anyhow::anyhow!("Failed to send write command: {}", e))
    }

    async fn finalize(&mut self) -> Result<u64> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(WavCommand::Finalize { reply })
            .map_err(|e| anyhow::anyhow!("Failed to send finalize command: {}", e))?;

        rx.await
            .map_err(|e| anyhow::anyhow!("Failed to receive finalize response: {}", e))?
    }
}
