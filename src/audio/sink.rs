use anyhow::Result;
use async_trait::async_trait;

/// Destination for captured samples while a recording is running
#[async_trait]
pub trait AudioSink: Send {
    /// Queue samples for writing. The Vec is moved to avoid copying.
    fn write_chunk(&mut self, samples: Vec<f32>) -> Result<()>;

    /// Flush and close the recording, returning the number of samples written
    async fn finalize(&mut self) -> Result<u64>;
}
