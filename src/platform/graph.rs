use super::EffectsGraph;
use crate::audio::{AudioClip, ClipSource, EffectsChain};
use crate::error::GraphError;
use crate::messages::{PlaybackId, PlayerEvent};
use rodio::Sink;
use rodio::mixer::Mixer;
use tokio::sync::mpsc;

/// Effects path: the chain's processors run inside a rodio source
///
/// The graph is considered built while it holds a chain, even after the sink
/// has drained; only `reset` empties it.
pub struct RodioGraph {
    mixer: Mixer,
    events: mpsc::UnboundedSender<PlayerEvent>,
    chain: Option<EffectsChain>,
    sink: Option<Sink>,
}

impl RodioGraph {
    pub fn new(mixer: Mixer, events: mpsc::UnboundedSender<PlayerEvent>) -> Self {
        Self {
            mixer,
            events,
            chain: None,
            sink: None,
        }
    }
}

impl EffectsGraph for RodioGraph {
    fn start(
        &mut self,
        chain: &EffectsChain,
        clip: &AudioClip,
        id: PlaybackId,
    ) -> Result<(), GraphError> {
        if clip.samples().is_empty() {
            return Err(GraphError::EmptyClip);
        }
        if !self.is_empty() {
            self.stop();
            self.reset();
        }

        let processors = chain.processors(clip.sample_rate());
        let events = self.events.clone();
        let source = ClipSource::new(clip.clone())
            .with_processors(processors)
            .on_end(move || {
                let _ = events.send(PlayerEvent::EffectsFinished { id });
            });

        let sink = Sink::connect_new(&self.mixer);
        sink.append(source);
        sink.play();

        tracing::debug!(
            "Effects playback {:?} started through {} stages",
            id,
            chain.stages().len()
        );
        self.chain = Some(chain.clone());
        self.sink = Some(sink);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(sink) = &self.sink {
            sink.stop();
        }
    }

    fn reset(&mut self) {
        self.sink = None;
        self.chain = None;
    }

    fn is_empty(&self) -> bool {
        self.chain.is_none() && self.sink.is_none()
    }
}
