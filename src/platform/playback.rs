use super::PlaybackService;
use crate::audio::{AudioClip, ClipSource};
use crate::error::PlaybackError;
use crate::messages::{PlaybackId, PlayerEvent};
use rodio::Sink;
use rodio::mixer::Mixer;
use tokio::sync::mpsc;

/// Simple playback path: one rodio sink, speed set from the requested rate
pub struct RodioPlayback {
    mixer: Mixer,
    events: mpsc::UnboundedSender<PlayerEvent>,
    clip: Option<AudioClip>,
    rate: f32,
    sink: Option<Sink>,
}

impl RodioPlayback {
    pub fn new(mixer: Mixer, events: mpsc::UnboundedSender<PlayerEvent>) -> Self {
        Self {
            mixer,
            events,
            clip: None,
            rate: 1.0,
            sink: None,
        }
    }
}

impl PlaybackService for RodioPlayback {
    fn load(&mut self, clip: &AudioClip) -> Result<(), PlaybackError> {
        if clip.samples().is_empty() {
            return Err(PlaybackError::Unsupported("recording is empty".into()));
        }
        self.stop();
        self.clip = Some(clip.clone());
        Ok(())
    }

    fn set_rate(&mut self, rate: f32) {
        self.rate = rate;
        if let Some(sink) = &self.sink {
            sink.set_speed(rate);
        }
    }

    fn rewind(&mut self) {
        // A new source is appended on every play, so dropping the old sink
        // is enough to start again from zero
        self.stop();
    }

    fn play(&mut self, id: PlaybackId) -> Result<(), PlaybackError> {
        let clip = self
            .clip
            .clone()
            .ok_or_else(|| PlaybackError::Output("nothing loaded".into()))?;

        self.stop();
        let sink = Sink::connect_new(&self.mixer);
        sink.set_speed(self.rate);

        let events = self.events.clone();
        sink.append(ClipSource::new(clip).on_end(move || {
            let _ = events.send(PlayerEvent::PlaybackFinished { id });
        }));
        sink.play();

        tracing::debug!("Simple playback {:?} started at rate {}", id, self.rate);
        self.sink = Some(sink);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn is_playing(&self) -> bool {
        self.sink
            .as_ref()
            .is_some_and(|sink| !sink.empty() && !sink.is_paused())
    }
}
