use super::clip::AudioClip;
use super::effects::Processor;
use std::time::Duration;

type OnEnd = Box<dyn FnOnce() + Send>;

/// Streams a clip through an owned list of processors.
///
/// After the clip runs out, silence is fed through the processors for the
/// longest tail any of them asked for, so reverb decays instead of cutting
/// off. The end callback fires once, when the iterator is first exhausted.
pub struct ClipSource {
    clip: AudioClip,
    pos: usize,
    processors: Vec<Box<dyn Processor>>,
    tail_left: usize,
    on_end: Option<OnEnd>,
}

impl ClipSource {
    pub fn new(clip: AudioClip) -> Self {
        Self {
            clip,
            pos: 0,
            processors: Vec::new(),
            tail_left: 0,
            on_end: None,
        }
    }

    pub fn with_processors(mut self, processors: Vec<Box<dyn Processor>>) -> Self {
        self.tail_left = processors
            .iter()
            .map(|p| p.tail_samples())
            .max()
            .unwrap_or(0);
        self.processors = processors;
        self
    }

    pub fn on_end(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_end = Some(Box::new(callback));
        self
    }

    fn total_len(&self) -> usize {
        self.clip.samples().len() + self.tail_left
    }

    fn run(&mut self, input: f32) -> f32 {
        self.processors
            .iter_mut()
            .fold(input, |sample, processor| processor.process(sample))
    }
}

impl Iterator for ClipSource {
    type Item = rodio::Sample;

    fn next(&mut self) -> Option<Self::Item> {
        let input = if let Some(sample) = self.clip.samples().get(self.pos) {
            self.pos += 1;
            *sample
        } else if self.tail_left > 0 {
            self.tail_left -= 1;
            0.0
        } else {
            if let Some(callback) = self.on_end.take() {
                callback();
            }
            return None;
        };
        Some(self.run(input))
    }
}

impl rodio::Source for ClipSource {
    fn current_span_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> rodio::ChannelCount {
        1
    }

    fn sample_rate(&self) -> rodio::SampleRate {
        self.clip.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f64(
            self.total_len() as f64 / self.clip.sample_rate() as f64,
        ))
    }
}
