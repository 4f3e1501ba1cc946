use super::effects::Processor;
use serde::{Deserialize, Serialize};

// Freeverb tunings, in samples at 44.1 kHz
const COMB_TUNING: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];
const ALLPASS_TUNING: [usize; 4] = [556, 441, 341, 225];
const ALLPASS_FEEDBACK: f32 = 0.5;
const INPUT_GAIN: f32 = 0.015;
const WET_GAIN: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReverbPreset {
    SmallRoom,
    MediumRoom,
    LargeRoom,
    Cathedral,
}

impl ReverbPreset {
    /// Room size feeds the comb feedback; 0.0 to 1.0
    fn room_size(self) -> f32 {
        match self {
            Self::SmallRoom => 0.5,
            Self::MediumRoom => 0.7,
            Self::LargeRoom => 0.84,
            Self::Cathedral => 0.95,
        }
    }

    fn damping(self) -> f32 {
        match self {
            Self::SmallRoom => 0.5,
            Self::MediumRoom => 0.35,
            Self::LargeRoom => 0.2,
            Self::Cathedral => 0.1,
        }
    }

    /// How long the reverb keeps ringing once the input has ended
    pub fn tail_seconds(self) -> f32 {
        match self {
            Self::SmallRoom => 0.5,
            Self::MediumRoom => 1.0,
            Self::LargeRoom => 1.8,
            Self::Cathedral => 4.0,
        }
    }
}

struct Comb {
    buffer: Vec<f32>,
    pos: usize,
    feedback: f32,
    damp: f32,
    store: f32,
}

impl Comb {
    fn new(len: usize, feedback: f32, damp: f32) -> Self {
        Self {
            buffer: vec![0.0; len.max(1)],
            pos: 0,
            feedback,
            damp,
            store: 0.0,
        }
    }

    fn process(&mut self, input: f32) -> f32 {
        let output = self.buffer[self.pos];
        self.store = output * (1.0 - self.damp) + self.store * self.damp;
        self.buffer[self.pos] = input + self.store * self.feedback;
        self.pos = (self.pos + 1) % self.buffer.len();
        output
    }
}

struct Allpass {
    buffer: Vec<f32>,
    pos: usize,
}

impl Allpass {
    fn new(len: usize) -> Self {
        Self {
            buffer: vec![0.0; len.max(1)],
            pos: 0,
        }
    }

    fn process(&mut self, input: f32) -> f32 {
        let delayed = self.buffer[self.pos];
        self.buffer[self.pos] = input + delayed * ALLPASS_FEEDBACK;
        self.pos = (self.pos + 1) % self.buffer.len();
        delayed - input
    }
}

/// Schroeder reverb: parallel damped combs into series allpasses
pub struct Reverb {
    combs: Vec<Comb>,
    allpasses: Vec<Allpass>,
    wet: f32,
    dry: f32,
    tail: usize,
}

impl Reverb {
    /// `wet_dry_mix` is a percentage, 0 fully dry and 100 fully wet
    pub fn new(preset: ReverbPreset, wet_dry_mix: f32, sample_rate: u32) -> Self {
        let scale = sample_rate as f32 / 44100.0;
        let scaled = |len: usize| (len as f32 * scale).round() as usize;

        let feedback = preset.room_size() * 0.28 + 0.7;
        let combs = COMB_TUNING
            .iter()
            .map(|len| Comb::new(scaled(*len), feedback, preset.damping()))
            .collect();
        let allpasses = ALLPASS_TUNING.iter().map(|len| Allpass::new(scaled(*len))).collect();

        let mix = (wet_dry_mix / 100.0).clamp(0.0, 1.0);
        Self {
            combs,
            allpasses,
            wet: mix,
            dry: 1.0 - mix,
            tail: (preset.tail_seconds() * sample_rate as f32) as usize,
        }
    }
}

impl Processor for Reverb {
    fn process(&mut self, input: f32) -> f32 {
        let scaled = input * INPUT_GAIN;
        let mut wet: f32 = self.combs.iter_mut().map(|c| c.process(scaled)).sum();
        for allpass in &mut self.allpasses {
            wet = allpass.process(wet);
        }
        input * self.dry + wet * WET_GAIN * self.wet
    }

    fn tail_samples(&self) -> usize {
        self.tail
    }
}
