//! Effects chains as plain data.
//!
//! A chain is an owned, linear list of stage descriptors running from a single
//! source to the output. Nothing here touches an audio device: the graph
//! service turns a validated chain into processors when playback starts, and
//! tearing down is just dropping the chain.

use super::pitch_shift::PitchShifter;
use super::reverb::{Reverb, ReverbPreset};
use crate::error::GraphError;

/// One sample in, one sample out
pub trait Processor: Send {
    fn process(&mut self, input: f32) -> f32;

    /// Samples of output still owed after the input runs dry
    fn tail_samples(&self) -> usize {
        0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectStage {
    Source,
    TimePitch { cents: f32 },
    Reverb { preset: ReverbPreset, wet_dry_mix: f32 },
    Output,
}

impl EffectStage {
    fn processor(&self, sample_rate: u32) -> Option<Box<dyn Processor>> {
        match *self {
            Self::TimePitch { cents } => Some(Box::new(PitchShifter::new(cents, sample_rate))),
            Self::Reverb {
                preset,
                wet_dry_mix,
            } => Some(Box::new(Reverb::new(preset, wet_dry_mix, sample_rate))),
            Self::Source | Self::Output => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EffectsChain {
    stages: Vec<EffectStage>,
}

impl EffectsChain {
    pub fn builder() -> ChainBuilder {
        ChainBuilder::default()
    }

    /// source → time-pitch → reverb → output
    pub fn pitch_and_reverb(
        cents: f32,
        preset: ReverbPreset,
        wet_dry_mix: f32,
    ) -> Result<Self, GraphError> {
        Self::builder()
            .connect(EffectStage::Source)
            .connect(EffectStage::TimePitch { cents })
            .connect(EffectStage::Reverb {
                preset,
                wet_dry_mix,
            })
            .connect(EffectStage::Output)
            .build()
    }

    pub fn stages(&self) -> &[EffectStage] {
        &self.stages
    }

    /// Instantiate the processing stages between source and output, in order
    pub fn processors(&self, sample_rate: u32) -> Vec<Box<dyn Processor>> {
        self.stages
            .iter()
            .filter_map(|stage| stage.processor(sample_rate))
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct ChainBuilder {
    stages: Vec<EffectStage>,
    error: Option<GraphError>,
}

impl ChainBuilder {
    /// Append a stage downstream of the last one
    pub fn connect(mut self, stage: EffectStage) -> Self {
        if self.error.is_some() {
            return self;
        }

        let error = match (self.stages.first(), self.stages.last(), stage) {
            (_, Some(EffectStage::Output), _) => Some(GraphError::StageAfterOutput),
            (Some(_), _, EffectStage::Source) => Some(GraphError::DuplicateSource),
            (None, _, EffectStage::Source) => None,
            (None, _, _) => Some(GraphError::MissingSource),
            _ => None,
        };

        match error {
            Some(e) => self.error = Some(e),
            None => self.stages.push(stage),
        }
        self
    }

    pub fn build(self) -> Result<EffectsChain, GraphError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        match self.stages.last() {
            None => Err(GraphError::MissingSource),
            Some(EffectStage::Output) => Ok(EffectsChain {
                stages: self.stages,
            }),
            Some(_) => Err(GraphError::MissingOutput),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pitch_and_reverb_layout() {
        let chain = EffectsChain::pitch_and_reverb(1200.0, ReverbPreset::LargeRoom, 50.0).unwrap();
        assert_eq!(
            chain.stages(),
            &[
                EffectStage::Source,
                EffectStage::TimePitch { cents: 1200.0 },
                EffectStage::Reverb {
                    preset: ReverbPreset::LargeRoom,
                    wet_dry_mix: 50.0
                },
                EffectStage::Output,
            ]
        );
        assert_eq!(chain.processors(44100).len(), 2);
    }

    #[test]
    fn test_chain_must_start_at_source() {
        let err = EffectsChain::builder()
            .connect(EffectStage::TimePitch { cents: 0.0 })
            .connect(EffectStage::Output)
            .build()
            .unwrap_err();
        assert_eq!(err, GraphError::MissingSource);
    }

    #[test]
    fn test_chain_must_reach_output() {
        let err = EffectsChain::builder()
            .connect(EffectStage::Source)
            .connect(EffectStage::TimePitch { cents: 0.0 })
            .build()
            .unwrap_err();
        assert_eq!(err, GraphError::MissingOutput);
        assert_eq!(
            EffectsChain::builder().build().unwrap_err(),
            GraphError::MissingSource
        );
    }

    #[test]
    fn test_nothing_follows_output() {
        let err = EffectsChain::builder()
            .connect(EffectStage::Source)
            .connect(EffectStage::Output)
            .connect(EffectStage::TimePitch { cents: 0.0 })
            .build()
            .unwrap_err();
        assert_eq!(err, GraphError::StageAfterOutput);
    }

    #[test]
    fn test_single_source() {
        let err = EffectsChain::builder()
            .connect(EffectStage::Source)
            .connect(EffectStage::Source)
            .connect(EffectStage::Output)
            .build()
            .unwrap_err();
        assert_eq!(err, GraphError::DuplicateSource);
    }
}
