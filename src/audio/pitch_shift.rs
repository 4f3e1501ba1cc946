use super::effects::Processor;
use std::f32::consts::PI;

const WINDOW_SECONDS: f32 = 0.05;

/// Delay-line pitch shifter.
///
/// Two read taps sweep through a window behind the write head at a speed set
/// by the pitch ratio. They sit half a window apart and are crossfaded with
/// complementary Hann gains, so the jump when a tap wraps is never heard.
/// Duration is unchanged.
pub struct PitchShifter {
    buffer: Vec<f32>,
    write_pos: usize,
    window: f32,
    phase: f32,
    step: f32,
}

impl PitchShifter {
    pub fn new(cents: f32, sample_rate: u32) -> Self {
        let window = (sample_rate as f32 * WINDOW_SECONDS).max(4.0).floor();
        let ratio = 2f32.powf(cents / 1200.0);
        Self {
            buffer: vec![0.0; window as usize * 2],
            write_pos: 0,
            window,
            phase: 0.0,
            step: 1.0 - ratio,
        }
    }

    fn tap(&self, delay: f32) -> f32 {
        let len = self.buffer.len();
        let position = self.write_pos as f32 - delay;
        let position = position.rem_euclid(len as f32);
        let index = position.floor() as usize % len;
        let next = (index + 1) % len;
        let frac = position - position.floor();
        self.buffer[index] * (1.0 - frac) + self.buffer[next] * frac
    }

    fn gain(&self, delay: f32) -> f32 {
        0.5 - 0.5 * (2.0 * PI * delay / self.window).cos()
    }
}

impl Processor for PitchShifter {
    fn process(&mut self, input: f32) -> f32 {
        self.buffer[self.write_pos] = input;

        let first = self.phase;
        let second = (self.phase + self.window / 2.0).rem_euclid(self.window);
        let output = self.tap(first) * self.gain(first) + self.tap(second) * self.gain(second);

        self.phase = (self.phase + self.step).rem_euclid(self.window);
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
        output
    }

    fn tail_samples(&self) -> usize {
        self.window as usize
    }
}
