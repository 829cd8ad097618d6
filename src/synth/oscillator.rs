//! Basic oscillator implementation

use std::f64::consts::PI;

/// Waveform types
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Waveform {
    Sine,
    Triangle,
}

/// A phase-accumulating oscillator with a detune input
pub struct Oscillator {
    waveform: Waveform,
    phase: f64,
    frequency: f64,
    sample_rate: f64,
}

impl Oscillator {
    /// Create a new oscillator
    pub fn new(waveform: Waveform, frequency: f64, sample_rate: f64) -> Self {
        Self {
            waveform,
            phase: 0.0,
            frequency,
            sample_rate,
        }
    }

    /// Set the frequency
    pub fn set_frequency(&mut self, frequency: f64) {
        self.frequency = frequency;
    }

    /// Get the current frequency
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Get the waveform
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Generate the next sample at the base frequency
    pub fn generate(&mut self) -> f64 {
        self.generate_detuned(0.0)
    }

    /// Generate the next sample with the frequency shifted by `cents`
    pub fn generate_detuned(&mut self, cents: f64) -> f64 {
        let sample = match self.waveform {
            Waveform::Sine => self.sine(),
            Waveform::Triangle => self.triangle(),
        };

        let frequency = if cents == 0.0 {
            self.frequency
        } else {
            self.frequency * detune_ratio(cents)
        };
        self.phase += frequency / self.sample_rate;
        self.phase -= self.phase.floor();

        sample
    }

    fn sine(&self) -> f64 {
        (self.phase * 2.0 * PI).sin()
    }

    fn triangle(&self) -> f64 {
        let p = self.phase;
        if p < 0.25 {
            4.0 * p
        } else if p < 0.75 {
            2.0 - 4.0 * p
        } else {
            4.0 * p - 4.0
        }
    }
}

/// Frequency ratio for a pitch offset in cents
pub fn detune_ratio(cents: f64) -> f64 {
    2f64.powf(cents / 1200.0)
}
