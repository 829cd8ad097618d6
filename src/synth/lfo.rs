//! Low Frequency Oscillator for modulation
//!
//! A sine oscillator scaled by a depth. Tremolo feeds it into a gain stage,
//! vibrato into every voice's detune input.

use super::{Oscillator, Waveform};

/// Low Frequency Oscillator
pub struct Lfo {
    osc: Oscillator,
    /// Output amplitude (gain units for tremolo, cents for vibrato)
    depth: f64,
    running: bool,
}

impl Lfo {
    /// Create a running sine LFO
    pub fn new(frequency: f64, depth: f64, sample_rate: f64) -> Self {
        Self {
            osc: Oscillator::new(Waveform::Sine, frequency, sample_rate),
            depth: depth.max(0.0),
            running: true,
        }
    }

    /// Get LFO frequency
    pub fn frequency(&self) -> f64 {
        self.osc.frequency()
    }

    /// Get modulation depth
    pub fn depth(&self) -> f64 {
        self.depth
    }

    /// Halt the LFO. Stopping twice is fine.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Check whether the LFO is still producing output
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Generate next sample (-depth to depth); 0 once stopped
    pub fn process(&mut self) -> f64 {
        if !self.running {
            return 0.0;
        }
        self.osc.generate() * self.depth
    }
}
