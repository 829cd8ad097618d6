//! Tremolo (amplitude modulation)
//!
//! A gain stage whose level is a fixed base plus an optional LFO
//! contribution. Without an LFO it is a plain unity gain.

use crate::synth::Lfo;

/// Tremolo rate in Hz
pub const TREMOLO_RATE: f64 = 5.0;

/// Gain stage with optional amplitude modulation
pub struct Tremolo {
    base_gain: f64,
    lfo: Option<Lfo>,
}

impl Tremolo {
    /// Build the stage for a depth in [0, 1].
    ///
    /// At depth 0 no LFO is created and the gain stays at 1.
    pub fn new(depth: f64, sample_rate: f64) -> Self {
        if depth <= 0.0 {
            return Self {
                base_gain: 1.0,
                lfo: None,
            };
        }

        Self {
            base_gain: 1.0 - depth * 0.4,
            lfo: Some(Lfo::new(TREMOLO_RATE, depth * 0.8, sample_rate)),
        }
    }

    /// Intrinsic gain before modulation
    pub fn base_gain(&self) -> f64 {
        self.base_gain
    }

    /// The modulation source, when present
    pub fn lfo(&self) -> Option<&Lfo> {
        self.lfo.as_ref()
    }

    /// Halt the LFO; the stage falls back to its base gain
    pub fn stop(&mut self) {
        if let Some(lfo) = self.lfo.as_mut() {
            lfo.stop();
        }
    }

    /// Apply the gain to one sample
    pub fn process(&mut self, sample: f64) -> f64 {
        let modulation = self.lfo.as_mut().map_or(0.0, Lfo::process);
        sample * (self.base_gain + modulation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_depth_has_no_lfo() {
        let mut tremolo = Tremolo::new(0.0, 44100.0);
        assert!(tremolo.lfo().is_none());
        assert_eq!(tremolo.base_gain(), 1.0);
        assert_eq!(tremolo.process(0.5), 0.5);
    }

    #[test]
    fn test_full_depth_gain_range() {
        let mut tremolo = Tremolo::new(1.0, 44100.0);
        assert!((tremolo.base_gain() - 0.6).abs() < 1e-12);

        let lfo = tremolo.lfo().unwrap();
        assert_eq!(lfo.frequency(), TREMOLO_RATE);
        assert!((lfo.depth() - 0.8).abs() < 1e-12);

        let (mut lo, mut hi) = (f64::MAX, f64::MIN);
        for _ in 0..44100 {
            let gain = tremolo.process(1.0);
            lo = lo.min(gain);
            hi = hi.max(gain);
        }
        assert!((hi - 1.4).abs() < 1e-3);
        assert!((lo + 0.2).abs() < 1e-3);
    }

    #[test]
    fn test_stop_leaves_base_gain() {
        let mut tremolo = Tremolo::new(0.5, 44100.0);
        tremolo.stop();
        tremolo.stop();
        assert!(!tremolo.lfo().unwrap().is_running());
        assert!((tremolo.process(1.0) - 0.8).abs() < 1e-12);
    }
}
