//! Note gain envelope
//!
//! Sample-accurate gain automation for one note: silent before the note
//! starts, a linear attack up to the peak, then an exponential fall that
//! reaches `FLOOR` exactly when the release tail ends. The level is a pure
//! function of the frame, so scheduling never depends on processing order.

/// Level the exponential release decays to. Exponential ramps cannot reach 0.
pub const FLOOR: f64 = 0.001;

/// Envelope stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnvelopeStage {
    /// Before the note starts
    Idle,
    Attack,
    Release,
    /// After the release tail
    Finished,
}

/// Attack/exponential-release envelope with absolute frame timestamps
#[derive(Debug, Clone)]
pub struct NoteEnvelope {
    start: u64,
    attack_end: u64,
    release_end: u64,
    peak: f64,
}

impl NoteEnvelope {
    /// Create an envelope
    ///
    /// # Arguments
    /// * `start` - Frame at which the attack begins
    /// * `attack_frames` - Length of the linear attack
    /// * `release_end` - Frame at which the level reaches `FLOOR`
    /// * `peak` - Level reached at the end of the attack
    pub fn new(start: u64, attack_frames: u64, release_end: u64, peak: f64) -> Self {
        let attack_end = start.saturating_add(attack_frames.max(1));
        Self {
            start,
            attack_end,
            release_end: release_end.max(attack_end.saturating_add(1)),
            peak: peak.max(FLOOR),
        }
    }

    /// First frame of the note
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Frame at which the release reaches the floor
    pub fn release_end(&self) -> u64 {
        self.release_end
    }

    /// Stage at the given frame
    pub fn stage_at(&self, frame: u64) -> EnvelopeStage {
        if frame < self.start {
            EnvelopeStage::Idle
        } else if frame < self.attack_end {
            EnvelopeStage::Attack
        } else if frame < self.release_end {
            EnvelopeStage::Release
        } else {
            EnvelopeStage::Finished
        }
    }

    /// Gain at the given frame
    pub fn level_at(&self, frame: u64) -> f64 {
        match self.stage_at(frame) {
            EnvelopeStage::Idle => 0.0,
            EnvelopeStage::Attack => {
                let t = (frame - self.start) as f64 / (self.attack_end - self.start) as f64;
                self.peak * t
            }
            EnvelopeStage::Release => {
                let t = (frame - self.attack_end) as f64 / (self.release_end - self.attack_end) as f64;
                self.peak * (FLOOR / self.peak).powf(t)
            }
            EnvelopeStage::Finished => FLOOR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope() -> NoteEnvelope {
        // 1 kHz clock: 50 ms attack, tail ends 850 ms after start
        NoteEnvelope::new(100, 50, 950, 0.3)
    }

    #[test]
    fn test_envelope_stages() {
        let env = envelope();
        assert_eq!(env.stage_at(0), EnvelopeStage::Idle);
        assert_eq!(env.stage_at(100), EnvelopeStage::Attack);
        assert_eq!(env.stage_at(149), EnvelopeStage::Attack);
        assert_eq!(env.stage_at(150), EnvelopeStage::Release);
        assert_eq!(env.stage_at(950), EnvelopeStage::Finished);
    }

    #[test]
    fn test_envelope_attack_is_linear() {
        let env = envelope();
        assert_eq!(env.level_at(99), 0.0);
        assert_eq!(env.level_at(100), 0.0);
        assert!((env.level_at(125) - 0.15).abs() < 1e-12);
        assert!((env.level_at(150) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_envelope_release_is_exponential() {
        let env = envelope();
        // Halfway through the release the level is the geometric mean
        let mid = env.level_at(550);
        assert!((mid - (0.3f64 * FLOOR).sqrt()).abs() < 1e-9);
        assert!((env.level_at(949) - FLOOR).abs() < 1e-4);
    }

    #[test]
    fn test_envelope_release_monotonic() {
        let env = envelope();
        let mut previous = env.level_at(150);
        for frame in 151..950 {
            let level = env.level_at(frame);
            assert!(level < previous);
            previous = level;
        }
    }

    #[test]
    fn test_degenerate_timing_is_sane() {
        let env = NoteEnvelope::new(10, 0, 5, 0.0);
        assert_eq!(env.stage_at(10), EnvelopeStage::Attack);
        assert!(env.release_end() > 10);
        assert!(env.level_at(11).is_finite());
    }
}
