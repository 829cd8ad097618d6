//! Voice trait for sound generators

use super::{NoteEnvelope, Oscillator, Waveform};

/// Trait for voice implementations
pub trait Voice: Send {
    /// Generate the sample for `frame`, pitch-shifted by `detune_cents`
    fn process(&mut self, frame: u64, detune_cents: f64) -> f64;

    /// Halt immediately. Halting an already-halted voice is a no-op.
    fn stop(&mut self);

    /// Whether the voice is started (or scheduled) and not yet stopped at `frame`
    fn is_running(&self, frame: u64) -> bool;
}

/// One scheduled note: a triangle oscillator shaped by a [`NoteEnvelope`]
pub struct NoteVoice {
    osc: Oscillator,
    envelope: NoteEnvelope,
    /// Frame at which the oscillator is scheduled to stop
    stop_frame: u64,
    halted: bool,
}

impl NoteVoice {
    /// Schedule a note
    ///
    /// The oscillator starts with the envelope and stops when the release
    /// tail ends.
    pub fn new(frequency: f64, envelope: NoteEnvelope, sample_rate: f64) -> Self {
        let stop_frame = envelope.release_end();
        Self {
            osc: Oscillator::new(Waveform::Triangle, frequency, sample_rate),
            envelope,
            stop_frame,
            halted: false,
        }
    }

    /// Base pitch
    pub fn frequency(&self) -> f64 {
        self.osc.frequency()
    }

    /// Frame the note begins
    pub fn start_frame(&self) -> u64 {
        self.envelope.start()
    }

    /// Frame the oscillator is scheduled to stop
    pub fn stop_frame(&self) -> u64 {
        self.stop_frame
    }
}

impl Voice for NoteVoice {
    fn process(&mut self, frame: u64, detune_cents: f64) -> f64 {
        if self.halted || frame < self.start_frame() || frame >= self.stop_frame {
            return 0.0;
        }
        self.osc.generate_detuned(detune_cents) * self.envelope.level_at(frame)
    }

    fn stop(&mut self) {
        self.halted = true;
    }

    fn is_running(&self, frame: u64) -> bool {
        !self.halted && frame < self.stop_frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice() -> NoteVoice {
        let envelope = NoteEnvelope::new(10, 5, 100, 0.3);
        NoteVoice::new(440.0, envelope, 1000.0)
    }

    #[test]
    fn test_voice_silent_before_start() {
        let mut voice = voice();
        for frame in 0..10 {
            assert_eq!(voice.process(frame, 0.0), 0.0);
        }
        assert!(voice.is_running(0));
    }

    #[test]
    fn test_voice_output() {
        let mut voice = voice();
        let max = (10..100)
            .map(|frame| voice.process(frame, 0.0).abs())
            .fold(0.0f64, f64::max);
        assert!(max > 0.0);
        assert!(max <= 0.3);
    }

    #[test]
    fn test_voice_stops_at_scheduled_frame() {
        let mut voice = voice();
        assert_eq!(voice.stop_frame(), 100);
        assert!(!voice.is_running(100));
        assert_eq!(voice.process(100, 0.0), 0.0);
    }

    #[test]
    fn test_voice_halt() {
        let mut voice = voice();
        voice.stop();
        voice.stop();
        assert!(!voice.is_running(20));
        assert_eq!(voice.process(20, 0.0), 0.0);
    }
}
