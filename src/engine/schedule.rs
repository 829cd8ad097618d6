//! Note schedule
//!
//! The fixed phrase every session plays: six ascending notes of a major
//! pentatonic scale (root through octave), one after another, each with a
//! short attack and an exponential release that rings past the note boundary.

use crate::config::EngineConfig;
use crate::synth::NoteEnvelope;

/// Frequency ratios of the phrase: root, M2, M3, P5, M6, octave
pub const SCALE_RATIOS: [f64; 6] = [1.0, 9.0 / 8.0, 5.0 / 4.0, 3.0 / 2.0, 5.0 / 3.0, 2.0];

/// Scale frequencies above `root`
pub fn pentatonic_scale(root: f64) -> [f64; 6] {
    SCALE_RATIOS.map(|ratio| root * ratio)
}

/// Convert seconds to a whole number of frames
pub fn seconds_to_frames(seconds: f64, sample_rate: f64) -> u64 {
    (seconds * sample_rate).round().max(0.0) as u64
}

/// A note placed on the timeline
#[derive(Debug, Clone)]
pub struct ScheduledNote {
    pub frequency: f64,
    pub envelope: NoteEnvelope,
}

/// Timing and pitch of the phrase
#[derive(Debug, Clone, PartialEq)]
pub struct NoteSchedule {
    frequencies: [f64; 6],
    note_duration: f64,
    attack: f64,
    peak_gain: f64,
    release: f64,
    delay_tail: f64,
}

impl NoteSchedule {
    /// Build the schedule from engine settings
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            frequencies: pentatonic_scale(config.root_frequency),
            note_duration: config.note_duration,
            attack: config.attack,
            peak_gain: config.peak_gain,
            release: config.release,
            delay_tail: config.delay_tail,
        }
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn note_count(&self) -> usize {
        self.frequencies.len()
    }

    pub fn note_duration(&self) -> f64 {
        self.note_duration
    }

    pub fn release(&self) -> f64 {
        self.release
    }

    /// Seconds from session start to automatic teardown.
    ///
    /// Notes back to back, plus the release tail of the last one, plus the
    /// echo tail when the delay stage is part of the graph.
    pub fn total_duration(&self, delay_active: bool) -> f64 {
        let tail = if delay_active { self.delay_tail } else { 0.0 };
        self.note_count() as f64 * self.note_duration + self.release + tail
    }

    /// Place every note on the timeline, starting at `start_frame`
    pub fn notes(&self, start_frame: u64, sample_rate: f64) -> Vec<ScheduledNote> {
        let attack = seconds_to_frames(self.attack, sample_rate);

        self.frequencies
            .iter()
            .enumerate()
            .map(|(i, &frequency)| {
                let offset = i as f64 * self.note_duration;
                let start = start_frame.saturating_add(seconds_to_frames(offset, sample_rate));
                let release_end = start_frame.saturating_add(seconds_to_frames(
                    offset + self.note_duration + self.release,
                    sample_rate,
                ));
                ScheduledNote {
                    frequency,
                    envelope: NoteEnvelope::new(start, attack, release_end, self.peak_gain),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> NoteSchedule {
        NoteSchedule::from_config(&EngineConfig::default())
    }

    #[test]
    fn test_pentatonic_from_middle_c() {
        let expected = [261.63, 294.33, 327.04, 392.45, 436.05, 523.26];
        for (freq, want) in pentatonic_scale(261.63).iter().zip(expected) {
            assert!((freq - want).abs() < 0.01, "{} != {}", freq, want);
        }
    }

    #[test]
    fn test_duration_without_delay() {
        assert!((schedule().total_duration(false) - 2.3).abs() < 1e-9);
    }

    #[test]
    fn test_duration_with_delay() {
        assert!((schedule().total_duration(true) - 4.3).abs() < 1e-9);
    }

    #[test]
    fn test_notes_are_back_to_back() {
        let notes = schedule().notes(1000, 1000.0);
        assert_eq!(notes.len(), 6);

        for (i, note) in notes.iter().enumerate() {
            assert_eq!(note.envelope.start(), 1000 + 300 * i as u64);
            // Release tail ends 0.5 s after the nominal note end
            assert_eq!(note.envelope.release_end(), 1000 + 300 * i as u64 + 800);
        }
        assert!((notes[5].frequency - 2.0 * notes[0].frequency).abs() < 1e-9);
    }

    #[test]
    fn test_last_note_ends_with_session() {
        let schedule = schedule();
        let notes = schedule.notes(0, 44100.0);
        let end = seconds_to_frames(schedule.total_duration(false), 44100.0);
        assert_eq!(notes[5].envelope.release_end(), end);
    }

    #[test]
    fn test_unbounded_release_saturates() {
        let config = EngineConfig {
            release: f64::INFINITY,
            ..EngineConfig::default()
        };
        let schedule = NoteSchedule::from_config(&config);
        let notes = schedule.notes(u64::MAX - 10, 8000.0);
        assert!(notes.iter().all(|n| n.envelope.release_end() == u64::MAX));
    }

    #[test]
    fn test_seconds_to_frames_rounds() {
        assert_eq!(seconds_to_frames(2.3, 44100.0), 101430);
        assert_eq!(seconds_to_frames(-1.0, 44100.0), 0);
        assert_eq!(seconds_to_frames(f64::NAN, 44100.0), 0);
        assert_eq!(seconds_to_frames(f64::INFINITY, 44100.0), u64::MAX);
    }
}
