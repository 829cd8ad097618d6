//! Effect graph
//!
//! Built fresh for every play request from the effect parameters. Signal
//! order is fixed:
//!
//! ```text
//! voices -> source bus -> distortion -> tremolo -> [delay] -> master
//!   ^
//!   vibrato LFO (detune of every voice)
//! ```
//!
//! A stage whose control is at zero is left out of the graph: no curve, no
//! LFO, no delay line. Neutral settings are never used as a stand-in.

use crate::effects::{make_distortion_curve, FeedbackDelay, Tremolo, Waveshaper, DRIVE_SCALE};
use crate::params::EffectParams;
use crate::synth::{Lfo, NoteVoice, Voice};
use tracing::debug;

use super::schedule::NoteSchedule;

/// Vibrato rate in Hz
pub const VIBRATO_RATE: f64 = 6.0;

/// Pitch deviation in cents at full vibrato depth
pub const VIBRATO_CENTS: f64 = 30.0;

/// Which stages a graph contains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topology {
    pub voices: usize,
    pub distortion_curve: bool,
    pub tremolo_lfo: bool,
    pub vibrato_lfo: bool,
    pub delay: bool,
}

impl Topology {
    /// True when only the dry voices remain
    pub fn is_dry(&self) -> bool {
        !self.distortion_curve && !self.tremolo_lfo && !self.vibrato_lfo && !self.delay
    }
}

/// One session's signal graph
pub struct EffectGraph {
    voices: Vec<NoteVoice>,
    vibrato: Option<Lfo>,
    distortion: Waveshaper,
    tremolo: Tremolo,
    delay: Option<FeedbackDelay>,
}

impl EffectGraph {
    /// Construct the graph for `params`, with every note and LFO anchored
    /// at `start_frame`.
    pub fn build(
        params: &EffectParams,
        schedule: &NoteSchedule,
        start_frame: u64,
        sample_rate: f64,
    ) -> Self {
        let mut distortion = Waveshaper::new();
        if params.distortion_active() {
            distortion.set_curve(Some(make_distortion_curve(params.distortion * DRIVE_SCALE)));
        }

        let tremolo = Tremolo::new(params.tremolo_depth, sample_rate);

        let delay = params.delay_active().then(|| {
            FeedbackDelay::new(params.delay_seconds(), params.feedback_gain(), sample_rate)
        });

        let vibrato = params
            .vibrato_active()
            .then(|| Lfo::new(VIBRATO_RATE, params.vibrato_depth * VIBRATO_CENTS, sample_rate));

        let voices = schedule
            .notes(start_frame, sample_rate)
            .into_iter()
            .map(|note| NoteVoice::new(note.frequency, note.envelope, sample_rate))
            .collect();

        let graph = Self {
            voices,
            vibrato,
            distortion,
            tremolo,
            delay,
        };
        debug!(topology = ?graph.topology(), start_frame, "effect graph built");
        graph
    }

    /// Render the graph output for `frame`.
    ///
    /// Must be called once per frame, in order, from the start frame on.
    pub fn process(&mut self, frame: u64) -> f64 {
        let detune = self.vibrato.as_mut().map_or(0.0, Lfo::process);

        let bus: f64 = self
            .voices
            .iter_mut()
            .map(|voice| voice.process(frame, detune))
            .sum();

        let shaped = self.distortion.process(bus);
        let modulated = self.tremolo.process(shaped);

        match self.delay.as_mut() {
            Some(delay) => delay.process(modulated),
            None => modulated,
        }
    }

    /// Stop every voice and LFO. Safe to call repeatedly.
    pub fn halt(&mut self) {
        for voice in &mut self.voices {
            voice.stop();
        }
        if let Some(vibrato) = self.vibrato.as_mut() {
            vibrato.stop();
        }
        self.tremolo.stop();
    }

    /// Oscillators (voices and LFOs) that are still running at `frame`
    pub fn running_oscillators(&self, frame: u64) -> usize {
        let voices = self.voices.iter().filter(|v| v.is_running(frame)).count();
        let lfos = [self.vibrato.as_ref(), self.tremolo.lfo()]
            .into_iter()
            .flatten()
            .filter(|lfo| lfo.is_running())
            .count();
        voices + lfos
    }

    pub fn topology(&self) -> Topology {
        Topology {
            voices: self.voices.len(),
            distortion_curve: self.distortion.curve().is_some(),
            tremolo_lfo: self.tremolo.lfo().is_some(),
            vibrato_lfo: self.vibrato.is_some(),
            delay: self.delay.is_some(),
        }
    }

    pub fn voices(&self) -> &[NoteVoice] {
        &self.voices
    }
}
