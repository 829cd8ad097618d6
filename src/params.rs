//! Effect parameters
//!
//! Five independent control values in [0, 1]. Each one drives a single stage
//! of the effects chain; a value at (or, for distortion and delay, near) zero
//! removes that stage from the graph entirely.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Distortion at or below this value clears the waveshaper curve.
pub const DISTORTION_BYPASS_THRESHOLD: f64 = 0.01;

/// Delay time at or below this value leaves the delay stage out of the graph.
pub const DELAY_BYPASS_THRESHOLD: f64 = 0.01;

/// Longest echo delay, reached at `delay_time = 1.0`.
pub const MAX_DELAY_SECONDS: f64 = 0.6;

/// Strongest echo feedback, reached at `delay_feedback = 1.0`.
pub const MAX_DELAY_FEEDBACK: f64 = 0.7;

/// Identifies one of the five effect controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    Distortion,
    TremoloDepth,
    VibratoDepth,
    DelayTime,
    DelayFeedback,
}

impl Effect {
    /// Every effect, in display order
    pub const ALL: [Effect; 5] = [
        Effect::Distortion,
        Effect::TremoloDepth,
        Effect::VibratoDepth,
        Effect::DelayTime,
        Effect::DelayFeedback,
    ];

    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            Effect::Distortion => "Distortion",
            Effect::TremoloDepth => "Tremolo (Volume)",
            Effect::VibratoDepth => "Vibrato (Pitch)",
            Effect::DelayTime => "Delay Time",
            Effect::DelayFeedback => "Delay Feedback",
        }
    }
}

/// The five continuous controls of the effects chain
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectParams {
    /// Waveshaper drive
    pub distortion: f64,
    /// Amplitude modulation depth
    pub tremolo_depth: f64,
    /// Pitch modulation depth
    pub vibrato_depth: f64,
    /// Normalized echo delay, mapped to 0..0.6 s
    pub delay_time: f64,
    /// Echo decay, mapped to 0..0.7
    pub delay_feedback: f64,
}

impl EffectParams {
    /// Read one control
    pub fn get(&self, effect: Effect) -> f64 {
        match effect {
            Effect::Distortion => self.distortion,
            Effect::TremoloDepth => self.tremolo_depth,
            Effect::VibratoDepth => self.vibrato_depth,
            Effect::DelayTime => self.delay_time,
            Effect::DelayFeedback => self.delay_feedback,
        }
    }

    /// Write one control (unclamped; see [`EffectParams::clamped`])
    pub fn set(&mut self, effect: Effect, value: f64) {
        match effect {
            Effect::Distortion => self.distortion = value,
            Effect::TremoloDepth => self.tremolo_depth = value,
            Effect::VibratoDepth => self.vibrato_depth = value,
            Effect::DelayTime => self.delay_time = value,
            Effect::DelayFeedback => self.delay_feedback = value,
        }
    }

    /// Builder-style setter
    pub fn with(mut self, effect: Effect, value: f64) -> Self {
        self.set(effect, value);
        self
    }

    /// Copy with every control forced into [0, 1].
    ///
    /// Non-finite values become 0. Out-of-range input is logged, since it
    /// usually means a caller bug rather than a deliberate setting.
    pub fn clamped(&self) -> Self {
        let mut out = *self;
        for effect in Effect::ALL {
            let value = self.get(effect);
            let fixed = if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 };
            if fixed != value {
                warn!(effect = effect.label(), value, clamped = fixed, "effect parameter out of range");
            }
            out.set(effect, fixed);
        }
        out
    }

    /// Whether the waveshaper gets a curve
    pub fn distortion_active(&self) -> bool {
        self.distortion > DISTORTION_BYPASS_THRESHOLD
    }

    /// Whether the tremolo LFO is created
    pub fn tremolo_active(&self) -> bool {
        self.tremolo_depth > 0.0
    }

    /// Whether the vibrato LFO is created
    pub fn vibrato_active(&self) -> bool {
        self.vibrato_depth > 0.0
    }

    /// Whether the delay stage is part of the graph
    pub fn delay_active(&self) -> bool {
        self.delay_time > DELAY_BYPASS_THRESHOLD
    }

    /// Echo delay in seconds
    pub fn delay_seconds(&self) -> f64 {
        self.delay_time * MAX_DELAY_SECONDS
    }

    /// Echo feedback gain
    pub fn feedback_gain(&self) -> f64 {
        self.delay_feedback * MAX_DELAY_FEEDBACK
    }
}
