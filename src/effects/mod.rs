//! Effect stages
//!
//! The building blocks the effect graph chains together: waveshaping
//! distortion, tremolo gain, and feedback delay.

mod waveshaper;
mod tremolo;
mod delay;

pub use waveshaper::{make_distortion_curve, Waveshaper, CURVE_SAMPLES, DRIVE_SCALE};
pub use tremolo::{Tremolo, TREMOLO_RATE};
pub use delay::{DelayLine, FeedbackDelay, DRY_GAIN, WET_GAIN};
