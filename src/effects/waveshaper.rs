//! Distortion / Waveshaping
//!
//! A waveshaper maps each input sample through a transfer curve stored as a
//! lookup table. Inputs in [-1, 1] index the table linearly; values outside
//! that range hold the end samples. With no curve the stage passes signal
//! through untouched, which is how a zero drive is expressed.
//!
//! # Curve Shape
//!
//! For a drive `k`, with `x_k = k * 100` and `x` sweeping [-1, 1):
//!
//!   f(x) = ((3 + x_k) * x * 20°) / (π + x_k * |x|)
//!
//! where 20° is expressed in radians. Higher drive bends the curve toward a
//! hard knee, adding harmonics.

use std::f64::consts::PI;
use std::sync::Arc;

/// Number of entries in a generated curve
pub const CURVE_SAMPLES: usize = 44100;

/// Distortion control values are multiplied by this before curve generation.
pub const DRIVE_SCALE: f64 = 8.0;

/// Build a distortion transfer curve for the given drive amount.
///
/// Pure function of `drive`: identical input yields identical tables.
pub fn make_distortion_curve(drive: f64) -> Vec<f32> {
    let x_k = drive * 100.0;
    let deg = PI / 180.0;

    (0..CURVE_SAMPLES)
        .map(|i| {
            let x = (i * 2) as f64 / CURVE_SAMPLES as f64 - 1.0;
            (((3.0 + x_k) * x * 20.0 * deg) / (PI + x_k * x.abs())) as f32
        })
        .collect()
}

/// Curve lookup stage
#[derive(Debug, Clone, Default)]
pub struct Waveshaper {
    curve: Option<Arc<[f32]>>,
}

impl Waveshaper {
    /// A waveshaper with no curve (passthrough)
    pub fn new() -> Self {
        Self { curve: None }
    }

    /// Install or clear the transfer curve
    pub fn set_curve(&mut self, curve: Option<Vec<f32>>) {
        self.curve = curve.filter(|c| !c.is_empty()).map(Arc::from);
    }

    /// The installed curve, if any
    pub fn curve(&self) -> Option<&[f32]> {
        self.curve.as_deref()
    }

    /// Shape one sample
    pub fn process(&self, sample: f64) -> f64 {
        let Some(curve) = self.curve.as_deref() else {
            return sample;
        };

        let last = curve.len() - 1;
        let v = last as f64 * (sample + 1.0) * 0.5;
        if v <= 0.0 {
            return curve[0] as f64;
        }
        if v >= last as f64 {
            return curve[last] as f64;
        }

        let k = v.floor() as usize;
        let f = v - k as f64;
        (1.0 - f) * curve[k] as f64 + f * curve[k + 1] as f64
    }
}
