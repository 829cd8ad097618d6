//! Monitoring tap
//!
//! A passive observation point between the master stage and the output.
//! The render path feeds it every block; a visualizer reads time-domain and
//! frequency-magnitude snapshots on its own schedule. Feeding uses `try_lock`
//! so a slow reader can only cost the tap a block, never stall audio.

use crate::config::MonitorConfig;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

/// Cloneable handle to the analysis point
#[derive(Clone)]
pub struct MonitorTap {
    inner: Arc<Mutex<Analyser>>,
}

struct Analyser {
    sample_rate: u32,
    ring: Vec<f32>,
    write_pos: usize,
    /// Blackman window coefficients
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    /// Smoothed linear magnitudes carried between reads
    smoothed: Vec<f32>,
    smoothing: f32,
    min_db: f32,
    max_db: f32,
}

impl MonitorTap {
    /// Create a tap for a context running at `sample_rate`
    pub fn new(config: &MonitorConfig, sample_rate: u32) -> Self {
        let size = config.fft_size.max(2);
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);

        let window = (0..size)
            .map(|i| {
                let phase = 2.0 * PI * i as f32 / size as f32;
                0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos()
            })
            .collect();

        let analyser = Analyser {
            sample_rate,
            ring: vec![0.0; size],
            write_pos: 0,
            window,
            fft,
            scratch: vec![Complex::new(0.0, 0.0); size],
            smoothed: vec![0.0; size / 2],
            smoothing: config.smoothing.clamp(0.0, 1.0),
            min_db: config.min_db,
            max_db: config.max_db,
        };

        Self {
            inner: Arc::new(Mutex::new(analyser)),
        }
    }

    /// Push rendered samples. Dropped if a reader holds the tap.
    pub fn feed(&self, samples: &[f32]) {
        let mut analyser = match self.inner.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return,
        };
        for &sample in samples {
            let pos = analyser.write_pos;
            analyser.ring[pos] = sample;
            analyser.write_pos = (pos + 1) % analyser.ring.len();
        }
    }

    /// Whether two handles refer to the same tap
    pub fn ptr_eq(&self, other: &MonitorTap) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn fft_size(&self) -> usize {
        self.lock().ring.len()
    }

    /// Number of frequency bins (half the FFT size)
    pub fn frequency_bin_count(&self) -> usize {
        self.lock().smoothed.len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.lock().sample_rate
    }

    /// Centre frequency of a bin in Hz
    pub fn bin_frequency(&self, bin: usize) -> f64 {
        let analyser = self.lock();
        bin as f64 * analyser.sample_rate as f64 / analyser.ring.len() as f64
    }

    /// The most recent `fft_size` samples, oldest first
    pub fn time_domain_data(&self) -> Vec<f32> {
        self.lock().ordered()
    }

    /// Smoothed magnitude spectrum in dB
    pub fn float_frequency_data(&self) -> Vec<f32> {
        self.lock().analyse()
    }

    /// Magnitude spectrum scaled from `[min_db, max_db]` to 0..=255
    pub fn byte_frequency_data(&self) -> Vec<u8> {
        let mut analyser = self.lock();
        let (min_db, max_db) = (analyser.min_db, analyser.max_db);
        let range = (max_db - min_db).max(f32::EPSILON);
        analyser
            .analyse()
            .into_iter()
            .map(|db| {
                let scaled = 255.0 * (db - min_db) / range;
                if scaled.is_nan() {
                    0
                } else {
                    scaled.clamp(0.0, 255.0) as u8
                }
            })
            .collect()
    }

    /// Frequency of the loudest bin, if anything rises above `min_db`
    pub fn dominant_frequency(&self) -> Option<f64> {
        let mut analyser = self.lock();
        let spectrum = analyser.analyse();
        let (bin, &db) = spectrum
            .iter()
            .enumerate()
            .skip(1)
            .max_by(|a, b| a.1.total_cmp(b.1))?;
        (db > analyser.min_db)
            .then(|| bin as f64 * analyser.sample_rate as f64 / analyser.ring.len() as f64)
    }

    fn lock(&self) -> MutexGuard<'_, Analyser> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Analyser {
    fn ordered(&self) -> Vec<f32> {
        let len = self.ring.len();
        (0..len).map(|i| self.ring[(self.write_pos + i) % len]).collect()
    }

    fn analyse(&mut self) -> Vec<f32> {
        let size = self.ring.len();
        let samples = self.ordered();
        for ((slot, sample), w) in self.scratch.iter_mut().zip(samples).zip(&self.window) {
            *slot = Complex::new(sample * w, 0.0);
        }
        self.fft.process(&mut self.scratch);

        let tau = self.smoothing;
        self.smoothed
            .iter_mut()
            .zip(&self.scratch)
            .map(|(smoothed, bin)| {
                let magnitude = bin.norm() / size as f32;
                *smoothed = tau * *smoothed + (1.0 - tau) * magnitude;
                20.0 * smoothed.log10()
            })
            .collect()
    }
}
