//! Configuration schema definitions

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::params::EffectParams;

/// Main configuration for tonematch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TonematchConfig {
    /// Audio output settings
    #[serde(default)]
    pub audio: AudioConfig,

    /// Phrase timing and master level
    #[serde(default)]
    pub engine: EngineConfig,

    /// Monitoring tap settings
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Effect parameters used when none are given on the command line
    #[serde(default)]
    pub params: EffectParams,
}

impl TonematchConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        // Validate audio settings
        if self.audio.sample_rate < 8000 || self.audio.sample_rate > 192000 {
            bail!("Sample rate must be between 8000 and 192000");
        }
        if self.audio.buffer_size < 64 || self.audio.buffer_size > 8192 {
            bail!("Buffer size must be between 64 and 8192");
        }

        // Validate engine settings
        let engine = &self.engine;
        let timings = [
            ("master_volume", engine.master_volume),
            ("root_frequency", engine.root_frequency),
            ("note_duration", engine.note_duration),
            ("attack", engine.attack),
            ("peak_gain", engine.peak_gain),
            ("release", engine.release),
            ("delay_tail", engine.delay_tail),
        ];
        if let Some((name, _)) = timings.iter().find(|(_, value)| !value.is_finite()) {
            bail!("engine.{} must be a finite number", name);
        }
        if !(0.0..=1.0).contains(&engine.master_volume) {
            bail!("Master volume must be between 0.0 and 1.0");
        }
        if !(20.0..=20000.0).contains(&engine.root_frequency) {
            bail!("Root frequency must be between 20 and 20000 Hz");
        }
        if engine.note_duration <= 0.0 {
            bail!("Note duration must be positive");
        }
        if engine.attack <= 0.0 || engine.attack >= engine.note_duration {
            bail!("Attack must be positive and shorter than a note");
        }
        if engine.peak_gain <= crate::synth::ENVELOPE_FLOOR || engine.peak_gain > 1.0 {
            bail!("Peak gain must be above the envelope floor and at most 1.0");
        }
        if engine.release <= 0.0 {
            bail!("Release must be positive");
        }
        if engine.delay_tail < 0.0 {
            bail!("Delay tail must not be negative");
        }

        // Validate monitor settings
        let monitor = &self.monitor;
        let levels = [
            ("smoothing", monitor.smoothing),
            ("min_db", monitor.min_db),
            ("max_db", monitor.max_db),
        ];
        if let Some((name, _)) = levels.iter().find(|(_, value)| !value.is_finite()) {
            bail!("monitor.{} must be a finite number", name);
        }
        if !monitor.fft_size.is_power_of_two() || !(32..=32768).contains(&monitor.fft_size) {
            bail!("FFT size must be a power of two between 32 and 32768");
        }
        if !(0.0..=1.0).contains(&monitor.smoothing) {
            bail!("Smoothing must be between 0.0 and 1.0");
        }
        if monitor.min_db >= monitor.max_db {
            bail!("min_db must be below max_db");
        }

        Ok(())
    }
}

/// Audio output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate in Hz for offline rendering (default: 44100)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Block size in samples for offline rendering (default: 512)
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Output device name (None = default device)
    #[serde(default)]
    pub device: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            buffer_size: default_buffer_size(),
            device: None,
        }
    }
}

fn default_sample_rate() -> u32 { 44100 }
fn default_buffer_size() -> usize { 512 }

/// Phrase and master settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Master gain applied after the effect chain (default: 0.4)
    #[serde(default = "default_master_volume")]
    pub master_volume: f64,

    /// Lowest note of the phrase in Hz (default: middle C)
    #[serde(default = "default_root_frequency")]
    pub root_frequency: f64,

    /// Spacing between note starts in seconds
    #[serde(default = "default_note_duration")]
    pub note_duration: f64,

    /// Linear attack time in seconds
    #[serde(default = "default_attack")]
    pub attack: f64,

    /// Envelope peak per note
    #[serde(default = "default_peak_gain")]
    pub peak_gain: f64,

    /// Release tail past the note boundary in seconds
    #[serde(default = "default_release")]
    pub release: f64,

    /// Extra session time when the delay is active
    #[serde(default = "default_delay_tail")]
    pub delay_tail: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            master_volume: default_master_volume(),
            root_frequency: default_root_frequency(),
            note_duration: default_note_duration(),
            attack: default_attack(),
            peak_gain: default_peak_gain(),
            release: default_release(),
            delay_tail: default_delay_tail(),
        }
    }
}

fn default_master_volume() -> f64 { 0.4 }
fn default_root_frequency() -> f64 { 261.63 }
fn default_note_duration() -> f64 { 0.3 }
fn default_attack() -> f64 { 0.05 }
fn default_peak_gain() -> f64 { 0.3 }
fn default_release() -> f64 { 0.5 }
fn default_delay_tail() -> f64 { 2.0 }

/// Monitoring tap configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Analysis window in samples (default: 2048)
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,

    /// Spectrum averaging constant 0.0-1.0 (default: 0.8)
    #[serde(default = "default_smoothing")]
    pub smoothing: f32,

    /// Floor of the byte spectrum range in dB
    #[serde(default = "default_min_db")]
    pub min_db: f32,

    /// Ceiling of the byte spectrum range in dB
    #[serde(default = "default_max_db")]
    pub max_db: f32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            fft_size: default_fft_size(),
            smoothing: default_smoothing(),
            min_db: default_min_db(),
            max_db: default_max_db(),
        }
    }
}

fn default_fft_size() -> usize { 2048 }
fn default_smoothing() -> f32 { 0.8 }
fn default_min_db() -> f32 { -100.0 }
fn default_max_db() -> f32 { -30.0 }
