//! WAV file recorder
//!
//! Records engine output to WAV files, and renders a single session offline.

use anyhow::{bail, Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::ToneEngine;
use crate::config::TonematchConfig;
use crate::params::EffectParams;

/// WAV file recorder
pub struct Recorder {
    writer: WavWriter<BufWriter<File>>,
    sample_rate: u32,
    samples_written: u64,
}

impl Recorder {
    /// Create a new recorder
    ///
    /// # Arguments
    /// * `path` - Output file path
    /// * `sample_rate` - Sample rate in Hz
    pub fn new(path: &Path, sample_rate: u32) -> Result<Self> {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };

        let writer = WavWriter::create(path, spec)
            .with_context(|| format!("failed to create WAV file: {:?}", path))?;

        Ok(Self {
            writer,
            sample_rate,
            samples_written: 0,
        })
    }

    /// Get the sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get the number of samples written
    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    /// Get the duration recorded in seconds
    pub fn duration_secs(&self) -> f64 {
        self.samples_written as f64 / self.sample_rate as f64
    }

    /// Write a buffer of samples
    pub fn write_buffer(&mut self, buffer: &[f32]) -> Result<()> {
        for &sample in buffer {
            self.writer
                .write_sample(sample)
                .context("failed to write sample")?;
        }
        self.samples_written += buffer.len() as u64;
        Ok(())
    }

    /// Finalize the WAV file
    ///
    /// This must be called to properly close the file and write the header.
    pub fn finalize(self) -> Result<()> {
        self.writer.finalize().context("failed to finalize WAV file")
    }
}

/// Outcome of an offline render
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSummary {
    pub samples: u64,
    pub sample_rate: u32,
    pub completions: usize,
}

impl RenderSummary {
    pub fn duration_secs(&self) -> f64 {
        self.samples as f64 / self.sample_rate as f64
    }
}

/// Render one session with `params` into a mono WAV file.
///
/// Runs the same engine as live playback against an offline host, block by
/// block, until the session tears itself down.
pub fn render_to_wav(config: &TonematchConfig, params: EffectParams, path: &Path) -> Result<RenderSummary> {
    config.validate()?;
    let sample_rate = config.audio.sample_rate;
    let mut engine = ToneEngine::offline(config.clone());

    let completions = Arc::new(AtomicUsize::new(0));
    let counter = completions.clone();
    engine.play(params, move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    if !engine.is_playing() {
        bail!("offline engine did not start a session");
    }

    let mut recorder = Recorder::new(path, sample_rate)?;
    let mut buffer = vec![0.0f32; config.audio.buffer_size];
    while engine.is_playing() {
        engine.render(&mut buffer);
        recorder.write_buffer(&buffer)?;
    }

    let summary = RenderSummary {
        samples: recorder.samples_written(),
        sample_rate,
        completions: completions.load(Ordering::SeqCst),
    };
    recorder.finalize()?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Effect;
    use tempfile::NamedTempFile;

    #[test]
    fn test_recorder_creation() {
        let file = NamedTempFile::new().unwrap();
        let recorder = Recorder::new(file.path(), 44100).unwrap();

        assert_eq!(recorder.sample_rate(), 44100);
        assert_eq!(recorder.samples_written(), 0);
        assert_eq!(recorder.duration_secs(), 0.0);
    }

    #[test]
    fn test_recorder_write_buffer() {
        let file = NamedTempFile::new().unwrap();
        let mut recorder = Recorder::new(file.path(), 44100).unwrap();

        let buffer = vec![0.1, 0.2, 0.3, 0.4, 0.5];
        recorder.write_buffer(&buffer).unwrap();

        assert_eq!(recorder.samples_written(), 5);
    }

    #[test]
    fn test_recorder_produces_valid_wav() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();

        {
            let mut recorder = Recorder::new(&path, 44100).unwrap();
            let samples: Vec<f32> = (0..1000)
                .map(|i| (i as f32 / 1000.0 * std::f32::consts::PI * 2.0).sin())
                .collect();
            recorder.write_buffer(&samples).unwrap();
            recorder.finalize().unwrap();
        }

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();

        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 44100);
        assert_eq!(spec.bits_per_sample, 32);
        assert_eq!(spec.sample_format, SampleFormat::Float);

        let samples: Vec<f32> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), 1000);
    }

    fn small_config() -> TonematchConfig {
        let mut config = TonematchConfig::default();
        config.audio.sample_rate = 8000;
        config.audio.buffer_size = 256;
        config
    }

    #[test]
    fn test_render_dry_session() {
        let file = NamedTempFile::new().unwrap();
        let summary = render_to_wav(&small_config(), EffectParams::default(), file.path()).unwrap();

        assert_eq!(summary.completions, 1);
        // 2.3 s rounded up to whole blocks
        assert!(summary.duration_secs() >= 2.3);
        assert!(summary.duration_secs() < 2.3 + 256.0 / 8000.0);

        let reader = hound::WavReader::open(file.path()).unwrap();
        let samples: Vec<f32> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len() as u64, summary.samples);
        assert!(samples.iter().any(|s| s.abs() > 0.01));
    }

    #[test]
    fn test_render_with_delay_runs_longer() {
        let file = NamedTempFile::new().unwrap();
        let params = EffectParams::default().with(Effect::DelayTime, 1.0);
        let summary = render_to_wav(&small_config(), params, file.path()).unwrap();

        assert_eq!(summary.completions, 1);
        assert!(summary.duration_secs() >= 4.3);
        assert!(summary.duration_secs() < 4.3 + 256.0 / 8000.0);
    }

    #[test]
    fn test_render_rejects_zero_buffer() {
        let file = NamedTempFile::new().unwrap();
        let mut config = small_config();
        config.audio.buffer_size = 0;
        assert!(render_to_wav(&config, EffectParams::default(), file.path()).is_err());
    }

    #[test]
    fn test_render_rejects_non_finite_timing() {
        let file = NamedTempFile::new().unwrap();
        let mut config = small_config();
        config.engine.release = f64::INFINITY;
        assert!(render_to_wav(&config, EffectParams::default(), file.path()).is_err());

        let mut config = small_config();
        config.engine.note_duration = f64::NAN;
        assert!(render_to_wav(&config, EffectParams::default(), file.path()).is_err());
    }
}
