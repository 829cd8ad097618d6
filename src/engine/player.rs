//! Real-time audio output using cpal

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use tracing::{debug, info, warn};

use super::context::{try_lock, SharedContext};
use super::host::AudioHost;
use crate::error::EngineError;

/// Output host backed by a cpal device
pub struct CpalHost {
    device_name: Option<String>,
    device: Option<Device>,
    config: Option<(StreamConfig, SampleFormat)>,
    stream: Option<Stream>,
}

impl CpalHost {
    /// Host for the named output device, or the default device when `None`
    pub fn new(device_name: Option<String>) -> Self {
        Self {
            device_name,
            device: None,
            config: None,
            stream: None,
        }
    }

    fn find_device(&self) -> Result<Device, EngineError> {
        let host = cpal::default_host();
        match &self.device_name {
            None => host.default_output_device().ok_or(EngineError::NoOutputDevice),
            Some(wanted) => host
                .output_devices()?
                .find(|d| d.name().map(|n| &n == wanted).unwrap_or(false))
                .ok_or_else(|| EngineError::DeviceNotFound(wanted.clone())),
        }
    }

    fn build_stream<T: cpal::SizedSample + cpal::FromSample<f32>>(
        device: &Device,
        config: &StreamConfig,
        context: SharedContext,
    ) -> Result<Stream, EngineError> {
        let channels = config.channels as usize;
        let mut block: Vec<f32> = Vec::new();

        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                block.resize(data.len(), 0.0);

                let finished = match try_lock(&context) {
                    Some(mut ctx) => ctx.render(&mut block, channels),
                    None => {
                        // Engine is busy building a graph; output silence
                        block.fill(0.0);
                        None
                    }
                };

                for (out, &sample) in data.iter_mut().zip(&block) {
                    *out = T::from_sample(sample);
                }

                if let Some(finished) = finished {
                    finished.complete();
                }
            },
            |err| {
                warn!("audio stream error: {}", err);
            },
            None,
        )?;

        Ok(stream)
    }
}

impl AudioHost for CpalHost {
    fn name(&self) -> &str {
        self.device_name.as_deref().unwrap_or("default output")
    }

    fn open(&mut self) -> Result<u32, EngineError> {
        let device = self.find_device()?;
        let supported = device.default_output_config()?;
        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.into();
        let sample_rate = config.sample_rate.0;

        info!(
            device = %device.name().unwrap_or_default(),
            sample_rate,
            channels = config.channels,
            format = ?sample_format,
            "output device opened"
        );

        self.device = Some(device);
        self.config = Some((config, sample_format));
        Ok(sample_rate)
    }

    fn start(&mut self, context: SharedContext) -> Result<(), EngineError> {
        let (Some(device), Some((config, sample_format))) = (&self.device, &self.config) else {
            return Err(EngineError::NotOpen);
        };

        let stream = match sample_format {
            SampleFormat::F32 => Self::build_stream::<f32>(device, config, context)?,
            SampleFormat::I16 => Self::build_stream::<i16>(device, config, context)?,
            SampleFormat::U16 => Self::build_stream::<u16>(device, config, context)?,
            other => return Err(EngineError::UnsupportedSampleFormat(format!("{:?}", other))),
        };

        self.stream = Some(stream);
        Ok(())
    }

    fn resume(&mut self) -> Result<(), EngineError> {
        let stream = self.stream.as_ref().ok_or(EngineError::NotOpen)?;
        stream.play()?;
        debug!("output stream playing");
        Ok(())
    }

    fn suspend(&mut self) -> Result<(), EngineError> {
        let stream = self.stream.as_ref().ok_or(EngineError::NotOpen)?;
        stream.pause()?;
        debug!("output stream paused");
        Ok(())
    }

    fn close(&mut self) {
        if self.stream.take().is_some() {
            info!("output stream closed");
        }
        self.device = None;
        self.config = None;
    }
}

/// Get the default output device name
pub fn default_device_name() -> Option<String> {
    let host = cpal::default_host();
    host.default_output_device().and_then(|d| d.name().ok())
}

/// List all available output devices
pub fn list_output_devices() -> Vec<(String, StreamConfig)> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    if let Ok(output_devices) = host.output_devices() {
        for device in output_devices {
            if let (Ok(name), Ok(config)) = (device.name(), device.default_output_config()) {
                devices.push((name, config.into()));
            }
        }
    }

    devices
}
