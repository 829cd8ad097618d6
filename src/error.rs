//! Error types

use thiserror::Error;

/// Errors raised while bringing up or driving an audio output
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no output device available")]
    NoOutputDevice,

    #[error("output device not found: {0}")]
    DeviceNotFound(String),

    #[error("unsupported sample format: {0}")]
    UnsupportedSampleFormat(String),

    #[error("audio host used before open")]
    NotOpen,

    #[error(transparent)]
    Devices(#[from] cpal::DevicesError),

    #[error(transparent)]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error(transparent)]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error(transparent)]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error(transparent)]
    PauseStream(#[from] cpal::PauseStreamError),
}
