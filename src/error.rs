use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("invalid hex color {0:?}")]
    InvalidHex(String),
    #[error("unknown preset {0:?}")]
    UnknownPreset(String),
    #[error("unknown color scheme {0:?}")]
    UnknownScheme(String),
    #[error("image export failed: {0}")]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Audio(#[from] AudioError),
}

/// Failures while acquiring an audio device. None of them are fatal: the
/// modulator simply stays idle.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("microphone capture is not compiled in (enable the `mic` feature)")]
    Unsupported,
    #[error("no input device available")]
    NoDevice,
    #[error("audio device error: {0}")]
    Device(String),
}
