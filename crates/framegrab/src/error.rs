use std::fmt;

use framegrab_image::ConvertError;

#[derive(Debug)]
pub enum GrabberError {
    Device(String),
    Stream(String),
    Control(String),
    Tuner(String),
    Convert(ConvertError),
    Channel(String),
}

impl fmt::Display for GrabberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrabberError::Device(msg) => write!(f, "device error: {msg}"),
            GrabberError::Stream(msg) => write!(f, "stream error: {msg}"),
            GrabberError::Control(msg) => write!(f, "control error: {msg}"),
            GrabberError::Tuner(msg) => write!(f, "tuner error: {msg}"),
            GrabberError::Convert(err) => write!(f, "convert error: {err}"),
            GrabberError::Channel(msg) => write!(f, "channel error: {msg}"),
        }
    }
}

impl std::error::Error for GrabberError {}

impl From<std::io::Error> for GrabberError {
    fn from(err: std::io::Error) -> Self {
        GrabberError::Device(err.to_string())
    }
}

impl From<ConvertError> for GrabberError {
    fn from(err: ConvertError) -> Self {
        GrabberError::Convert(err)
    }
}
