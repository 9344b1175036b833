use std::fmt;

#[derive(Debug)]
pub enum ConvertError {
    /// The fourcc code does not map to a supported pixel format.
    UnknownFourcc(u32),
    /// The payload length does not match the frame geometry.
    Length { expected: usize, actual: usize },
    /// Compressed payload could not be decoded.
    Decode(String),
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::UnknownFourcc(fourcc) => {
                write!(
                    f,
                    "unknown fourcc: {} (0x{fourcc:08x})",
                    crate::pixelformat::fourcc_to_string(*fourcc)
                )
            }
            ConvertError::Length { expected, actual } => {
                write!(f, "payload length mismatch: expected {expected}, got {actual}")
            }
            ConvertError::Decode(msg) => write!(f, "decode error: {msg}"),
        }
    }
}

impl std::error::Error for ConvertError {}

impl From<crates_image::ImageError> for ConvertError {
    fn from(err: crates_image::ImageError) -> Self {
        ConvertError::Decode(err.to_string())
    }
}
