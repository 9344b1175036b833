use crate::error::ConvertError;

// fourcc codes (V4L2_PIX_FMT_*)
pub(crate) const FOURCC_RGB24: u32 = u32::from_le_bytes(*b"RGB3");
pub(crate) const FOURCC_RGB32: u32 = u32::from_le_bytes(*b"RGB4");
pub(crate) const FOURCC_GREY: u32 = u32::from_le_bytes(*b"GREY");
pub(crate) const FOURCC_YUYV: u32 = u32::from_le_bytes(*b"YUYV");
pub(crate) const FOURCC_MJPG: u32 = u32::from_le_bytes(*b"MJPG");

/// Convert a fourcc code to a readable 4-character string.
pub fn fourcc_to_string(fourcc: u32) -> String {
    String::from_utf8_lossy(&fourcc.to_le_bytes()).into_owned()
}

/// Pixel formats the capture core can negotiate with a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Packed RGB, 3 bytes per pixel.
    Rgb24,
    /// Packed RGB with padding byte, 4 bytes per pixel.
    Rgb32,
    /// 8-bit greyscale.
    Grey,
    /// Packed YUV 4:2:2, 2 bytes per pixel.
    Yuyv,
    /// Motion-JPEG, one compressed image per frame.
    Jpeg,
}

impl PixelFormat {
    /// Map a V4L2 fourcc code to a `PixelFormat`.
    ///
    /// Drivers can answer a format negotiation with any code they like,
    /// so unknown codes are an error rather than a panic.
    pub fn from_fourcc(fourcc: u32) -> Result<Self, ConvertError> {
        match fourcc {
            FOURCC_RGB24 => Ok(PixelFormat::Rgb24),
            FOURCC_RGB32 => Ok(PixelFormat::Rgb32),
            FOURCC_GREY => Ok(PixelFormat::Grey),
            FOURCC_YUYV => Ok(PixelFormat::Yuyv),
            FOURCC_MJPG => Ok(PixelFormat::Jpeg),
            _ => Err(ConvertError::UnknownFourcc(fourcc)),
        }
    }

    pub fn as_fourcc(&self) -> u32 {
        match self {
            PixelFormat::Rgb24 => FOURCC_RGB24,
            PixelFormat::Rgb32 => FOURCC_RGB32,
            PixelFormat::Grey => FOURCC_GREY,
            PixelFormat::Yuyv => FOURCC_YUYV,
            PixelFormat::Jpeg => FOURCC_MJPG,
        }
    }

    pub fn fourcc_bytes(&self) -> [u8; 4] {
        self.as_fourcc().to_le_bytes()
    }

    /// Bytes per pixel for uncompressed formats, `None` for compressed.
    pub fn bytes_per_pixel(&self) -> Option<usize> {
        match self {
            PixelFormat::Rgb24 => Some(3),
            PixelFormat::Rgb32 => Some(4),
            PixelFormat::Grey => Some(1),
            PixelFormat::Yuyv => Some(2),
            PixelFormat::Jpeg => None,
        }
    }

    /// Expected payload size of an unpadded frame, `None` for compressed.
    pub fn frame_size(&self, width: u32, height: u32) -> Option<usize> {
        self.bytes_per_pixel()
            .map(|bpp| width as usize * height as usize * bpp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fourcc_roundtrip() {
        for format in [
            PixelFormat::Rgb24,
            PixelFormat::Rgb32,
            PixelFormat::Grey,
            PixelFormat::Yuyv,
            PixelFormat::Jpeg,
        ] {
            assert_eq!(PixelFormat::from_fourcc(format.as_fourcc()).unwrap(), format);
        }
    }

    #[test]
    fn unknown_fourcc_is_an_error() {
        let fourcc = u32::from_le_bytes(*b"S920");
        match PixelFormat::from_fourcc(fourcc) {
            Err(ConvertError::UnknownFourcc(code)) => assert_eq!(code, fourcc),
            other => panic!("expected UnknownFourcc, got {other:?}"),
        }
    }

    #[test]
    fn fourcc_string() {
        assert_eq!(fourcc_to_string(FOURCC_YUYV), "YUYV");
        assert_eq!(fourcc_to_string(FOURCC_MJPG), "MJPG");
    }

    #[test]
    fn frame_sizes() {
        assert_eq!(PixelFormat::Rgb24.frame_size(640, 480), Some(640 * 480 * 3));
        assert_eq!(PixelFormat::Rgb32.frame_size(640, 480), Some(640 * 480 * 4));
        assert_eq!(PixelFormat::Yuyv.frame_size(640, 480), Some(640 * 480 * 2));
        assert_eq!(PixelFormat::Grey.frame_size(640, 480), Some(640 * 480));
        assert_eq!(PixelFormat::Jpeg.frame_size(640, 480), None);
    }
}
