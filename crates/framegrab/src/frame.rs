use std::path::Path;
use std::time::Duration;

use framegrab_image::{self as fgimage, PixelFormat};

use crate::error::GrabberError;

/// A captured video frame with an owned payload.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub data: Vec<u8>,
    /// Driver frame counter.
    pub sequence: u32,
    /// Driver capture timestamp.
    pub timestamp: Duration,
}

impl Frame {
    /// Allocate a frame for the given geometry: zeroed for uncompressed
    /// formats, empty for compressed ones.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let data = match format.frame_size(width, height) {
            Some(size) => vec![0u8; size],
            None => Vec::new(),
        };
        Self {
            width,
            height,
            format,
            data,
            sequence: 0,
            timestamp: Duration::ZERO,
        }
    }

    /// Expected payload size, `None` for compressed formats.
    pub fn expected_size(&self) -> Option<usize> {
        self.format.frame_size(self.width, self.height)
    }

    /// Whether this frame can hold captures of the given geometry.
    pub fn is_compatible(&self, width: u32, height: u32, format: PixelFormat) -> bool {
        self.width == width && self.height == height && self.format == format
    }

    /// Convert to a packed RGB24 frame, decoding JPEG payloads if needed.
    pub fn to_rgb(&self) -> Result<Frame, GrabberError> {
        let rgb = fgimage::to_rgb24(self.format, self.width, self.height, &self.data)?;
        Ok(Frame {
            width: self.width,
            height: self.height,
            format: PixelFormat::Rgb24,
            data: rgb,
            sequence: self.sequence,
            timestamp: self.timestamp,
        })
    }

    /// Save as a binary PPM image, converting to RGB24 first if needed.
    pub fn save_ppm<P: AsRef<Path>>(&self, path: P) -> Result<(), GrabberError> {
        let rgb = if self.format == PixelFormat::Rgb24 {
            None
        } else {
            Some(self.to_rgb()?)
        };
        let frame = rgb.as_ref().unwrap_or(self);
        fgimage::save_ppm(path, frame.width, frame.height, &frame.data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_frame_is_zeroed() {
        let frame = Frame::new(4, 2, PixelFormat::Yuyv);
        assert_eq!(frame.data.len(), 16);
        assert!(frame.data.iter().all(|&b| b == 0));
        assert_eq!(frame.expected_size(), Some(16));
    }

    #[test]
    fn jpeg_frame_has_no_fixed_size() {
        let frame = Frame::new(640, 480, PixelFormat::Jpeg);
        assert!(frame.data.is_empty());
        assert_eq!(frame.expected_size(), None);
    }

    #[test]
    fn compatibility() {
        let frame = Frame::new(320, 240, PixelFormat::Rgb24);
        assert!(frame.is_compatible(320, 240, PixelFormat::Rgb24));
        assert!(!frame.is_compatible(320, 240, PixelFormat::Rgb32));
        assert!(!frame.is_compatible(640, 240, PixelFormat::Rgb24));
    }

    #[test]
    fn to_rgb_from_yuyv() {
        let mut frame = Frame::new(2, 1, PixelFormat::Yuyv);
        frame.data = vec![50, 128, 200, 128];
        frame.sequence = 7;
        let rgb = frame.to_rgb().unwrap();
        assert_eq!(rgb.format, PixelFormat::Rgb24);
        assert_eq!(rgb.data, vec![50, 50, 50, 200, 200, 200]);
        assert_eq!(rgb.sequence, 7);
    }

    #[test]
    fn to_rgb_rejects_truncated_payload() {
        let mut frame = Frame::new(2, 1, PixelFormat::Yuyv);
        frame.data.truncate(3);
        match frame.to_rgb() {
            Err(GrabberError::Convert(_)) => {}
            other => panic!("expected Convert error, got {other:?}"),
        }
    }

    #[test]
    fn save_ppm_converts() {
        let mut frame = Frame::new(1, 1, PixelFormat::Grey);
        frame.data = vec![200];
        let path = std::env::temp_dir().join("framegrab_frame_test.ppm");
        frame.save_ppm(&path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes, b"P6\n1 1\n255\n\xc8\xc8\xc8");
        std::fs::remove_file(&path).unwrap();
    }
}
