use framegrab_image::PixelFormat;

use crate::sys::Standard;

/// How to pick an input source at open time.
#[derive(Debug, Clone)]
pub enum SourceSelect {
    Index(u32),
    /// Case-insensitive match against the driver's input names.
    Name(String),
}

/// Configuration for a frame grabber device.
#[derive(Debug, Clone)]
pub struct GrabberConfig {
    device: String,
    width: u32,
    height: u32,
    format: PixelFormat,
    fps: u32,
    buffer_count: u32,
    source: Option<SourceSelect>,
    standard: Option<Standard>,
}

impl Default for GrabberConfig {
    fn default() -> Self {
        Self {
            device: "/dev/video0".to_string(),
            width: 640,
            height: 480,
            format: PixelFormat::Yuyv,
            fps: 30,
            buffer_count: 4,
            source: None,
            standard: None,
        }
    }
}

impl GrabberConfig {
    /// Set the device path (e.g., "/dev/video2").
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = device.into();
        self
    }

    /// Set the capture width in pixels.
    pub fn with_width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    /// Set the capture height in pixels.
    pub fn with_height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    /// Set the desired pixel format.
    pub fn with_format(mut self, format: PixelFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the frames per second.
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Set the number of mmap buffers in the capture ring (minimum 2).
    pub fn with_buffer_count(mut self, buffer_count: u32) -> Self {
        self.buffer_count = buffer_count.max(2);
        self
    }

    /// Select the input source at open time.
    pub fn with_source(mut self, source: SourceSelect) -> Self {
        self.source = Some(source);
        self
    }

    /// Select the input source by index at open time.
    pub fn with_source_index(self, index: u32) -> Self {
        self.with_source(SourceSelect::Index(index))
    }

    /// Select the input source by name at open time.
    pub fn with_source_name(self, name: impl Into<String>) -> Self {
        self.with_source(SourceSelect::Name(name.into()))
    }

    /// Set the video standard at open time.
    pub fn with_standard(mut self, standard: Standard) -> Self {
        self.standard = Some(standard);
        self
    }

    // Getters
    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn buffer_count(&self) -> u32 {
        self.buffer_count
    }

    pub fn source(&self) -> Option<&SourceSelect> {
        self.source.as_ref()
    }

    pub fn standard(&self) -> Option<Standard> {
        self.standard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = GrabberConfig::default();
        assert_eq!(config.device(), "/dev/video0");
        assert_eq!(config.width(), 640);
        assert_eq!(config.height(), 480);
        assert_eq!(config.format(), PixelFormat::Yuyv);
        assert_eq!(config.fps(), 30);
        assert_eq!(config.buffer_count(), 4);
        assert!(config.source().is_none());
        assert!(config.standard().is_none());
    }

    #[test]
    fn builder_chain() {
        let config = GrabberConfig::default()
            .with_device("/dev/video1")
            .with_width(320)
            .with_height(240)
            .with_format(PixelFormat::Jpeg)
            .with_fps(15)
            .with_source_name("S-Video")
            .with_standard(Standard::Pal);
        assert_eq!(config.device(), "/dev/video1");
        assert_eq!(config.width(), 320);
        assert_eq!(config.height(), 240);
        assert_eq!(config.format(), PixelFormat::Jpeg);
        assert_eq!(config.fps(), 15);
        assert!(matches!(config.source(), Some(SourceSelect::Name(n)) if n == "S-Video"));
        assert_eq!(config.standard(), Some(Standard::Pal));
    }

    #[test]
    fn buffer_count_floor() {
        assert_eq!(GrabberConfig::default().with_buffer_count(1).buffer_count(), 2);
        assert_eq!(GrabberConfig::default().with_buffer_count(8).buffer_count(), 8);
    }
}
