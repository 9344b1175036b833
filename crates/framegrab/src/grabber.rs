//! The blocking frame-grabber handle and its streaming state machine.

use std::fmt::Write as _;
use std::os::fd::RawFd;
use std::path::PathBuf;
use std::time::Duration;

use framegrab_image::{PixelFormat, fourcc_to_string};
use v4l::buffer::Type;
use v4l::capability::{Capabilities, Flags};
use v4l::control::{Control, Description, Value};
use v4l::io::mmap::Stream as MmapStream;
use v4l::io::traits::{CaptureStream, Stream as _};
use v4l::video::Capture;
use v4l::{Device, Format, FourCC};

use crate::config::{GrabberConfig, SourceSelect};
use crate::controls;
use crate::error::GrabberError;
use crate::frame::Frame;
use crate::sys::{self, Standard};

/// An input source of an open device (e.g. camera, composite, tuner).
#[derive(Debug, Clone)]
pub struct Source {
    pub index: u32,
    pub name: String,
    pub is_tuner: bool,
}

/// Tuner state of the current source.
#[derive(Debug, Clone)]
pub struct TunerInfo {
    pub name: String,
    /// Tunable range in MHz.
    pub range_mhz: (f64, f64),
    /// Relative signal strength (0 = no signal).
    pub signal: u32,
}

/// A V4L2 capture node found on the system.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub index: usize,
    pub path: PathBuf,
    pub name: Option<String>,
}

/// Enumerate the V4L2 capture nodes available on the system.
pub fn devices() -> Vec<DeviceInfo> {
    v4l::context::enum_devices()
        .iter()
        .map(|node| DeviceInfo {
            index: node.index(),
            path: node.path().to_path_buf(),
            name: node.name(),
        })
        .collect()
}

/// A blocking frame grabber handle.
///
/// Opens and configures a capture device, exposes source/standard/tuner
/// and picture controls, and runs the memory-mapped streaming state
/// machine: `open` -> `start` -> `grab`* -> `stop`.
pub struct FrameGrabber {
    device: Device,
    caps: Capabilities,
    sources: Vec<sys::InputDesc>,
    controls: Vec<Description>,
    width: u32,
    height: u32,
    format: PixelFormat,
    frame_rate: f32,
    buffer_count: u32,
    stream: Option<MmapStream<'static>>,
}

impl std::fmt::Debug for FrameGrabber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameGrabber")
            .field("card", &self.caps.card)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("frame_rate", &self.frame_rate)
            .field("streaming", &self.stream.is_some())
            .finish()
    }
}

impl FrameGrabber {
    /// Open and configure a frame grabber device.
    ///
    /// Queries capabilities (the device must support video capture with
    /// streaming I/O), discovers input sources, applies the configured
    /// source and standard, and negotiates format and frame rate. The
    /// driver may adjust the requested geometry; the negotiated values
    /// are available through `width()`/`height()`/`format()`.
    ///
    /// # Errors
    ///
    /// Returns `GrabberError::Device` if the device cannot be opened,
    /// lacks the required capabilities, or answers the format
    /// negotiation with a fourcc this crate cannot handle.
    pub fn open(config: GrabberConfig) -> Result<Self, GrabberError> {
        let device = Device::with_path(config.device())?;

        let caps = device.query_caps()?;
        if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
            return Err(GrabberError::Device(format!(
                "{} does not support video capture",
                config.device()
            )));
        }
        if !caps.capabilities.contains(Flags::STREAMING) {
            return Err(GrabberError::Device(format!(
                "{} does not support streaming I/O",
                config.device()
            )));
        }
        log::info!(
            "opened {}: {} ({} driver)",
            config.device(),
            caps.card,
            caps.driver
        );

        let fd = device.handle().fd();
        let sources = sys::enum_inputs(fd);
        if sources.is_empty() {
            // many USB cameras report no selectable inputs; not fatal
            log::warn!("{}: no input sources reported", config.device());
        }
        for source in &sources {
            log::debug!("input {}: {}", source.index, source.name);
        }

        let mut grabber = Self {
            device,
            caps,
            sources,
            controls: Vec::new(),
            width: config.width(),
            height: config.height(),
            format: config.format(),
            frame_rate: config.fps() as f32,
            buffer_count: config.buffer_count(),
            stream: None,
        };

        match config.source() {
            Some(SourceSelect::Index(index)) => grabber.set_source(*index)?,
            Some(SourceSelect::Name(name)) => grabber.set_source_by_name(name)?,
            None => {}
        }
        if let Some(standard) = config.standard() {
            grabber.set_standard(standard)?;
        }

        grabber.apply_format(config.width(), config.height(), config.format())?;
        grabber.apply_frame_rate(config.fps())?;
        grabber.controls = grabber.device.query_controls()?;

        Ok(grabber)
    }

    fn fd(&self) -> RawFd {
        self.device.handle().fd()
    }

    // Negotiated capture geometry and rate

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn frame_rate(&self) -> f32 {
        self.frame_rate
    }

    pub fn driver(&self) -> &str {
        &self.caps.driver
    }

    pub fn card(&self) -> &str {
        &self.caps.card
    }

    // Input sources

    pub fn sources(&self) -> Vec<Source> {
        self.sources
            .iter()
            .map(|input| Source {
                index: input.index,
                name: input.name.clone(),
                is_tuner: input.is_tuner,
            })
            .collect()
    }

    /// Index of the currently selected input source.
    pub fn source(&self) -> Result<u32, GrabberError> {
        Ok(sys::current_input(self.fd())?)
    }

    /// Select an input source by index.
    ///
    /// Controls are re-discovered afterwards since they can differ
    /// between inputs.
    pub fn set_source(&mut self, index: u32) -> Result<(), GrabberError> {
        if index as usize >= self.sources.len() {
            return Err(GrabberError::Device(format!(
                "invalid source index {index} (device has {})",
                self.sources.len()
            )));
        }
        log::debug!("selecting source {index} ({})", self.sources[index as usize].name);
        sys::select_input(self.fd(), index)?;
        self.controls = self.device.query_controls()?;
        Ok(())
    }

    /// Select an input source by case-insensitive name.
    pub fn set_source_by_name(&mut self, name: &str) -> Result<(), GrabberError> {
        let index = self
            .sources
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .map(|s| s.index)
            .ok_or_else(|| GrabberError::Device(format!("no source named {name:?}")))?;
        self.set_source(index)
    }

    // Video standard

    /// The current video standard, if it maps to a known norm.
    pub fn standard(&self) -> Result<Option<Standard>, GrabberError> {
        let id = sys::standard(self.fd())?;
        Ok(Standard::from_std_id(id))
    }

    /// Set the video signal norm for the current source.
    pub fn set_standard(&mut self, standard: Standard) -> Result<(), GrabberError> {
        log::debug!("setting standard {standard}");
        sys::set_standard(self.fd(), standard.std_id())?;
        Ok(())
    }

    // Tuner

    fn tuner_index(&self) -> Result<u32, GrabberError> {
        let current = sys::current_input(self.fd())?;
        self.sources
            .iter()
            .find(|s| s.index == current && s.is_tuner)
            .map(|s| s.tuner)
            .ok_or_else(|| GrabberError::Tuner("current source has no tuner".to_string()))
    }

    /// Tuner state of the current source, `None` if it has no tuner.
    pub fn tuner(&self) -> Result<Option<TunerInfo>, GrabberError> {
        let index = match self.tuner_index() {
            Ok(index) => index,
            Err(_) => return Ok(None),
        };
        let desc = sys::tuner(self.fd(), index)
            .map_err(|e| GrabberError::Tuner(e.to_string()))?;
        Ok(Some(TunerInfo {
            name: desc.name,
            range_mhz: desc.range_mhz,
            signal: desc.signal,
        }))
    }

    /// The current tuner frequency in MHz.
    pub fn frequency_mhz(&self) -> Result<f64, GrabberError> {
        let index = self.tuner_index()?;
        let desc = sys::tuner(self.fd(), index)
            .map_err(|e| GrabberError::Tuner(e.to_string()))?;
        Ok(sys::frequency_mhz(self.fd(), index, desc.low_unit)
            .map_err(|e| GrabberError::Tuner(e.to_string()))?)
    }

    /// Tune the current source to the given frequency in MHz.
    pub fn set_frequency_mhz(&mut self, mhz: f64) -> Result<(), GrabberError> {
        let index = self.tuner_index()?;
        let desc = sys::tuner(self.fd(), index)
            .map_err(|e| GrabberError::Tuner(e.to_string()))?;
        let (low, high) = desc.range_mhz;
        if mhz < low || mhz > high {
            return Err(GrabberError::Tuner(format!(
                "{mhz} MHz outside tunable range {low}..{high} MHz"
            )));
        }
        log::debug!("tuning to {mhz} MHz");
        sys::set_frequency_mhz(self.fd(), index, desc.tuner_type, desc.low_unit, mhz)
            .map_err(|e| GrabberError::Tuner(e.to_string()))
    }

    // Picture controls

    /// Names of the controls the current source advertises.
    pub fn control_names(&self) -> Vec<String> {
        self.controls.iter().map(|d| d.name.clone()).collect()
    }

    /// Set a control by name to a 0.0..=1.0 fraction of its range.
    ///
    /// Negative fractions reset the control to its driver default.
    pub fn set_control(&mut self, name: &str, fraction: f64) -> Result<(), GrabberError> {
        let desc = controls::find_by_name(&self.controls, name)
            .ok_or_else(|| GrabberError::Control(format!("no control named {name:?}")))?;
        self.write_control(desc.id, desc.minimum as i64, desc.maximum as i64, desc.default as i64, fraction)
    }

    /// Read a control by name as a 0.0..=1.0 fraction of its range.
    pub fn control(&self, name: &str) -> Result<f64, GrabberError> {
        let desc = controls::find_by_name(&self.controls, name)
            .ok_or_else(|| GrabberError::Control(format!("no control named {name:?}")))?;
        self.read_control(desc.id, desc.minimum as i64, desc.maximum as i64)
    }

    pub fn set_brightness(&mut self, percent: u32) -> Result<(), GrabberError> {
        self.set_control_by_id(controls::CID_BRIGHTNESS, "brightness", percent)
    }

    pub fn set_contrast(&mut self, percent: u32) -> Result<(), GrabberError> {
        self.set_control_by_id(controls::CID_CONTRAST, "contrast", percent)
    }

    /// Colour saturation (colour balance on analog hardware).
    pub fn set_saturation(&mut self, percent: u32) -> Result<(), GrabberError> {
        self.set_control_by_id(controls::CID_SATURATION, "saturation", percent)
    }

    pub fn set_hue(&mut self, percent: u32) -> Result<(), GrabberError> {
        self.set_control_by_id(controls::CID_HUE, "hue", percent)
    }

    pub fn set_whiteness(&mut self, percent: u32) -> Result<(), GrabberError> {
        self.set_control_by_id(controls::CID_WHITENESS, "whiteness", percent)
    }

    fn set_control_by_id(
        &mut self,
        id: u32,
        label: &str,
        percent: u32,
    ) -> Result<(), GrabberError> {
        let desc = controls::find_by_id(&self.controls, id)
            .ok_or_else(|| GrabberError::Control(format!("device has no {label} control")))?;
        let fraction = controls::percent_to_fraction(percent);
        self.write_control(desc.id, desc.minimum as i64, desc.maximum as i64, desc.default as i64, fraction)
    }

    fn write_control(
        &self,
        id: u32,
        minimum: i64,
        maximum: i64,
        default: i64,
        fraction: f64,
    ) -> Result<(), GrabberError> {
        let value = controls::write_value(fraction, minimum, maximum, default).ok_or_else(
            || {
                GrabberError::Control(format!(
                    "value {fraction} out of range for control 0x{id:08x}"
                ))
            },
        )?;
        log::debug!("control 0x{id:08x} <- {value}");
        self.device
            .set_control(Control {
                id,
                value: Value::Integer(value),
            })
            .map_err(|e| GrabberError::Control(e.to_string()))
    }

    fn read_control(&self, id: u32, minimum: i64, maximum: i64) -> Result<f64, GrabberError> {
        let control = self
            .device
            .control(id)
            .map_err(|e| GrabberError::Control(e.to_string()))?;
        match control.value {
            Value::Integer(value) => Ok(controls::scale_from_driver(value, minimum, maximum)),
            Value::Boolean(value) => Ok(if value { 1.0 } else { 0.0 }),
            _ => Err(GrabberError::Control(format!(
                "control 0x{id:08x} has an unsupported value type"
            ))),
        }
    }

    // Capture format

    /// Change the capture geometry. Rejected while streaming.
    pub fn set_format(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<(), GrabberError> {
        if self.stream.is_some() {
            return Err(GrabberError::Stream(
                "stop streaming before changing the capture format".to_string(),
            ));
        }
        self.apply_format(width, height, format)
    }

    fn apply_format(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<(), GrabberError> {
        let requested = Format::new(width, height, FourCC::new(&format.fourcc_bytes()));
        let actual = Capture::set_format(&self.device, &requested)?;

        let actual_fourcc = u32::from_le_bytes(actual.fourcc.repr);
        let negotiated = PixelFormat::from_fourcc(actual_fourcc).map_err(|_| {
            GrabberError::Device(format!(
                "driver answered format negotiation with unsupported fourcc {}",
                fourcc_to_string(actual_fourcc)
            ))
        })?;

        if (actual.width, actual.height) != (width, height) || negotiated != format {
            log::warn!(
                "driver adjusted format: requested {}x{} {:?}, got {}x{} {:?}",
                width,
                height,
                format,
                actual.width,
                actual.height,
                negotiated
            );
        }
        self.width = actual.width;
        self.height = actual.height;
        self.format = negotiated;
        Ok(())
    }

    /// Change the capture frame rate. Rejected while streaming.
    pub fn set_frame_rate(&mut self, fps: u32) -> Result<(), GrabberError> {
        if self.stream.is_some() {
            return Err(GrabberError::Stream(
                "stop streaming before changing the frame rate".to_string(),
            ));
        }
        self.apply_frame_rate(fps)
    }

    fn apply_frame_rate(&mut self, fps: u32) -> Result<(), GrabberError> {
        let params = v4l::video::capture::Parameters::with_fps(fps);
        let actual = Capture::set_params(&self.device, &params)?;
        if actual.interval.numerator > 0 {
            self.frame_rate =
                actual.interval.denominator as f32 / actual.interval.numerator as f32;
        }
        Ok(())
    }

    // Streaming state machine

    /// Whether the capture stream is running.
    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }

    /// Allocate the mmap buffer ring and turn streaming on.
    pub fn start(&mut self) -> Result<(), GrabberError> {
        if self.stream.is_some() {
            return Err(GrabberError::Stream("already streaming".to_string()));
        }
        let mut stream =
            MmapStream::with_buffers(&self.device, Type::VideoCapture, self.buffer_count)
                .map_err(|e| GrabberError::Stream(e.to_string()))?;
        stream.start().map_err(|e| GrabberError::Stream(e.to_string()))?;
        self.stream = Some(stream);
        log::info!("capture started ({} buffers)", self.buffer_count);
        Ok(())
    }

    /// Turn streaming off and release the buffer ring.
    pub fn stop(&mut self) -> Result<(), GrabberError> {
        let mut stream = self
            .stream
            .take()
            .ok_or_else(|| GrabberError::Stream("not streaming".to_string()))?;
        stream.stop().map_err(|e| GrabberError::Stream(e.to_string()))?;
        log::info!("capture stopped");
        Ok(())
    }

    /// Grab the next frame, blocking until the driver delivers one.
    ///
    /// The payload is copied out of the mmap ring before the buffer is
    /// handed back to the driver, so the returned frame owns its data.
    pub fn grab(&mut self) -> Result<Frame, GrabberError> {
        let (width, height, format) = (self.width, self.height, self.format);
        let (data, sequence, timestamp) = self.dequeue()?;
        Ok(Frame {
            width,
            height,
            format,
            data,
            sequence,
            timestamp,
        })
    }

    /// Grab the next frame into existing storage.
    ///
    /// The frame must match the negotiated capture geometry.
    pub fn grab_into(&mut self, frame: &mut Frame) -> Result<(), GrabberError> {
        if !frame.is_compatible(self.width, self.height, self.format) {
            return Err(GrabberError::Stream(format!(
                "incompatible frame: {}x{} {:?} vs negotiated {}x{} {:?}",
                frame.width, frame.height, frame.format, self.width, self.height, self.format
            )));
        }
        let (data, sequence, timestamp) = self.dequeue()?;
        frame.data = data;
        frame.sequence = sequence;
        frame.timestamp = timestamp;
        Ok(())
    }

    fn dequeue(&mut self) -> Result<(Vec<u8>, u32, Duration), GrabberError> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| GrabberError::Stream("not streaming".to_string()))?;

        let (buf, meta) = CaptureStream::next(stream)
            .map_err(|e| GrabberError::Stream(e.to_string()))?;

        // compressed frames only fill part of the buffer
        let used = meta.bytesused as usize;
        let data = if used > 0 && used <= buf.len() {
            buf[..used].to_vec()
        } else {
            buf.to_vec()
        };

        let timestamp = Duration::new(
            meta.timestamp.sec.max(0) as u64,
            (meta.timestamp.usec.max(0) as u32).saturating_mul(1000),
        );
        Ok((data, meta.sequence, timestamp))
    }

    /// Allocate a frame matching the negotiated capture geometry.
    pub fn compatible_frame(&self) -> Frame {
        Frame::new(self.width, self.height, self.format)
    }

    /// Human-readable dump of the grabber state.
    pub fn info(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "card:      {}", self.caps.card);
        let _ = writeln!(out, "driver:    {}", self.caps.driver);
        let _ = writeln!(out, "bus:       {}", self.caps.bus);
        let _ = writeln!(
            out,
            "format:    {}x{} {:?} @ {:.1} fps",
            self.width, self.height, self.format, self.frame_rate
        );
        let _ = writeln!(out, "streaming: {}", self.stream.is_some());

        let current = sys::current_input(self.fd()).ok();
        let _ = writeln!(out, "sources:");
        for source in &self.sources {
            let marker = if current == Some(source.index) { "*" } else { " " };
            let kind = if source.is_tuner { "tuner" } else { "camera" };
            let _ = write!(out, "  {marker} {}: {} ({kind}", source.index, source.name);
            if let Some(norm) = Standard::from_std_id(source.standards) {
                let _ = write!(out, ", {norm}");
            }
            let _ = writeln!(out, ")");
        }

        let _ = writeln!(out, "controls:");
        for desc in &self.controls {
            let _ = writeln!(
                out,
                "    {} [{}..{}] default {}",
                desc.name, desc.minimum, desc.maximum, desc.default
            );
        }

        if let Ok(Some(tuner)) = self.tuner() {
            let _ = writeln!(
                out,
                "tuner:     {} ({:.2}..{:.2} MHz, signal {})",
                tuner.name, tuner.range_mhz.0, tuner.range_mhz.1, tuner.signal
            );
        }

        out
    }
}

impl Drop for FrameGrabber {
    fn drop(&mut self) {
        if self.stream.is_some() {
            let _ = self.stop();
        }
    }
}
