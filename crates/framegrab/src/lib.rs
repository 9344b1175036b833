//! Frame grabber library for V4L2 capture devices.
//!
//! [`FrameGrabber`] is the blocking handle: open a device, pick an input
//! source, tune the TV tuner, adjust picture controls, and grab frames
//! from a memory-mapped buffer ring. [`CaptureSession`] wraps a grabber
//! in a background worker for async code and implements
//! `futures_core::Stream`.

mod config;
mod controls;
mod error;
mod frame;
mod grabber;
mod session;
mod sys;

pub use config::{GrabberConfig, SourceSelect};
pub use error::GrabberError;
pub use frame::Frame;
pub use framegrab_image::PixelFormat;
pub use grabber::{DeviceInfo, FrameGrabber, Source, TunerInfo, devices};
pub use session::CaptureSession;
pub use sys::Standard;
