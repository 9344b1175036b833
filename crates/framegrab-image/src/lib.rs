//! Pixel formats and software conversion for the framegrab capture core.
//!
//! Frame grabber drivers hand out raw YUYV, RGB or MJPEG payloads; this
//! crate maps V4L2 fourcc codes to a typed `PixelFormat`, converts raw
//! buffers to packed RGB24, and writes binary PPM images.

pub mod convert;
pub mod error;
pub mod pixelformat;
pub mod ppm;

pub use convert::{grey_to_rgb24, jpeg_to_rgb24, rgb32_to_rgb24, to_rgb24, yuyv_to_rgb24};
pub use error::ConvertError;
pub use pixelformat::{PixelFormat, fourcc_to_string};
pub use ppm::{save_ppm, write_ppm};
