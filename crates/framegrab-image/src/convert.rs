use crate::error::ConvertError;
use crate::pixelformat::PixelFormat;

// BT.601 YUV-to-RGB conversion for a single pixel (fixed-point, shift 8)
pub(crate) fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = y as i32;
    let u = u as i32 - 128;
    let v = v as i32 - 128;
    let r = (y + ((359 * v) >> 8)).clamp(0, 255) as u8;
    let g = (y - ((88 * u + 183 * v) >> 8)).clamp(0, 255) as u8;
    let b = (y + ((454 * u) >> 8)).clamp(0, 255) as u8;
    (r, g, b)
}

/// Convert packed YUYV 4:2:2 to RGB24. Trailing bytes that do not form a
/// full macropixel are ignored.
pub fn yuyv_to_rgb24(data: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(data.len() / 4 * 6);

    for chunk in data.chunks_exact(4) {
        let (r0, g0, b0) = yuv_to_rgb(chunk[0], chunk[1], chunk[3]);
        let (r1, g1, b1) = yuv_to_rgb(chunk[2], chunk[1], chunk[3]);
        rgb.extend_from_slice(&[r0, g0, b0, r1, g1, b1]);
    }

    rgb
}

/// Drop the padding byte of RGB32 (RGB followed by one filler byte).
pub fn rgb32_to_rgb24(data: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(data.len() / 4 * 3);

    for chunk in data.chunks_exact(4) {
        rgb.extend_from_slice(&chunk[..3]);
    }

    rgb
}

/// Replicate each grey sample into three channels.
pub fn grey_to_rgb24(data: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(data.len() * 3);

    for &grey in data {
        rgb.extend_from_slice(&[grey, grey, grey]);
    }

    rgb
}

/// Decode a JPEG payload to RGB24, returning the decoded geometry.
pub fn jpeg_to_rgb24(data: &[u8]) -> Result<(u32, u32, Vec<u8>), ConvertError> {
    let img = crates_image::load_from_memory(data)?;
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    Ok((width, height, rgb.into_raw()))
}

/// Convert a raw frame payload of the given format to RGB24.
///
/// For uncompressed formats the payload length must match the frame
/// geometry exactly. For JPEG the embedded geometry must match the
/// driver-reported one.
pub fn to_rgb24(
    format: PixelFormat,
    width: u32,
    height: u32,
    data: &[u8],
) -> Result<Vec<u8>, ConvertError> {
    if let Some(expected) = format.frame_size(width, height) {
        if data.len() != expected {
            return Err(ConvertError::Length {
                expected,
                actual: data.len(),
            });
        }
    }

    match format {
        PixelFormat::Rgb24 => Ok(data.to_vec()),
        PixelFormat::Rgb32 => Ok(rgb32_to_rgb24(data)),
        PixelFormat::Grey => Ok(grey_to_rgb24(data)),
        PixelFormat::Yuyv => Ok(yuyv_to_rgb24(data)),
        PixelFormat::Jpeg => {
            let (w, h, rgb) = jpeg_to_rgb24(data)?;
            if (w, h) != (width, height) {
                return Err(ConvertError::Decode(format!(
                    "JPEG geometry {w}x{h} does not match frame {width}x{height}"
                )));
            }
            Ok(rgb)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yuv_grey_point() {
        // U = V = 128 means no chroma; all channels equal luma
        assert_eq!(yuv_to_rgb(0, 128, 128), (0, 0, 0));
        assert_eq!(yuv_to_rgb(128, 128, 128), (128, 128, 128));
        assert_eq!(yuv_to_rgb(255, 128, 128), (255, 255, 255));
    }

    #[test]
    fn yuv_saturates() {
        let (r, _, b) = yuv_to_rgb(255, 255, 255);
        assert_eq!(r, 255);
        assert_eq!(b, 255);
        let (r, g, b) = yuv_to_rgb(0, 0, 0);
        assert_eq!((r, b), (0, 0));
        // negative chroma pushes green up
        assert!(g > 0);
    }

    #[test]
    fn yuyv_pair_shares_chroma() {
        // two pixels with luma 50 and 200, neutral chroma
        let rgb = yuyv_to_rgb24(&[50, 128, 200, 128]);
        assert_eq!(rgb, vec![50, 50, 50, 200, 200, 200]);
    }

    #[test]
    fn yuyv_ignores_trailing_bytes() {
        let rgb = yuyv_to_rgb24(&[50, 128, 200, 128, 99]);
        assert_eq!(rgb.len(), 6);
    }

    #[test]
    fn rgb32_drops_padding() {
        let rgb = rgb32_to_rgb24(&[1, 2, 3, 0xff, 4, 5, 6, 0xff]);
        assert_eq!(rgb, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn grey_replicates() {
        assert_eq!(grey_to_rgb24(&[7, 8]), vec![7, 7, 7, 8, 8, 8]);
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(yuyv_to_rgb24(&[]).is_empty());
        assert!(rgb32_to_rgb24(&[]).is_empty());
        assert!(grey_to_rgb24(&[]).is_empty());
    }

    #[test]
    fn to_rgb24_checks_length() {
        match to_rgb24(PixelFormat::Yuyv, 2, 1, &[0u8; 3]) {
            Err(ConvertError::Length { expected, actual }) => {
                assert_eq!(expected, 4);
                assert_eq!(actual, 3);
            }
            other => panic!("expected Length error, got {other:?}"),
        }
    }

    #[test]
    fn to_rgb24_passthrough() {
        let data = [9u8; 6];
        assert_eq!(to_rgb24(PixelFormat::Rgb24, 2, 1, &data).unwrap(), data);
    }

    #[test]
    fn bad_jpeg_is_decode_error() {
        match to_rgb24(PixelFormat::Jpeg, 2, 2, &[0xde, 0xad, 0xbe, 0xef]) {
            Err(ConvertError::Decode(_)) => {}
            other => panic!("expected Decode error, got {other:?}"),
        }
    }
}
