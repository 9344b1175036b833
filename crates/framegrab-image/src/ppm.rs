use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Write an RGB24 buffer as a binary PPM (`P6`) image.
pub fn write_ppm<W: Write>(
    writer: &mut W,
    width: u32,
    height: u32,
    rgb: &[u8],
) -> io::Result<()> {
    let expected = width as usize * height as usize * 3;
    if rgb.len() != expected {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("PPM payload must be {expected} bytes, got {}", rgb.len()),
        ));
    }

    write!(writer, "P6\n{width} {height}\n255\n")?;
    writer.write_all(rgb)?;
    writer.flush()
}

/// Save an RGB24 buffer to a PPM file.
pub fn save_ppm<P: AsRef<Path>>(path: P, width: u32, height: u32, rgb: &[u8]) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_ppm(&mut writer, width, height, rgb)
}
