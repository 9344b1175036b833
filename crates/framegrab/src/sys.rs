//! The slice of the V4L2 ABI the `v4l` crate does not cover: input
//! enumeration and selection, video standards, and the TV tuner.
//!
//! Request codes are built from the kernel's `_IOC` encoding so the
//! struct sizes are taken from the actual repr(C) definitions below.

use std::io;
use std::mem;
use std::os::fd::RawFd;

use libc::{c_ulong, c_void};

const IOC_NRSHIFT: u32 = 0;
const IOC_TYPESHIFT: u32 = 8;
const IOC_SIZESHIFT: u32 = 16;
const IOC_DIRSHIFT: u32 = 30;

const IOC_WRITE: u32 = 1;
const IOC_READ: u32 = 2;

const fn ioc(dir: u32, nr: u8, size: usize) -> c_ulong {
    ((dir << IOC_DIRSHIFT)
        | ((size as u32) << IOC_SIZESHIFT)
        | ((b'V' as u32) << IOC_TYPESHIFT)
        | ((nr as u32) << IOC_NRSHIFT)) as c_ulong
}

const fn ior<T>(nr: u8) -> c_ulong {
    ioc(IOC_READ, nr, mem::size_of::<T>())
}

const fn iow<T>(nr: u8) -> c_ulong {
    ioc(IOC_WRITE, nr, mem::size_of::<T>())
}

const fn iowr<T>(nr: u8) -> c_ulong {
    ioc(IOC_READ | IOC_WRITE, nr, mem::size_of::<T>())
}

const VIDIOC_G_STD: c_ulong = ior::<u64>(23);
const VIDIOC_S_STD: c_ulong = iow::<u64>(24);
const VIDIOC_ENUMINPUT: c_ulong = iowr::<V4l2Input>(26);
const VIDIOC_G_TUNER: c_ulong = iowr::<V4l2Tuner>(29);
const VIDIOC_G_INPUT: c_ulong = ior::<i32>(38);
const VIDIOC_S_INPUT: c_ulong = iowr::<i32>(39);
const VIDIOC_G_FREQUENCY: c_ulong = iowr::<V4l2Frequency>(56);
const VIDIOC_S_FREQUENCY: c_ulong = iow::<V4l2Frequency>(57);

const INPUT_TYPE_TUNER: u32 = 1;

const TUNER_CAP_LOW: u32 = 0x0001;

const STD_PAL: u64 = 0x0000_00ff;
const STD_NTSC: u64 = 0x0000_b000;
const STD_SECAM: u64 = 0x00ff_0000;

// struct v4l2_input
#[repr(C)]
struct V4l2Input {
    index: u32,
    name: [u8; 32],
    input_type: u32,
    audioset: u32,
    tuner: u32,
    std: u64,
    status: u32,
    capabilities: u32,
    reserved: [u32; 3],
}

// struct v4l2_tuner
#[repr(C)]
struct V4l2Tuner {
    index: u32,
    name: [u8; 32],
    tuner_type: u32,
    capability: u32,
    rangelow: u32,
    rangehigh: u32,
    rxsubchans: u32,
    audmode: u32,
    signal: u32,
    afc: i32,
    reserved: [u32; 4],
}

// struct v4l2_frequency
#[repr(C)]
struct V4l2Frequency {
    tuner: u32,
    frequency_type: u32,
    frequency: u32,
    reserved: [u32; 8],
}

fn xioctl<T>(fd: RawFd, request: c_ulong, arg: &mut T) -> io::Result<()> {
    loop {
        let rc = unsafe { libc::ioctl(fd, request, arg as *mut T as *mut c_void) };
        if rc == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::EINTR) {
            return Err(err);
        }
    }
}

fn cstr_field(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// An input source reported by the driver (camera, composite, tuner, ...).
#[derive(Debug, Clone)]
pub struct InputDesc {
    pub index: u32,
    pub name: String,
    pub is_tuner: bool,
    /// Tuner index for tuner inputs, meaningless otherwise.
    pub tuner: u32,
    /// Mask of supported video standards.
    pub standards: u64,
}

/// Enumerate all input sources of an open capture device.
pub fn enum_inputs(fd: RawFd) -> Vec<InputDesc> {
    let mut inputs = Vec::new();

    for index in 0..u32::MAX {
        let mut raw: V4l2Input = unsafe { mem::zeroed() };
        raw.index = index;
        if xioctl(fd, VIDIOC_ENUMINPUT, &mut raw).is_err() {
            break;
        }
        inputs.push(InputDesc {
            index,
            name: cstr_field(&raw.name),
            is_tuner: raw.input_type == INPUT_TYPE_TUNER,
            tuner: raw.tuner,
            standards: raw.std,
        });
    }

    inputs
}

pub fn current_input(fd: RawFd) -> io::Result<u32> {
    let mut index: i32 = 0;
    xioctl(fd, VIDIOC_G_INPUT, &mut index)?;
    Ok(index as u32)
}

pub fn select_input(fd: RawFd, index: u32) -> io::Result<()> {
    let mut index = index as i32;
    xioctl(fd, VIDIOC_S_INPUT, &mut index)
}

/// A video signal norm, backed by the V4L2 standard masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standard {
    Pal,
    Ntsc,
    Secam,
}

impl Standard {
    pub(crate) fn std_id(self) -> u64 {
        match self {
            Standard::Pal => STD_PAL,
            Standard::Ntsc => STD_NTSC,
            Standard::Secam => STD_SECAM,
        }
    }

    pub(crate) fn from_std_id(id: u64) -> Option<Self> {
        if id & STD_PAL != 0 {
            Some(Standard::Pal)
        } else if id & STD_NTSC != 0 {
            Some(Standard::Ntsc)
        } else if id & STD_SECAM != 0 {
            Some(Standard::Secam)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Standard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Standard::Pal => write!(f, "PAL"),
            Standard::Ntsc => write!(f, "NTSC"),
            Standard::Secam => write!(f, "SECAM"),
        }
    }
}

pub fn standard(fd: RawFd) -> io::Result<u64> {
    let mut id: u64 = 0;
    xioctl(fd, VIDIOC_G_STD, &mut id)?;
    Ok(id)
}

pub fn set_standard(fd: RawFd, id: u64) -> io::Result<()> {
    let mut id = id;
    xioctl(fd, VIDIOC_S_STD, &mut id)
}

/// Tuner state as reported by VIDIOC_G_TUNER.
#[derive(Debug, Clone)]
pub struct TunerDesc {
    pub name: String,
    /// Kernel tuner type (radio = 1, analog TV = 2); VIDIOC_S_FREQUENCY
    /// rejects requests whose type does not match.
    pub tuner_type: u32,
    /// Frequency unit is 62.5 Hz instead of 62.5 kHz.
    pub low_unit: bool,
    /// Tunable range in MHz.
    pub range_mhz: (f64, f64),
    /// Relative signal strength (0 = no signal).
    pub signal: u32,
}

fn unit_hz(low_unit: bool) -> f64 {
    if low_unit { 62.5 } else { 62_500.0 }
}

pub(crate) fn units_to_mhz(units: u32, low_unit: bool) -> f64 {
    units as f64 * unit_hz(low_unit) / 1_000_000.0
}

pub(crate) fn mhz_to_units(mhz: f64, low_unit: bool) -> u32 {
    (mhz * 1_000_000.0 / unit_hz(low_unit)).round() as u32
}

pub fn tuner(fd: RawFd, index: u32) -> io::Result<TunerDesc> {
    let mut raw: V4l2Tuner = unsafe { mem::zeroed() };
    raw.index = index;
    xioctl(fd, VIDIOC_G_TUNER, &mut raw)?;

    let low_unit = raw.capability & TUNER_CAP_LOW != 0;
    Ok(TunerDesc {
        name: cstr_field(&raw.name),
        tuner_type: raw.tuner_type,
        low_unit,
        range_mhz: (
            units_to_mhz(raw.rangelow, low_unit),
            units_to_mhz(raw.rangehigh, low_unit),
        ),
        signal: raw.signal,
    })
}

pub fn frequency_mhz(fd: RawFd, tuner: u32, low_unit: bool) -> io::Result<f64> {
    let mut raw: V4l2Frequency = unsafe { mem::zeroed() };
    raw.tuner = tuner;
    xioctl(fd, VIDIOC_G_FREQUENCY, &mut raw)?;
    Ok(units_to_mhz(raw.frequency, low_unit))
}

fn frequency_request(tuner: u32, tuner_type: u32, low_unit: bool, mhz: f64) -> V4l2Frequency {
    let mut raw: V4l2Frequency = unsafe { mem::zeroed() };
    raw.tuner = tuner;
    raw.frequency_type = tuner_type;
    raw.frequency = mhz_to_units(mhz, low_unit);
    raw
}

pub fn set_frequency_mhz(
    fd: RawFd,
    tuner: u32,
    tuner_type: u32,
    low_unit: bool,
    mhz: f64,
) -> io::Result<()> {
    let mut raw = frequency_request(tuner, tuner_type, low_unit, mhz);
    xioctl(fd, VIDIOC_S_FREQUENCY, &mut raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Known request codes from videodev2.h on 64-bit Linux
    #[test]
    fn request_codes_match_kernel_headers() {
        assert_eq!(VIDIOC_G_STD, 0x8008_5617);
        assert_eq!(VIDIOC_S_STD, 0x4008_5618);
        assert_eq!(VIDIOC_ENUMINPUT, 0xc050_561a);
        assert_eq!(VIDIOC_G_TUNER, 0xc054_561d);
        assert_eq!(VIDIOC_G_INPUT, 0x8004_5626);
        assert_eq!(VIDIOC_S_INPUT, 0xc004_5627);
        assert_eq!(VIDIOC_G_FREQUENCY, 0xc02c_5638);
        assert_eq!(VIDIOC_S_FREQUENCY, 0x402c_5639);
    }

    #[test]
    fn struct_sizes_match_kernel_abi() {
        assert_eq!(mem::size_of::<V4l2Input>(), 80);
        assert_eq!(mem::size_of::<V4l2Tuner>(), 84);
        assert_eq!(mem::size_of::<V4l2Frequency>(), 44);
    }

    #[test]
    fn cstr_field_stops_at_nul() {
        let mut name = [0u8; 32];
        name[..9].copy_from_slice(b"Composite");
        assert_eq!(cstr_field(&name), "Composite");
        assert_eq!(cstr_field(&[b'x'; 32]), "x".repeat(32));
    }

    #[test]
    fn standard_mapping() {
        assert_eq!(Standard::from_std_id(Standard::Pal.std_id()), Some(Standard::Pal));
        assert_eq!(Standard::from_std_id(Standard::Ntsc.std_id()), Some(Standard::Ntsc));
        assert_eq!(Standard::from_std_id(Standard::Secam.std_id()), Some(Standard::Secam));
        // single-norm bits still resolve (PAL-I)
        assert_eq!(Standard::from_std_id(0x10), Some(Standard::Pal));
        assert_eq!(Standard::from_std_id(0), None);
    }

    #[test]
    fn frequency_request_carries_tuner_type() {
        // radio tuner, CAP_LOW units
        let raw = frequency_request(0, 1, true, 101.1);
        assert_eq!(raw.frequency_type, 1);
        assert_eq!(raw.frequency, 1_617_600);

        // analog TV tuner, 62.5 kHz units
        let raw = frequency_request(1, 2, false, 182.25);
        assert_eq!(raw.tuner, 1);
        assert_eq!(raw.frequency_type, 2);
        assert_eq!(raw.frequency, 2916);
    }

    #[test]
    fn frequency_units() {
        // 182.25 MHz in 62.5 kHz steps (the usual TV tuner unit)
        assert_eq!(mhz_to_units(182.25, false), 2916);
        assert!((units_to_mhz(2916, false) - 182.25).abs() < 1e-9);

        // radio-style tuner with CAP_LOW set
        assert_eq!(mhz_to_units(101.1, true), 1_617_600);
        assert!((units_to_mhz(1_617_600, true) - 101.1).abs() < 1e-9);
    }
}
