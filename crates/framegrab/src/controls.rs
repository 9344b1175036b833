//! Picture control lookup and value scaling.
//!
//! Drivers advertise an arbitrary integer range per control; callers work
//! in a 0.0..=1.0 fraction that is scaled linearly into that range.

use v4l::control::Description;

const CID_BASE: u32 = 0x0098_0900;

pub const CID_BRIGHTNESS: u32 = CID_BASE;
pub const CID_CONTRAST: u32 = CID_BASE + 1;
pub const CID_SATURATION: u32 = CID_BASE + 2;
pub const CID_HUE: u32 = CID_BASE + 3;
// V4L2_CID_WHITENESS is an alias of V4L2_CID_GAMMA
pub const CID_WHITENESS: u32 = CID_BASE + 16;

pub fn find_by_id(descs: &[Description], id: u32) -> Option<&Description> {
    descs.iter().find(|d| d.id == id)
}

pub fn find_by_name<'a>(descs: &'a [Description], name: &str) -> Option<&'a Description> {
    descs.iter().find(|d| d.name.eq_ignore_ascii_case(name))
}

/// Scale a 0.0..=1.0 fraction into the driver range.
///
/// Returns `None` for fractions outside the range or for degenerate
/// driver ranges (minimum == maximum).
pub fn scale_to_driver(fraction: f64, minimum: i64, maximum: i64) -> Option<i64> {
    if !(0.0..=1.0).contains(&fraction) || minimum >= maximum {
        return None;
    }
    let span = (maximum - minimum) as f64;
    Some(minimum + (fraction * span).round() as i64)
}

/// Resolve the driver value for a control write.
///
/// Negative fractions select the driver default, as does a degenerate
/// driver range (minimum == maximum). Fractions above 1.0 are refused.
pub fn write_value(fraction: f64, minimum: i64, maximum: i64, default: i64) -> Option<i64> {
    if fraction > 1.0 {
        return None;
    }
    if fraction < 0.0 || minimum >= maximum {
        return Some(default);
    }
    scale_to_driver(fraction, minimum, maximum)
}

/// Scale a driver value back into a 0.0..=1.0 fraction.
///
/// Degenerate ranges read as 0.0; out-of-range driver values clamp.
pub fn scale_from_driver(value: i64, minimum: i64, maximum: i64) -> f64 {
    if minimum >= maximum {
        return 0.0;
    }
    let fraction = (value - minimum) as f64 / (maximum - minimum) as f64;
    fraction.clamp(0.0, 1.0)
}

/// Map a percentage (0..=100) to a fraction.
pub fn percent_to_fraction(percent: u32) -> f64 {
    (percent.min(100)) as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_into_driver_range() {
        assert_eq!(scale_to_driver(0.0, 0, 255), Some(0));
        assert_eq!(scale_to_driver(1.0, 0, 255), Some(255));
        assert_eq!(scale_to_driver(0.5, 0, 255), Some(128));
        assert_eq!(scale_to_driver(0.5, -100, 100), Some(0));
    }

    #[test]
    fn rejects_out_of_range_fraction() {
        assert_eq!(scale_to_driver(1.01, 0, 255), None);
        assert_eq!(scale_to_driver(-0.5, 0, 255), None);
    }

    #[test]
    fn rejects_degenerate_range() {
        assert_eq!(scale_to_driver(0.5, 10, 10), None);
        assert_eq!(scale_from_driver(10, 10, 10), 0.0);
    }

    #[test]
    fn roundtrips_through_driver_units() {
        for percent in [0u32, 25, 50, 75, 100] {
            let fraction = percent_to_fraction(percent);
            let value = scale_to_driver(fraction, -32, 96).unwrap();
            let back = scale_from_driver(value, -32, 96);
            assert!((back - fraction).abs() < 0.01, "{percent}%: {fraction} vs {back}");
        }
    }

    #[test]
    fn write_value_scales_in_range() {
        assert_eq!(write_value(0.5, 0, 255, 7), Some(128));
    }

    #[test]
    fn write_value_uses_default_for_degenerate_range() {
        // a fixed-value control still accepts in-range writes
        assert_eq!(write_value(0.5, 10, 10, 10), Some(10));
        assert_eq!(write_value(0.0, 10, 10, 10), Some(10));
    }

    #[test]
    fn write_value_negative_means_default() {
        assert_eq!(write_value(-1.0, 0, 255, 128), Some(128));
    }

    #[test]
    fn write_value_refuses_above_one() {
        assert_eq!(write_value(1.01, 0, 255, 128), None);
        assert_eq!(write_value(2.0, 10, 10, 10), None);
    }

    #[test]
    fn clamps_stray_driver_values() {
        assert_eq!(scale_from_driver(300, 0, 255), 1.0);
        assert_eq!(scale_from_driver(-5, 0, 255), 0.0);
    }

    #[test]
    fn percent_saturates_at_100() {
        assert_eq!(percent_to_fraction(150), 1.0);
    }
}
