//! Human-readable byte sizes.

use crate::InspectError;
use crate::Result;

const UNITS: [&str; 7] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

/// Formats a byte count with the largest binary unit that keeps the mantissa
/// at or above 1, with one decimal place.
///
/// # Examples
///
/// ```
/// use packinfo_core::hsize;
///
/// assert_eq!(hsize(0), "0.0 B");
/// assert_eq!(hsize(1024), "1.0 KiB");
/// assert_eq!(hsize(1_500_000), "1.4 MiB");
/// ```
#[must_use]
pub fn hsize(bytes: u64) -> String {
    let mut unit = 0;
    let mut scaled = bytes;
    while scaled >= 1024 && unit < UNITS.len() - 1 {
        scaled /= 1024;
        unit += 1;
    }

    let divisor = 1024_u64.pow(u32::try_from(unit).unwrap_or(0));
    let mut value = bytes as f64 / divisor as f64;
    // 1023.95 KiB would print as "1024.0 KiB".
    if (value * 10.0).round() >= 10240.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

/// Formats a signed byte count, rejecting negative values.
///
/// # Errors
///
/// Returns [`InspectError::NegativeSize`] if `bytes` is negative.
pub fn hsize_signed(bytes: i64) -> Result<String> {
    u64::try_from(bytes)
        .map(hsize)
        .map_err(|_| InspectError::NegativeSize(bytes))
}
