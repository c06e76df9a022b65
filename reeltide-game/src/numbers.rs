//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Floor a f64 and clamp it to the u32 range. NaN maps to 0; infinities
/// clamp like any other out-of-range value, so `+inf` saturates to
/// `u32::MAX`.
#[must_use]
pub fn floor_f64_to_u32(value: f64) -> u32 {
    if value.is_nan() {
        return 0;
    }
    let max = cast::<u32, f64>(u32::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(0.0, max).floor();
    cast::<f64, u32>(clamped).unwrap_or(u32::MAX)
}

/// Floor a f64 and clamp it to the u64 range. NaN maps to 0; infinities
/// clamp like any other out-of-range value, so `+inf` saturates to
/// `u64::MAX`.
#[must_use]
pub fn floor_f64_to_u64(value: f64) -> u64 {
    if value.is_nan() {
        return 0;
    }
    let max = cast::<u64, f64>(u64::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(0.0, max).floor();
    cast::<f64, u64>(clamped).unwrap_or(u64::MAX)
}

/// Convert u64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn u64_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(0.0)
}
