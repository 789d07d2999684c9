//! Unit conversions shared by the simulation and whoever draws it

/// Convert meters per second to kilometers per hour
pub fn mps_to_kph(mps: f64) -> f64 {
    mps * 3.6
}

/// Convert kilometers per hour to meters per second
pub fn kph_to_mps(kph: f64) -> f64 {
    kph / 3.6
}

/// Convert meters to pixels for a px/m `scale`, rounded to the nearest pixel
///
/// Halfway values round up towards positive infinity, on both sides of zero.
pub fn meters_to_pixels(scale: f64, m: f64) -> i64 {
    (m * scale + 0.5).floor() as i64
}

/// Convert pixels to meters for a px/m `scale`
pub fn pixels_to_meters(scale: f64, px: i64) -> f64 {
    px as f64 / scale
}
