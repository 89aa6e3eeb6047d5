//! Geographic validation for the North Dakota jurisdiction.

/// North Dakota bounding box, inclusive on all edges.
pub const ND_LAT_MIN: f64 = 45.93;
pub const ND_LAT_MAX: f64 = 49.00;
pub const ND_LON_MIN: f64 = -104.05;
pub const ND_LON_MAX: f64 = -96.55;

/// Whether a coordinate pair falls inside the North Dakota bounding box.
/// Edge values count as inside.
pub fn within_north_dakota(latitude: f64, longitude: f64) -> bool {
    (ND_LAT_MIN..=ND_LAT_MAX).contains(&latitude)
        && (ND_LON_MIN..=ND_LON_MAX).contains(&longitude)
}

/// Convert degrees/minutes/seconds to decimal degrees.
/// Southern and western hemispheres negate the result.
pub fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64, hemisphere: char) -> f64 {
    let decimal = degrees + minutes / 60.0 + seconds / 3600.0;
    match hemisphere.to_ascii_uppercase() {
        'S' | 'W' => -decimal,
        _ => decimal,
    }
}
