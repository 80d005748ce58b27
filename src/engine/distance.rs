//! Metric radius to angular radius conversion
//!
//! Clustering runs on raw (longitude, latitude) pairs, so a radius in meters
//! has to be expressed in degrees first. The conversion uses the length of one
//! degree of latitude at a reference latitude and applies it to both axes.
//! Away from the reference latitude the result is an approximation.

/// Default reference latitude, in degrees north
pub const DEFAULT_REFERENCE_LATITUDE: f64 = 40.0;

/// Meters in one degree of latitude at the given latitude (WGS84 series expansion)
pub fn meters_per_degree(reference_latitude: f64) -> f64 {
    let phi = reference_latitude.to_radians();

    111_132.92 - 559.82 * (2.0 * phi).cos() + 1.175 * (4.0 * phi).cos()
        - 0.0023 * (6.0 * phi).cos()
}

/// Angular radius in degrees equivalent to `meters` at the reference latitude
pub fn to_angular_radius(meters: f64, reference_latitude: f64) -> f64 {
    meters / meters_per_degree(reference_latitude)
}
