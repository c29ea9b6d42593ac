//! # Distance Evaluator
//!
//! Great-circle distance between two coordinates and radius containment.
//!
//! ## Where It Is Used
//! ```text
//! Supplier (lat, lon, location_radius)      Employee phone (lat, lon)
//!          │                                          │
//!          └──────────────► within_radius ◄───────────┘
//!                                 │
//!                   true ─► continue initiation
//!                   false ─► Forbidden (distance vs radius reported)
//! ```
//!
//! The haversine formula on a spherical Earth is accurate to well under a
//! metre at the few-hundred-metre radii suppliers use.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Mean Earth radius in metres (IUGG).
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Slack applied to the radius comparison so that a point computed to lie
/// exactly on the boundary is not rejected by floating-point noise.
pub const RADIUS_TOLERANCE_METERS: f64 = 1e-6;

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a point from decimal degrees.
    #[inline]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        GeoPoint {
            latitude,
            longitude,
        }
    }

    /// Checks that both components are finite and inside their ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Distance to another point in metres.
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        distance(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}

/// Great-circle distance in metres between two coordinates.
///
/// ## Example
/// ```rust
/// use mealticket_core::geo::distance;
///
/// assert_eq!(distance(9.03, 38.74, 9.03, 38.74), 0.0);
/// // One degree of latitude is ~111.2 km
/// let d = distance(0.0, 0.0, 1.0, 0.0);
/// assert!((d - 111_194.9).abs() < 1.0);
/// ```
pub fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_METERS * c
}

/// Whether `(point_lat, point_lon)` lies within `radius_meters` of the
/// supplier. The boundary itself counts as inside.
pub fn within_radius(
    supplier_lat: f64,
    supplier_lon: f64,
    point_lat: f64,
    point_lon: f64,
    radius_meters: f64,
) -> bool {
    distance(supplier_lat, supplier_lon, point_lat, point_lon)
        <= radius_meters + RADIUS_TOLERANCE_METERS
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Latitude offset (degrees) that moves a point `meters` due north.
    fn north_offset(meters: f64) -> f64 {
        (meters / EARTH_RADIUS_METERS).to_degrees()
    }

    #[test]
    fn test_zero_distance() {
        assert_eq!(distance(9.0054, 38.7636, 9.0054, 38.7636), 0.0);
    }

    #[test]
    fn test_symmetric() {
        let a = distance(9.0054, 38.7636, 9.0107, 38.7612);
        let b = distance(9.0107, 38.7612, 9.0054, 38.7636);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn test_known_distance() {
        // Addis Ababa (Meskel Square) to Bole airport: roughly 5.9 km
        let d = distance(9.0105, 38.7613, 8.9779, 38.7993);
        assert!(d > 5_000.0 && d < 6_500.0, "got {d}");
    }

    #[test]
    fn test_boundary_is_inside() {
        let lat = 9.0054;
        let lon = 38.7636;
        let radius = 100.0;

        let on_edge = lat + north_offset(radius);
        assert!(within_radius(lat, lon, on_edge, lon, radius));

        let just_out = lat + north_offset(radius + 1.0);
        assert!(!within_radius(lat, lon, just_out, lon, radius));
    }

    #[test]
    fn test_origin_is_a_real_coordinate() {
        let gulf_of_guinea = GeoPoint::new(0.0, 0.0);
        let nearby = GeoPoint::new(0.0, north_offset(50.0));
        assert!(gulf_of_guinea.distance_to(&nearby) < 51.0);
        assert!(gulf_of_guinea.is_valid());
    }

    #[test]
    fn test_point_validity() {
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, 181.0).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }
}
