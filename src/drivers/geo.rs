//! Great-circle distance between GPS positions.
//!
//! `f64` throughout: at six decimal places an `f32` latitude already carries
//! ~0.5 m of quantisation, the same order as the odometer's dither bound.

/// Mean Earth radius (m)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GeoPoint {
    pub lat: f64, // Decimal Degrees
    pub lon: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Haversine distance in metres.
pub fn haversine_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let sin_dlat = libm::sin(d_lat / 2.0);
    let sin_dlon = libm::sin(d_lon / 2.0);
    let h = sin_dlat * sin_dlat + libm::cos(lat1) * libm::cos(lat2) * sin_dlon * sin_dlon;
    // Rounding can push h a hair past 1 for antipodal points
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_M * libm::atan2(libm::sqrt(h), libm::sqrt(1.0 - h))
}

/// Point `distance_m` due north of `origin` (same meridian).
#[cfg(test)]
pub fn offset_north(origin: GeoPoint, distance_m: f64) -> GeoPoint {
    let d_lat = (distance_m / EARTH_RADIUS_M).to_degrees();
    GeoPoint::new(origin.lat + d_lat, origin.lon)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let d = haversine_m(GeoPoint::new(45.0, 9.0), GeoPoint::new(46.0, 9.0));
        assert!((d - 111_195.0).abs() < 50.0, "d = {d}");
    }

    #[test]
    fn identical_points_are_zero_apart() {
        let p = GeoPoint::new(45.464_211, 9.191_383);
        assert_eq!(haversine_m(p, p), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = GeoPoint::new(45.464_211, 9.191_383);
        let b = GeoPoint::new(45.465_100, 9.190_010);
        assert!((haversine_m(a, b) - haversine_m(b, a)).abs() < 1e-9);
    }

    #[test]
    fn offset_north_round_trips_through_haversine() {
        let origin = GeoPoint::new(45.464_211, 9.191_383);
        for d in [1.0, 50.0, 150.0] {
            let p = offset_north(origin, d);
            assert!((haversine_m(origin, p) - d).abs() < 1e-6 * d.max(1.0));
        }
    }

    #[test]
    fn east_west_distance_shrinks_with_latitude() {
        let equator = haversine_m(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.001));
        let north = haversine_m(GeoPoint::new(60.0, 0.0), GeoPoint::new(60.0, 0.001));
        assert!((north / equator - 0.5).abs() < 1e-3);
    }
}
