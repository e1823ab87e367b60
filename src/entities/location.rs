use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Great-circle distance between two coordinates, in kilometers.
pub fn distance_km(a: &Coordinates, b: &Coordinates) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_between_identical_points() {
        let p = Coordinates::new(37.7749, -122.4194);
        assert_eq!(distance_km(&p, &p), 0.0);
    }

    #[test]
    fn san_francisco_to_los_angeles() {
        let sf = Coordinates::new(37.7749, -122.4194);
        let la = Coordinates::new(34.0522, -118.2437);

        let d = distance_km(&sf, &la);
        assert!(d > 540.0 && d < 570.0, "unexpected distance: {}", d);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Coordinates::new(51.5074, -0.1278);
        let b = Coordinates::new(48.8566, 2.3522);

        let ab = distance_km(&a, &b);
        let ba = distance_km(&b, &a);
        assert!((ab - ba).abs() < 1e-9);
    }
}
