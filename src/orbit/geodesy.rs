use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::orbit::OrbitError;

// WGS-84 ellipsoid
pub const WGS84_A_KM: f64 = 6378.137;
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;
pub const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);

/// Equatorial radius used as the re-entry threshold.
pub const EARTH_RADIUS_KM: f64 = WGS84_A_KM;
pub const EARTH_ROTATION_RAD_S: f64 = 7.292_115e-5;

const TWO_PI: f64 = 2.0 * std::f64::consts::PI;

const LATITUDE_TOLERANCE_RAD: f64 = 1e-12;
const MAX_LATITUDE_ITERATIONS: usize = 20;

/// A point above the WGS-84 ellipsoid.
///
/// Longitude is always in `[-180, 180)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeodeticSample {
    #[serde(rename = "lat")]
    pub latitude_deg: f64,
    #[serde(rename = "lng")]
    pub longitude_deg: f64,
    #[serde(rename = "alt")]
    pub altitude_km: f64,
}

/// Greenwich mean sidereal time (IAU-82) in radians, `[0, 2π)`.
pub fn gmst(instant: DateTime<Utc>) -> f64 {
    sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&instant.naive_utc()))
        .rem_euclid(TWO_PI)
}

pub fn teme_to_ecef(pos_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let (sin_gmst, cos_gmst) = gmst.sin_cos();
    [
        pos_teme[0] * cos_gmst + pos_teme[1] * sin_gmst,
        -pos_teme[0] * sin_gmst + pos_teme[1] * cos_gmst,
        pos_teme[2],
    ]
}

pub fn teme_to_ecef_velocity(pos_teme: [f64; 3], vel_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let pos = teme_to_ecef(pos_teme, gmst);
    let rotated = teme_to_ecef(vel_teme, gmst);
    [
        rotated[0] + EARTH_ROTATION_RAD_S * pos[1],
        rotated[1] - EARTH_ROTATION_RAD_S * pos[0],
        rotated[2],
    ]
}

/// Earth-fixed position (km) to geodetic coordinates on the WGS-84 ellipsoid.
pub fn ecef_to_geodetic(ecef: [f64; 3]) -> Result<GeodeticSample, OrbitError> {
    if ecef.iter().any(|c| !c.is_finite()) {
        return Err(OrbitError::InvalidPositionVector(ecef));
    }

    let [x, y, z] = ecef;
    let r = x.hypot(y);

    let mut latitude = z.atan2(r);
    for _ in 0..MAX_LATITUDE_ITERATIONS {
        let sin_lat = latitude.sin();
        let c = 1.0 / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        let next = (z + WGS84_A_KM * c * WGS84_E2 * sin_lat).atan2(r);
        let converged = (next - latitude).abs() < LATITUDE_TOLERANCE_RAD;
        latitude = next;
        if converged {
            break;
        }
    }

    let (sin_lat, cos_lat) = latitude.sin_cos();
    let radicand = 1.0 - WGS84_E2 * sin_lat * sin_lat;
    // Stays finite at the poles, unlike r / cos(lat) - N.
    let altitude = r * cos_lat + z * sin_lat - WGS84_A_KM * radicand.sqrt();

    Ok(GeodeticSample {
        latitude_deg: latitude.to_degrees(),
        longitude_deg: normalize_longitude(y.atan2(x).to_degrees()),
        altitude_km: altitude,
    })
}

pub fn geodetic_to_ecef(latitude_deg: f64, longitude_deg: f64, altitude_km: f64) -> [f64; 3] {
    let (sin_lat, cos_lat) = latitude_deg.to_radians().sin_cos();
    let (sin_lon, cos_lon) = longitude_deg.to_radians().sin_cos();
    let n = WGS84_A_KM / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    [
        (n + altitude_km) * cos_lat * cos_lon,
        (n + altitude_km) * cos_lat * sin_lon,
        (n * (1.0 - WGS84_E2) + altitude_km) * sin_lat,
    ]
}

/// Wrap a longitude into `[-180, 180)`.
pub fn normalize_longitude(longitude_deg: f64) -> f64 {
    let wrapped = (longitude_deg + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid may round up to exactly 360 for tiny negative inputs
    if wrapped >= 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Inertial (TEME) position at `instant` to geodetic coordinates.
pub fn teme_to_geodetic(
    pos_teme: [f64; 3],
    instant: DateTime<Utc>,
) -> Result<GeodeticSample, OrbitError> {
    if pos_teme.iter().any(|c| !c.is_finite()) {
        return Err(OrbitError::InvalidPositionVector(pos_teme));
    }
    ecef_to_geodetic(teme_to_ecef(pos_teme, gmst(instant)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "{actual} differs from {expected} by more than {tolerance}"
        );
    }

    #[test]
    fn sidereal_time_of_reference_instant() {
        let date = Utc.with_ymd_and_hms(1995, 10, 1, 9, 0, 0).unwrap();
        assert_close(gmst(date), 2.524_218, 1e-6);

        let date = Utc.with_ymd_and_hms(2025, 8, 25, 6, 0, 0).unwrap();
        assert_close(gmst(date), 1.112_800, 1e-6);
    }

    #[test]
    fn sidereal_time_stays_in_one_turn() {
        for year in [1960, 1995, 2025, 2049] {
            let date = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap();
            let theta = gmst(date);
            assert!((0.0..TWO_PI).contains(&theta), "{year}: {theta}");
        }
    }

    #[test]
    fn sidereal_rotation_moves_x_axis() {
        let ecef = teme_to_ecef([1.0, 0.0, 0.0], std::f64::consts::FRAC_PI_2);
        assert_close(ecef[0], 0.0, 1e-12);
        assert_close(ecef[1], -1.0, 1e-12);
        assert_close(ecef[2], 0.0, 1e-12);
    }

    #[test]
    fn equator_point() {
        let geo = ecef_to_geodetic([WGS84_A_KM + 500.0, 0.0, 0.0]).unwrap();
        assert_close(geo.latitude_deg, 0.0, 1e-9);
        assert_close(geo.longitude_deg, 0.0, 1e-9);
        assert_close(geo.altitude_km, 500.0, 1e-6);
    }

    #[test]
    fn poles_use_polar_radius() {
        let polar_radius = WGS84_A_KM * (1.0 - WGS84_F);

        let north = ecef_to_geodetic([0.0, 0.0, polar_radius + 100.0]).unwrap();
        assert_close(north.latitude_deg, 90.0, 1e-9);
        assert_close(north.altitude_km, 100.0, 1e-6);

        let south = ecef_to_geodetic([0.0, 0.0, -(polar_radius + 100.0)]).unwrap();
        assert_close(south.latitude_deg, -90.0, 1e-9);
        assert_close(south.altitude_km, 100.0, 1e-6);
    }

    #[test]
    fn mid_latitude_point_survives_conversion() {
        let ecef = geodetic_to_ecef(45.0, -75.0, 400.0);
        let geo = ecef_to_geodetic(ecef).unwrap();
        assert_close(geo.latitude_deg, 45.0, 1e-9);
        assert_close(geo.longitude_deg, -75.0, 1e-9);
        assert_close(geo.altitude_km, 400.0, 1e-6);
    }

    #[test]
    fn station_ecef_matches_reference() {
        let ecef = geodetic_to_ecef(1.29, 103.77, 0.0);
        assert_close(ecef[0], -1517.773_48, 1e-4);
        assert_close(ecef[1], 6193.263_69, 1e-4);
        assert_close(ecef[2], 142.629_01, 1e-4);
    }

    #[test]
    fn longitude_wraps_to_half_open_range() {
        assert_eq!(normalize_longitude(180.0), -180.0);
        assert_eq!(normalize_longitude(-180.0), -180.0);
        assert_eq!(normalize_longitude(540.0), -180.0);
        assert_close(normalize_longitude(359.99), -0.01, 1e-9);
        assert_close(normalize_longitude(-190.0), 170.0, 1e-9);
        let tiny = normalize_longitude(-1e-20);
        assert!((-180.0..180.0).contains(&tiny));
    }

    #[test]
    fn rejects_non_finite_position() {
        let instant = Utc.with_ymd_and_hms(2025, 8, 25, 6, 0, 0).unwrap();
        let err = teme_to_geodetic([f64::NAN, 0.0, 7000.0], instant).unwrap_err();
        assert!(matches!(err, OrbitError::InvalidPositionVector(_)));
        assert!(err.is_divergence());

        let err = ecef_to_geodetic([0.0, f64::INFINITY, 0.0]).unwrap_err();
        assert!(matches!(err, OrbitError::InvalidPositionVector(_)));
    }
}
