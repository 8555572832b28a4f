use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::orbit::geodesy::{gmst, teme_to_ecef, teme_to_ecef_velocity};
use crate::orbit::propagator::Ephemeris;
use crate::orbit::station::GroundStation;
use crate::orbit::OrbitError;

pub const SPEED_OF_LIGHT_KM_S: f64 = 299_792.458;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrequencyPlan {
    pub uplink_hz: Option<f64>,
    pub downlink_hz: Option<f64>,
}

/// Pointing solution from a ground station to a satellite.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LookSample {
    pub timestamp: DateTime<Utc>,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub range_km: f64,
    pub range_rate_km_s: f64,
    pub doppler_uplink_hz: Option<f64>,
    pub doppler_downlink_hz: Option<f64>,
}

impl LookSample {
    pub fn is_visible(&self) -> bool {
        self.elevation_deg >= 0.0
    }
}

pub fn look_at<E: Ephemeris + ?Sized>(
    station: &GroundStation,
    ephemeris: &E,
    timestamp: DateTime<Utc>,
    frequencies: &FrequencyPlan,
) -> Result<LookSample, OrbitError> {
    let state = ephemeris.state_at(timestamp)?;
    let sidereal = gmst(timestamp);

    let sat_ecef = teme_to_ecef(state.position_km, sidereal);
    let sat_vel_ecef = teme_to_ecef_velocity(state.position_km, state.velocity_km_s, sidereal);

    let sta_ecef = station.position_ecef_km();

    let dr = [
        sat_ecef[0] - sta_ecef[0],
        sat_ecef[1] - sta_ecef[1],
        sat_ecef[2] - sta_ecef[2],
    ];
    let range_km = (dr[0] * dr[0] + dr[1] * dr[1] + dr[2] * dr[2]).sqrt();
    if !range_km.is_finite() {
        return Err(OrbitError::InvalidPositionVector(state.position_km));
    }

    let (east, north, up) = ecef_to_enu(dr, station.lat_rad(), station.lon_rad());
    let azimuth = east.atan2(north).to_degrees().rem_euclid(360.0);
    let elevation = if range_km > 0.0 {
        (up / range_km).asin().to_degrees()
    } else {
        90.0
    };

    let los_unit = if range_km > 0.0 {
        [dr[0] / range_km, dr[1] / range_km, dr[2] / range_km]
    } else {
        [0.0, 0.0, 0.0]
    };
    // The station is at rest in the Earth-fixed frame.
    let range_rate_km_s = sat_vel_ecef[0] * los_unit[0]
        + sat_vel_ecef[1] * los_unit[1]
        + sat_vel_ecef[2] * los_unit[2];

    Ok(LookSample {
        timestamp,
        azimuth_deg: round2(azimuth).rem_euclid(360.0),
        elevation_deg: round2(elevation),
        range_km: round2(range_km),
        range_rate_km_s: round3(range_rate_km_s),
        doppler_uplink_hz: frequencies
            .uplink_hz
            .map(|f| apply_uplink_doppler(f, range_rate_km_s)),
        doppler_downlink_hz: frequencies
            .downlink_hz
            .map(|f| apply_downlink_doppler(f, range_rate_km_s)),
    })
}

/// Frequency heard on the ground for a satellite transmitting at `freq_hz`.
pub fn apply_downlink_doppler(freq_hz: f64, range_rate_km_s: f64) -> f64 {
    freq_hz * (1.0 - range_rate_km_s / SPEED_OF_LIGHT_KM_S)
}

/// Frequency to transmit so the satellite receives `freq_hz`.
pub fn apply_uplink_doppler(freq_hz: f64, range_rate_km_s: f64) -> f64 {
    freq_hz * (1.0 + range_rate_km_s / SPEED_OF_LIGHT_KM_S)
}

pub fn ecef_to_enu(dr: [f64; 3], lat_rad: f64, lon_rad: f64) -> (f64, f64, f64) {
    let (sin_lat, cos_lat) = lat_rad.sin_cos();
    let (sin_lon, cos_lon) = lon_rad.sin_cos();

    let east = -sin_lon * dr[0] + cos_lon * dr[1];
    let north = -sin_lat * cos_lon * dr[0] - sin_lat * sin_lon * dr[1] + cos_lat * dr[2];
    let up = cos_lat * cos_lon * dr[0] + cos_lat * sin_lon * dr[1] + sin_lat * dr[2];
    (east, north, up)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orbit::fixtures::*;
    use crate::orbit::geodesy::{geodetic_to_ecef, EARTH_ROTATION_RAD_S, WGS84_A_KM};
    use crate::orbit::propagator::{PropagatedState, Propagator};
    use crate::orbit::OrbitalElementSet;
    use chrono::{Duration, TimeZone};

    /// Satellite held at a fixed Earth-fixed position.
    struct Fixed([f64; 3]);

    impl Ephemeris for Fixed {
        fn state_at(&self, instant: DateTime<Utc>) -> Result<PropagatedState, OrbitError> {
            let (sin_g, cos_g) = gmst(instant).sin_cos();
            let [x, y, z] = self.0;
            let teme = [x * cos_g - y * sin_g, x * sin_g + y * cos_g, z];
            Ok(PropagatedState {
                instant,
                position_km: teme,
                // co-rotating with the Earth
                velocity_km_s: [
                    -EARTH_ROTATION_RAD_S * teme[1],
                    EARTH_ROTATION_RAD_S * teme[0],
                    0.0,
                ],
            })
        }
    }

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 25, 6, 0, 0).unwrap()
    }

    #[test]
    fn overhead_satellite_is_at_zenith() {
        let station = GroundStation::default();
        let look = look_at(
            &station,
            &Fixed([WGS84_A_KM + 500.0, 0.0, 0.0]),
            instant(),
            &FrequencyPlan::default(),
        )
        .unwrap();
        assert!((look.elevation_deg - 90.0).abs() < 0.01);
        assert!((look.range_km - 500.0).abs() < 0.01);
        assert!(look.is_visible());
        assert_eq!(look.doppler_downlink_hz, None);
    }

    #[test]
    fn northern_horizon() {
        let station = GroundStation::default();
        let look = look_at(
            &station,
            &Fixed([WGS84_A_KM, 0.0, 1000.0]),
            instant(),
            &FrequencyPlan::default(),
        )
        .unwrap();
        assert!(look.azimuth_deg.abs() < 0.01 || (look.azimuth_deg - 360.0).abs() < 0.01);
        assert!(look.elevation_deg.abs() < 0.01);
        assert!((look.range_km - 1000.0).abs() < 0.01);
    }

    #[test]
    fn eastern_target_from_station() {
        let station = GroundStation::from_coordinates("1.29, 103.77", None).unwrap();
        let look = look_at(
            &station,
            &Fixed(geodetic_to_ecef(1.29, 110.0, 800.0)),
            instant(),
            &FrequencyPlan::default(),
        )
        .unwrap();
        assert!((80.0..100.0).contains(&look.azimuth_deg), "{look:?}");
        assert!(look.elevation_deg > 0.0);
    }

    #[test]
    fn earth_fixed_target_has_no_doppler() {
        let station = GroundStation::default();
        let plan = FrequencyPlan {
            uplink_hz: Some(145.8e6),
            downlink_hz: Some(437.5e6),
        };
        let look = look_at(&station, &Fixed([WGS84_A_KM + 500.0, 0.0, 0.0]), instant(), &plan)
            .unwrap();
        assert!(look.range_rate_km_s.abs() < 1e-3);
        assert!((look.doppler_downlink_hz.unwrap() - 437.5e6).abs() < 1.0);
        assert!((look.doppler_uplink_hz.unwrap() - 145.8e6).abs() < 1.0);
    }

    #[test]
    fn doppler_direction() {
        // Receding satellite is heard lower and must be sent higher.
        assert!(apply_downlink_doppler(437.5e6, 5.0) < 437.5e6);
        assert!(apply_uplink_doppler(145.8e6, 5.0) > 145.8e6);
    }

    #[test]
    fn real_pass_geometry_is_bounded() {
        let set = OrbitalElementSet::from_lines(ISS_LINE1, ISS_LINE2).unwrap();
        let propagator = Propagator::new(&set).unwrap();
        let station = GroundStation::from_coordinates("1.29, 103.77", None).unwrap();
        for minute in (0..95).step_by(5) {
            let look = look_at(
                &station,
                &propagator,
                set.epoch + Duration::minutes(minute),
                &FrequencyPlan::default(),
            )
            .unwrap();
            assert!((0.0..360.0).contains(&look.azimuth_deg));
            assert!((-90.0..=90.0).contains(&look.elevation_deg));
            assert!(look.range_rate_km_s.abs() < 8.0);
        }
    }
}
