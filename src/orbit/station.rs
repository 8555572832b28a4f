use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::orbit::geodesy::geodetic_to_ecef;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct GroundStation {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: f64,
}

impl GroundStation {
    /// Parse `"lat, lon"` in degrees.
    pub fn from_coordinates(coordinates: &str, altitude_m: Option<f64>) -> Option<Self> {
        let parts: Vec<_> = coordinates.split(',').map(|s| s.trim()).collect();
        if parts.len() != 2 {
            return None;
        }
        let latitude_deg: f64 = parts[0].parse().ok()?;
        let longitude_deg: f64 = parts[1].parse().ok()?;
        if !(-90.0..=90.0).contains(&latitude_deg) || !(-180.0..=180.0).contains(&longitude_deg) {
            return None;
        }
        Some(Self {
            latitude_deg,
            longitude_deg,
            altitude_m: altitude_m.unwrap_or(0.0),
        })
    }

    pub fn lat_rad(&self) -> f64 {
        self.latitude_deg.to_radians()
    }

    pub fn lon_rad(&self) -> f64 {
        self.longitude_deg.to_radians()
    }

    pub fn position_ecef_km(&self) -> [f64; 3] {
        geodetic_to_ecef(self.latitude_deg, self.longitude_deg, self.altitude_m / 1000.0)
    }
}
