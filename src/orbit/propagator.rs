use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::orbit::geodesy::EARTH_RADIUS_KM;
use crate::orbit::{OrbitError, OrbitalElementSet};

/// TEME position and velocity of a satellite at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PropagatedState {
    pub instant: DateTime<Utc>,
    pub position_km: [f64; 3],
    pub velocity_km_s: [f64; 3],
}

impl PropagatedState {
    pub fn radius_km(&self) -> f64 {
        norm(self.position_km)
    }

    pub fn is_finite(&self) -> bool {
        self.position_km
            .iter()
            .chain(self.velocity_km_s.iter())
            .all(|c| c.is_finite())
    }
}

/// Anything that can report a satellite's inertial state at an instant.
pub trait Ephemeris {
    fn state_at(&self, instant: DateTime<Utc>) -> Result<PropagatedState, OrbitError>;
}

/// SGP4/SDP4 propagator for one element set.
///
/// The deep-space branch is chosen by the model itself from the mean motion.
#[derive(Debug, Clone)]
pub struct Propagator {
    epoch: DateTime<Utc>,
    elements: sgp4::Elements,
    constants: sgp4::Constants,
}

impl Propagator {
    pub fn new(elements: &OrbitalElementSet) -> Result<Self, OrbitError> {
        let constants = sgp4::Constants::from_elements(&elements.elements)?;
        Ok(Self {
            epoch: elements.epoch,
            elements: elements.elements.clone(),
            constants,
        })
    }

    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    /// Minutes from the element epoch to `instant`, negative before it.
    pub fn minutes_since_epoch(&self, instant: DateTime<Utc>) -> Result<f64, OrbitError> {
        self.elements
            .datetime_to_minutes_since_epoch(&instant.naive_utc())
            .map(|minutes| minutes.0)
            .map_err(|e| OrbitError::PropagationDivergence {
                minutes: (instant - self.epoch).num_seconds() as f64 / 60.0,
                reason: e.to_string(),
            })
    }
}

impl Ephemeris for Propagator {
    fn state_at(&self, instant: DateTime<Utc>) -> Result<PropagatedState, OrbitError> {
        let minutes = self.minutes_since_epoch(instant)?;

        let prediction = self
            .constants
            .propagate(sgp4::MinutesSinceEpoch(minutes))
            .map_err(|e| OrbitError::PropagationDivergence {
                minutes,
                reason: e.to_string(),
            })?;

        let state = PropagatedState {
            instant,
            position_km: prediction.position,
            velocity_km_s: prediction.velocity,
        };

        if !state.is_finite() {
            return Err(OrbitError::InvalidPositionVector(state.position_km));
        }

        let radius = state.radius_km();
        if radius < EARTH_RADIUS_KM {
            return Err(OrbitError::PropagationDivergence {
                minutes,
                reason: format!("satellite has decayed, radius {radius:.1} km"),
            });
        }

        Ok(state)
    }
}

fn norm(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}
