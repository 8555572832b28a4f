use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::orbit::parsing::{catalog_field, split_tle, validate_line, TleLines};
use crate::orbit::OrbitError;

const MINUTES_PER_DAY: f64 = 1440.0;
/// Periods at or above this use the deep-space (SDP4) branch of the model.
pub const DEEP_SPACE_PERIOD_MINUTES: f64 = 225.0;

/// Classical orbital elements of one satellite, as parsed from its TLE.
///
/// Angles are stored in radians, mean motion in revolutions per day.
#[derive(Debug, Clone)]
pub struct OrbitalElementSet {
    pub name: Option<String>,
    pub catalog_number: u64,
    pub international_designator: Option<String>,
    pub epoch: DateTime<Utc>,
    pub inclination_rad: f64,
    pub right_ascension_rad: f64,
    pub eccentricity: f64,
    pub argument_of_perigee_rad: f64,
    pub mean_anomaly_rad: f64,
    pub mean_motion_rev_day: f64,
    pub mean_motion_dot: f64,
    pub mean_motion_ddot: f64,
    pub bstar: f64,
    pub(crate) elements: sgp4::Elements,
}

impl OrbitalElementSet {
    /// Parse a line-feed joined element set, with or without a name line.
    pub fn parse(text: &str) -> Result<Self, OrbitError> {
        Self::from_tle(&split_tle(text)?)
    }

    /// Parse the two element lines supplied separately.
    pub fn from_lines(line1: &str, line2: &str) -> Result<Self, OrbitError> {
        Self::from_named_lines(None, line1, line2)
    }

    pub fn from_tle(tle: &TleLines) -> Result<Self, OrbitError> {
        Self::from_named_lines(tle.name.clone(), &tle.line1, &tle.line2)
    }

    pub fn from_named_lines(
        name: Option<String>,
        line1: &str,
        line2: &str,
    ) -> Result<Self, OrbitError> {
        let line1 = line1.trim();
        let line2 = line2.trim();
        validate_line(line1, 1)?;
        validate_line(line2, 2)?;

        if catalog_field(line1) != catalog_field(line2) {
            return Err(OrbitError::malformed(format!(
                "catalog numbers differ between lines ({} / {})",
                catalog_field(line1),
                catalog_field(line2)
            )));
        }

        let name = name.filter(|n| !n.is_empty());
        let elements = sgp4::Elements::from_tle(name.clone(), line1.as_bytes(), line2.as_bytes())?;

        if !(0.0..1.0).contains(&elements.eccentricity) {
            return Err(OrbitError::malformed(format!(
                "eccentricity {} outside [0, 1)",
                elements.eccentricity
            )));
        }
        if !(elements.mean_motion > 0.0) {
            return Err(OrbitError::malformed(format!(
                "mean motion {} rev/day is not positive",
                elements.mean_motion
            )));
        }

        Ok(Self {
            name,
            catalog_number: elements.norad_id,
            international_designator: elements.international_designator.clone(),
            epoch: DateTime::from_naive_utc_and_offset(elements.datetime, Utc),
            inclination_rad: elements.inclination.to_radians(),
            right_ascension_rad: elements.right_ascension.to_radians(),
            eccentricity: elements.eccentricity,
            argument_of_perigee_rad: elements.argument_of_perigee.to_radians(),
            mean_anomaly_rad: elements.mean_anomaly.to_radians(),
            mean_motion_rev_day: elements.mean_motion,
            mean_motion_dot: elements.mean_motion_dot,
            mean_motion_ddot: elements.mean_motion_ddot,
            bstar: elements.drag_term,
            elements,
        })
    }

    pub fn period_minutes(&self) -> f64 {
        MINUTES_PER_DAY / self.mean_motion_rev_day
    }

    pub fn is_deep_space(&self) -> bool {
        self.period_minutes() >= DEEP_SPACE_PERIOD_MINUTES
    }

    /// Name from the element set, or "NORAD <n>" when the set had none.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("NORAD {}", self.catalog_number))
    }
}

impl FromStr for OrbitalElementSet {
    type Err = OrbitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
