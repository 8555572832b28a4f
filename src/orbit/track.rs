use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::orbit::geodesy::{normalize_longitude, teme_to_geodetic, GeodeticSample};
use crate::orbit::propagator::{Ephemeris, Propagator};
use crate::orbit::{OrbitError, OrbitalElementSet};

/// Minutes covered by a default track, about one low-Earth-orbit period.
pub const TRACK_MINUTES: u32 = 95;
pub const STEP: Duration = Duration::minutes(1);

/// Ground track sampled once per minute from a reference instant.
///
/// Slot `i` holds the sub-satellite point at `reference + i minutes`, or
/// `None` when the model diverged for that minute. The number of slots never
/// depends on how many minutes failed.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OrbitTrack {
    reference: DateTime<Utc>,
    samples: Vec<Option<GeodeticSample>>,
}

impl OrbitTrack {
    pub fn reference(&self) -> DateTime<Utc> {
        self.reference
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Option<GeodeticSample>] {
        &self.samples
    }

    pub fn sample_at(&self, index: usize) -> Result<GeodeticSample, OrbitError> {
        match self.samples.get(index) {
            Some(Some(sample)) => Ok(*sample),
            Some(None) => Err(OrbitError::MissingSample { index }),
            None => Err(OrbitError::IndexOutOfRange {
                index,
                len: self.samples.len(),
            }),
        }
    }

    pub fn timestamp_at(&self, index: usize) -> Result<DateTime<Utc>, OrbitError> {
        if index >= self.samples.len() {
            return Err(OrbitError::IndexOutOfRange {
                index,
                len: self.samples.len(),
            });
        }
        Ok(self.reference + STEP * index as i32)
    }

    /// Indices of the minutes that could not be propagated.
    pub fn gaps(&self) -> Vec<usize> {
        self.samples
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_none())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.samples.iter().all(Option::is_some)
    }

    /// Runs of consecutive samples between gaps, for drawing the path.
    pub fn segments(&self) -> Vec<Vec<GeodeticSample>> {
        self.samples
            .split(Option::is_none)
            .filter(|run| !run.is_empty())
            .map(|run| run.iter().flatten().copied().collect())
            .collect()
    }
}

/// Sample `ephemeris` at `minutes + 1` one-minute steps starting at `reference`.
pub fn sample_track<E: Ephemeris + ?Sized>(
    ephemeris: &E,
    reference: DateTime<Utc>,
    minutes: u32,
) -> OrbitTrack {
    let samples = (0..=minutes)
        .map(|minute| {
            let instant = reference + STEP * minute as i32;
            let sample = ephemeris
                .state_at(instant)
                .and_then(|state| teme_to_geodetic(state.position_km, instant));
            match sample {
                Ok(sample) => Some(quantize(sample)),
                Err(e) => {
                    log::debug!("No track sample at minute {}: {}", minute, e);
                    None
                }
            }
        })
        .collect();

    OrbitTrack { reference, samples }
}

/// Propagate an element set into a track. Fails only if the model cannot be
/// initialised for the elements.
pub fn generate_track(
    elements: &OrbitalElementSet,
    reference: DateTime<Utc>,
    minutes: u32,
) -> Result<OrbitTrack, OrbitError> {
    let propagator = Propagator::new(elements)?;
    Ok(sample_track(&propagator, reference, minutes))
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TrackedSatellite {
    pub name: String,
    pub catalog_number: u64,
    pub last_update: DateTime<Utc>,
    pub track: OrbitTrack,
}

impl TrackedSatellite {
    pub fn generate(
        elements: &OrbitalElementSet,
        reference: DateTime<Utc>,
        minutes: u32,
    ) -> Result<Self, OrbitError> {
        let track = generate_track(elements, reference, minutes)?;
        Ok(Self::with_track(
            elements.display_name(),
            elements.catalog_number,
            reference,
            track,
        ))
    }

    /// Track an already initialised propagator.
    pub fn from_ephemeris<E: Ephemeris + ?Sized>(
        name: String,
        catalog_number: u64,
        ephemeris: &E,
        reference: DateTime<Utc>,
        minutes: u32,
    ) -> Self {
        let track = sample_track(ephemeris, reference, minutes);
        Self::with_track(name, catalog_number, reference, track)
    }

    fn with_track(
        name: String,
        catalog_number: u64,
        reference: DateTime<Utc>,
        track: OrbitTrack,
    ) -> Self {
        let gaps = track.gaps();
        if !gaps.is_empty() {
            log::warn!(
                "Track for {} has {} missing minutes ({} drawable segments)",
                name,
                gaps.len(),
                track.segments().len()
            );
        }
        Self {
            name,
            catalog_number,
            last_update: reference,
            track,
        }
    }
}

fn quantize(sample: GeodeticSample) -> GeodeticSample {
    GeodeticSample {
        latitude_deg: round2(sample.latitude_deg),
        longitude_deg: normalize_longitude(round2(sample.longitude_deg)),
        altitude_km: round2(sample.altitude_km),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
