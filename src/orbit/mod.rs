mod elements;
mod error;
pub mod geodesy;
pub mod look;
pub mod parsing;
pub mod propagator;
pub mod station;
pub mod track;

#[cfg(test)]
pub(crate) mod fixtures;

pub use elements::OrbitalElementSet;
pub use error::OrbitError;
pub use geodesy::GeodeticSample;
pub use look::{look_at, FrequencyPlan, LookSample};
pub use propagator::Propagator;
pub use station::GroundStation;
pub use track::{OrbitTrack, TrackedSatellite, TRACK_MINUTES};
