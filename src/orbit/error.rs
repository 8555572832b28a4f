use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrbitError {
    #[error("malformed element data: {0}")]
    MalformedElementData(String),
    #[error("propagation diverged at {minutes:.1} min from epoch: {reason}")]
    PropagationDivergence { minutes: f64, reason: String },
    #[error("invalid position vector {0:?}")]
    InvalidPositionVector([f64; 3]),
    #[error("index {index} out of range for track of {len} samples")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("no sample at index {index}, propagation failed for that minute")]
    MissingSample { index: usize },
}

impl OrbitError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        OrbitError::MalformedElementData(message.into())
    }

    /// True when the orbit model could not produce a usable state.
    pub fn is_divergence(&self) -> bool {
        matches!(
            self,
            OrbitError::PropagationDivergence { .. } | OrbitError::InvalidPositionVector(_)
        )
    }
}

impl From<sgp4::TleError> for OrbitError {
    fn from(err: sgp4::TleError) -> Self {
        OrbitError::MalformedElementData(err.to_string())
    }
}

impl From<sgp4::ElementsError> for OrbitError {
    fn from(err: sgp4::ElementsError) -> Self {
        OrbitError::MalformedElementData(err.to_string())
    }
}
