use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::orbit::{OrbitalElementSet, TrackedSatellite, TRACK_MINUTES};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::config::MAX_TRACK_MINUTES;

/// Element set to propagate, either as one text block or as separate lines.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TrackRequest {
    pub tle: Option<String>,
    pub name: Option<String>,
    pub line1: Option<String>,
    pub line2: Option<String>,
    /// First sample instant (RFC 3339); now when omitted.
    pub reference: Option<DateTime<Utc>>,
    pub minutes: Option<u32>,
}

impl TrackRequest {
    fn elements(&self) -> ApiResult<OrbitalElementSet> {
        let elements = match (&self.tle, &self.line1, &self.line2) {
            (Some(tle), None, None) => OrbitalElementSet::parse(tle)?,
            (None, Some(line1), Some(line2)) => {
                OrbitalElementSet::from_named_lines(self.name.clone(), line1, line2)?
            }
            _ => {
                return Err(ApiError::Validation(
                    "provide either `tle` or both `line1` and `line2`".into(),
                ))
            }
        };
        Ok(elements)
    }
}

#[utoipa::path(
    post,
    path = "/api/tracks",
    request_body = TrackRequest,
    responses(
        (status = 200, description = "Ground track", body = TrackedSatellite),
        (status = 400, description = "Malformed element data or parameters", body = ErrorResponse),
        (status = 422, description = "Propagation model could not be initialised", body = ErrorResponse)
    ),
    tag = "tracks"
)]
pub async fn create_track(Json(request): Json<TrackRequest>) -> ApiResult<Json<TrackedSatellite>> {
    let minutes = request.minutes.unwrap_or(TRACK_MINUTES);
    if minutes == 0 || minutes > MAX_TRACK_MINUTES {
        return Err(ApiError::Validation(format!(
            "minutes must be between 1 and {}",
            MAX_TRACK_MINUTES
        )));
    }

    let elements = request.elements()?;
    let reference = request.reference.unwrap_or_else(Utc::now);
    let tracked = TrackedSatellite::generate(&elements, reference, minutes)?;
    Ok(Json(tracked))
}
