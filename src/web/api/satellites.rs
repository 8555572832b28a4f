use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use utoipa::{IntoParams, ToSchema};

use crate::catalog::{refresh_once, Catalog, LoadReport, SatelliteInfo};
use crate::orbit::{look_at, FrequencyPlan, GeodeticSample, LookSample, TrackedSatellite};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::auth::{require_permission, AppState, AuthenticatedUser};
use crate::web::config::Permission;

#[derive(Debug, Serialize, ToSchema)]
pub struct SatelliteSummary {
    #[serde(flatten)]
    pub info: SatelliteInfo,
    pub last_update: Option<DateTime<Utc>>,
    pub track_gaps: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrackSampleResponse {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub sample: GeodeticSample,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PositionResponse {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    /// Absent when propagation failed for this minute.
    pub sample: Option<GeodeticSample>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LookQuery {
    /// Station name; the first configured station when omitted.
    pub station: Option<String>,
    pub uplink_hz: Option<f64>,
    pub downlink_hz: Option<f64>,
}

fn catalog(state: &AppState) -> ApiResult<&Arc<RwLock<Catalog>>> {
    state
        .catalog
        .as_ref()
        .ok_or(ApiError::Unavailable("catalog_not_configured"))
}

/// Index of the live marker: whole minutes since the track was generated,
/// wrapped around the track.
pub fn live_index(last_update: DateTime<Utc>, now: DateTime<Utc>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let elapsed = (now - last_update).num_minutes().max(0) as u64;
    Some((elapsed % len as u64) as usize)
}

#[utoipa::path(
    get,
    path = "/api/satellites",
    responses(
        (status = 200, description = "Satellites in the catalog", body = [SatelliteSummary]),
        (status = 503, description = "Catalog not configured", body = ErrorResponse)
    ),
    tag = "satellites"
)]
pub async fn list_satellites(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<SatelliteSummary>>> {
    let catalog = catalog(&state)?.read().await;
    let summaries = catalog
        .satellites()
        .into_iter()
        .map(|entry| {
            let tracked = catalog.track(entry.info.norad_id);
            SatelliteSummary {
                info: entry.info.clone(),
                last_update: tracked.map(|t| t.last_update),
                track_gaps: tracked.map(|t| t.track.gaps().len()),
            }
        })
        .collect();
    Ok(Json(summaries))
}

#[utoipa::path(
    get,
    path = "/api/satellites/{norad_id}/track",
    params(("norad_id" = u64, Path, description = "NORAD catalog number")),
    responses(
        (status = 200, description = "Current ground track", body = TrackedSatellite),
        (status = 404, description = "Unknown satellite or no track yet", body = ErrorResponse),
        (status = 503, description = "Catalog not configured", body = ErrorResponse)
    ),
    tag = "satellites"
)]
pub async fn get_track(
    State(state): State<AppState>,
    Path(norad_id): Path<u64>,
) -> ApiResult<Json<TrackedSatellite>> {
    let catalog = catalog(&state)?.read().await;
    let tracked = catalog
        .track(norad_id)
        .ok_or(ApiError::NotFound("track_not_found"))?;
    Ok(Json(tracked.clone()))
}

#[utoipa::path(
    get,
    path = "/api/satellites/{norad_id}/track/{index}",
    params(
        ("norad_id" = u64, Path, description = "NORAD catalog number"),
        ("index" = usize, Path, description = "Minutes after the reference instant")
    ),
    responses(
        (status = 200, description = "Track sample", body = TrackSampleResponse),
        (status = 400, description = "Index out of range", body = ErrorResponse),
        (status = 404, description = "Unknown satellite or no sample for that minute", body = ErrorResponse)
    ),
    tag = "satellites"
)]
pub async fn get_track_sample(
    State(state): State<AppState>,
    Path((norad_id, index)): Path<(u64, usize)>,
) -> ApiResult<Json<TrackSampleResponse>> {
    let catalog = catalog(&state)?.read().await;
    let tracked = catalog
        .track(norad_id)
        .ok_or(ApiError::NotFound("track_not_found"))?;
    let sample = tracked.track.sample_at(index)?;
    let timestamp = tracked.track.timestamp_at(index)?;
    Ok(Json(TrackSampleResponse {
        index,
        timestamp,
        sample,
    }))
}

#[utoipa::path(
    get,
    path = "/api/satellites/{norad_id}/position",
    params(("norad_id" = u64, Path, description = "NORAD catalog number")),
    responses(
        (status = 200, description = "Live marker position", body = PositionResponse),
        (status = 404, description = "Unknown satellite or no track yet", body = ErrorResponse)
    ),
    tag = "satellites"
)]
pub async fn get_position(
    State(state): State<AppState>,
    Path(norad_id): Path<u64>,
) -> ApiResult<Json<PositionResponse>> {
    let catalog = catalog(&state)?.read().await;
    let tracked = catalog
        .track(norad_id)
        .ok_or(ApiError::NotFound("track_not_found"))?;
    let index = live_index(tracked.last_update, Utc::now(), tracked.track.len())
        .ok_or(ApiError::NotFound("track_empty"))?;
    Ok(Json(PositionResponse {
        index,
        timestamp: tracked.track.timestamp_at(index)?,
        sample: tracked.track.samples()[index],
    }))
}

#[utoipa::path(
    get,
    path = "/api/satellites/{norad_id}/look",
    params(
        ("norad_id" = u64, Path, description = "NORAD catalog number"),
        LookQuery
    ),
    responses(
        (status = 200, description = "Pointing from the station now", body = LookSample),
        (status = 400, description = "No such station", body = ErrorResponse),
        (status = 404, description = "Unknown satellite", body = ErrorResponse),
        (status = 422, description = "Propagation failed", body = ErrorResponse)
    ),
    tag = "satellites"
)]
pub async fn get_look(
    State(state): State<AppState>,
    Path(norad_id): Path<u64>,
    Query(query): Query<LookQuery>,
) -> ApiResult<Json<LookSample>> {
    let station = state
        .config
        .station(query.station.as_deref())
        .and_then(|s| s.ground_station())
        .ok_or_else(|| ApiError::Validation("no matching ground station configured".into()))?;

    let catalog = catalog(&state)?.read().await;
    let entry = catalog
        .get(norad_id)
        .ok_or(ApiError::NotFound("satellite_not_found"))?;

    let plan = FrequencyPlan {
        uplink_hz: query.uplink_hz,
        downlink_hz: query.downlink_hz,
    };
    let look = look_at(&station, &entry.propagator, Utc::now(), &plan)?;
    log::debug!(
        "{} is {} (el {:.2})",
        entry.info.name,
        if look.is_visible() { "above the horizon" } else { "below the horizon" },
        look.elevation_deg
    );
    Ok(Json(look))
}

#[utoipa::path(
    post,
    path = "/api/catalog/reload",
    security(("api_key" = [])),
    responses(
        (status = 200, description = "Catalog reloaded", body = LoadReport),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Missing reload_catalog permission", body = ErrorResponse),
        (status = 503, description = "Catalog not configured", body = ErrorResponse)
    ),
    tag = "satellites"
)]
pub async fn reload_catalog(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<LoadReport>> {
    require_permission(&user, Permission::ReloadCatalog)?;
    let track_minutes = state
        .config
        .catalog
        .as_ref()
        .map(|c| c.track_minutes)
        .ok_or(ApiError::Unavailable("catalog_not_configured"))?;

    let report = refresh_once(catalog(&state)?, track_minutes).await?;
    log::info!("Catalog reloaded by {}", user.name);
    Ok(Json(report))
}
