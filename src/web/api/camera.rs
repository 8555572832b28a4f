use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use utoipa::ToSchema;

use crate::camera::{FeedStatus, FeedSummary, FeedSupervisor};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::auth::{require_permission, AppState, AuthenticatedUser};
use crate::web::config::Permission;

#[derive(Debug, Serialize, ToSchema)]
pub struct CameraStatusResponse {
    #[serde(flatten)]
    pub status: FeedStatus,
    pub feeds: Vec<FeedSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StopResponse {
    pub stopped: bool,
}

fn camera(state: &AppState) -> ApiResult<&Arc<Mutex<FeedSupervisor>>> {
    state
        .camera
        .as_ref()
        .ok_or(ApiError::Unavailable("camera_not_configured"))
}

#[utoipa::path(
    get,
    path = "/api/camera/status",
    responses(
        (status = 200, description = "Camera feed status", body = CameraStatusResponse),
        (status = 503, description = "Camera not configured", body = ErrorResponse)
    ),
    tag = "camera"
)]
pub async fn status(State(state): State<AppState>) -> ApiResult<Json<CameraStatusResponse>> {
    let supervisor = camera(&state)?.lock().await;
    Ok(Json(CameraStatusResponse {
        status: supervisor.status(),
        feeds: supervisor.feeds(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/camera/stop",
    security(("api_key" = [])),
    responses(
        (status = 200, description = "Whether a feed was running", body = StopResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Missing control_camera permission", body = ErrorResponse)
    ),
    tag = "camera"
)]
pub async fn stop(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<StopResponse>> {
    require_permission(&user, Permission::ControlCamera)?;
    let stopped = FeedSupervisor::run_blocking(camera(&state)?, |s| s.stop()).await?;
    Ok(Json(StopResponse { stopped }))
}

#[utoipa::path(
    post,
    path = "/api/camera/switch/{id}",
    params(("id" = u32, Path, description = "Camera id")),
    security(("api_key" = [])),
    responses(
        (status = 200, description = "Feed started", body = FeedStatus),
        (status = 400, description = "Unknown camera id", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Missing control_camera permission", body = ErrorResponse),
        (status = 500, description = "Converter failed to start", body = ErrorResponse)
    ),
    tag = "camera"
)]
pub async fn switch(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<u32>,
) -> ApiResult<Json<FeedStatus>> {
    require_permission(&user, Permission::ControlCamera)?;
    log::info!("{} switching camera to feed {}", user.name, id);
    let status = FeedSupervisor::run_blocking(camera(&state)?, move |s| s.switch(id)).await??;
    Ok(Json(status))
}
