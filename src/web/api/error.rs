use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::camera::CameraError;
use crate::catalog::CatalogError;
use crate::orbit::OrbitError;
use crate::web::auth::PermissionError;

#[derive(Debug)]
pub enum ApiError {
    Permission(PermissionError),
    Validation(String),
    NotFound(&'static str),
    Unavailable(&'static str),
    Orbit(OrbitError),
    Catalog(CatalogError),
    Camera(CameraError),
}

impl From<PermissionError> for ApiError {
    fn from(e: PermissionError) -> Self {
        ApiError::Permission(e)
    }
}

impl From<OrbitError> for ApiError {
    fn from(e: OrbitError) -> Self {
        ApiError::Orbit(e)
    }
}

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        ApiError::Catalog(e)
    }
}

impl From<CameraError> for ApiError {
    fn from(e: CameraError) -> Self {
        ApiError::Camera(e)
    }
}

fn orbit_status(e: &OrbitError) -> (StatusCode, &'static str) {
    match e {
        OrbitError::MalformedElementData(_) => (StatusCode::BAD_REQUEST, "malformed_element_data"),
        OrbitError::PropagationDivergence { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "propagation_divergence")
        }
        OrbitError::InvalidPositionVector(_) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "invalid_position_vector")
        }
        OrbitError::IndexOutOfRange { .. } => (StatusCode::BAD_REQUEST, "index_out_of_range"),
        OrbitError::MissingSample { .. } => (StatusCode::NOT_FOUND, "missing_sample"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Permission(e) => e.into_response(),
            ApiError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::with_message("validation_failed", &msg)),
            )
                .into_response(),
            ApiError::NotFound(what) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse::new(what))).into_response()
            }
            ApiError::Unavailable(what) => {
                (StatusCode::SERVICE_UNAVAILABLE, Json(ErrorResponse::new(what))).into_response()
            }
            ApiError::Orbit(e) => {
                let (status, code) = orbit_status(&e);
                (status, Json(ErrorResponse::with_message(code, &e.to_string()))).into_response()
            }
            ApiError::Catalog(e) => {
                log::error!("Catalog error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::with_message("catalog_error", &e.to_string())),
                )
                    .into_response()
            }
            ApiError::Camera(CameraError::UnknownFeed(id)) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::with_message(
                    "unknown_camera",
                    &format!("no camera with id {}", id),
                )),
            )
                .into_response(),
            ApiError::Camera(e) => {
                log::error!("Camera error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::with_message("camera_error", &e.to_string())),
                )
                    .into_response()
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: &str) -> Self {
        ErrorResponse {
            error: error.to_string(),
            message: None,
        }
    }

    pub fn with_message(error: &str, message: &str) -> Self {
        ErrorResponse {
            error: error.to_string(),
            message: Some(message.to_string()),
        }
    }
}
