use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::camera::FeedSupervisor;
use crate::catalog::Catalog;

use super::config::{Config, Permission};

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub name: String,
    pub permissions: HashSet<Permission>,
}

impl AuthenticatedUser {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}

/// Shared handler state. The catalog and the camera are absent when their
/// config sections are.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Option<Arc<RwLock<Catalog>>>,
    pub camera: Option<Arc<Mutex<FeedSupervisor>>>,
}

impl AppState {
    pub fn without_services(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            catalog: None,
            camera: None,
        }
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingAuth,
    InvalidFormat,
    InvalidKey,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingAuth => (StatusCode::UNAUTHORIZED, "Missing Authorization header"),
            AuthError::InvalidFormat => (StatusCode::UNAUTHORIZED, "Invalid Authorization format"),
            AuthError::InvalidKey => (StatusCode::UNAUTHORIZED, "Invalid API key"),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[derive(Debug)]
pub struct PermissionError(pub Permission);

impl IntoResponse for PermissionError {
    fn into_response(self) -> Response {
        (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "Insufficient permissions" })),
        )
            .into_response()
    }
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuth)?
            .to_str()
            .map_err(|_| AuthError::InvalidFormat)?;

        let key = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidFormat)?;

        let api_key = state.config.find_api_key(key).ok_or_else(|| {
            log::warn!("Rejected request with unknown API key");
            AuthError::InvalidKey
        })?;

        Ok(AuthenticatedUser {
            name: api_key.name.clone(),
            permissions: api_key.permissions.clone(),
        })
    }
}

pub fn require_permission(
    user: &AuthenticatedUser,
    permission: Permission,
) -> Result<(), PermissionError> {
    if user.has_permission(permission) {
        Ok(())
    } else {
        log::warn!("{} lacks permission {:?}", user.name, permission);
        Err(PermissionError(permission))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn state() -> AppState {
        let config = Config::from_yaml(
            "api_keys:\n  - key: k1\n    name: operator\n    permissions: [control_camera]\n",
        )
        .unwrap();
        AppState::without_services(config)
    }

    async fn authenticate(header: Option<&str>) -> Result<AuthenticatedUser, AuthError> {
        let mut builder = Request::builder().uri("/api/camera/stop");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        AuthenticatedUser::from_request_parts(&mut parts, &state()).await
    }

    #[tokio::test]
    async fn bearer_key_authenticates() {
        let user = authenticate(Some("Bearer k1")).await.unwrap();
        assert_eq!(user.name, "operator");
        assert!(require_permission(&user, Permission::ControlCamera).is_ok());
        assert!(require_permission(&user, Permission::ReloadCatalog).is_err());
    }

    #[tokio::test]
    async fn rejects_missing_or_bad_keys() {
        assert!(matches!(authenticate(None).await, Err(AuthError::MissingAuth)));
        assert!(matches!(
            authenticate(Some("Basic k1")).await,
            Err(AuthError::InvalidFormat)
        ));
        assert!(matches!(
            authenticate(Some("Bearer nope")).await,
            Err(AuthError::InvalidKey)
        ));
    }
}
