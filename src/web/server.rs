use axum::{routing::get, routing::post, Router};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::camera::FeedSupervisor;
use crate::catalog::{Catalog, RefreshWorker};

use super::api::camera as camera_handlers;
use super::api::satellites as satellite_handlers;
use super::api::stations as station_handlers;
use super::api::tracks as track_handlers;
use super::api_doc::ApiDoc;
use super::auth::AppState;
use super::config::Config;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        // Catalog and tracks
        .route("/api/satellites", get(satellite_handlers::list_satellites))
        .route(
            "/api/satellites/{norad_id}/track",
            get(satellite_handlers::get_track),
        )
        .route(
            "/api/satellites/{norad_id}/track/{index}",
            get(satellite_handlers::get_track_sample),
        )
        .route(
            "/api/satellites/{norad_id}/position",
            get(satellite_handlers::get_position),
        )
        .route(
            "/api/satellites/{norad_id}/look",
            get(satellite_handlers::get_look),
        )
        .route(
            "/api/catalog/reload",
            post(satellite_handlers::reload_catalog),
        )
        .route("/api/tracks", post(track_handlers::create_track))
        .route("/api/stations", get(station_handlers::list_stations))
        // Camera
        .route("/api/camera/status", get(camera_handlers::status))
        .route("/api/camera/stop", post(camera_handlers::stop))
        .route("/api/camera/switch/{id}", post(camera_handlers::switch))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()));

    if let Some(camera) = &state.config.camera {
        app = app.nest_service("/hls", ServeDir::new(&camera.hls_folder));
    }

    app.layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: Config) -> std::io::Result<()> {
    let bind_addr = config.web.bind.clone();

    let catalog = config.catalog.as_ref().map(|catalog_config| {
        Arc::new(RwLock::new(Catalog::new(catalog_config.tle_folder.clone())))
    });
    let mut refresh_worker = match (&catalog, &config.catalog) {
        (Some(catalog), Some(catalog_config)) => Some(RefreshWorker::start(
            catalog.clone(),
            catalog_config.refresh_interval,
            catalog_config.track_minutes,
        )),
        _ => None,
    };

    let camera = match config.camera.clone() {
        Some(camera_config) => match FeedSupervisor::new(camera_config) {
            Ok(supervisor) => Some(Arc::new(Mutex::new(supervisor))),
            Err(e) => {
                log::warn!("Camera feeds disabled: {}", e);
                None
            }
        },
        None => None,
    };

    let state = AppState {
        config: Arc::new(config),
        catalog,
        camera: camera.clone(),
    };
    let app = build_router(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Some(worker) = refresh_worker.as_mut() {
        if !worker.is_running() {
            log::warn!("Catalog refresh worker had already exited");
        }
        worker.stop().await;
    }
    if let Some(camera) = camera {
        if let Err(e) = FeedSupervisor::run_blocking(&camera, |s| s.stop()).await {
            log::warn!("Failed to stop camera feed: {}", e);
        }
    }
    log::info!("Server stopped");
    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown requested");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_builds_with_and_without_camera() {
        build_router(AppState::without_services(Config::from_yaml("{}").unwrap()));

        let config = Config::from_yaml(
            "camera:\n  hls_folder: /tmp/groundtrack-router-hls\n  feeds: []\n",
        )
        .unwrap();
        build_router(AppState::without_services(config));
    }
}
