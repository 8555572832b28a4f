use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

use super::api::{camera, error::ErrorResponse, satellites, stations, tracks};

#[derive(OpenApi)]
#[openapi(
    paths(
        satellites::list_satellites,
        satellites::get_track,
        satellites::get_track_sample,
        satellites::get_position,
        satellites::get_look,
        satellites::reload_catalog,
        tracks::create_track,
        stations::list_stations,
        camera::status,
        camera::stop,
        camera::switch,
    ),
    components(
        schemas(
            ErrorResponse,
            satellites::SatelliteSummary,
            satellites::TrackSampleResponse,
            satellites::PositionResponse,
            tracks::TrackRequest,
            stations::StationResponse,
            camera::CameraStatusResponse,
            camera::StopResponse,
            crate::catalog::SatelliteInfo,
            crate::catalog::LoadReport,
            crate::catalog::RejectedEntry,
            crate::orbit::TrackedSatellite,
            crate::orbit::OrbitTrack,
            crate::orbit::GeodeticSample,
            crate::orbit::LookSample,
            crate::orbit::GroundStation,
            crate::camera::FeedStatus,
            crate::camera::FeedState,
            crate::camera::FeedSummary,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Groundtrack API",
        description = "Satellite ground tracks, pointing and camera feeds for the ground station console",
        version = "0.1.0"
    ),
    tags(
        (name = "satellites", description = "Catalog and ground tracks"),
        (name = "tracks", description = "Ad-hoc track generation"),
        (name = "stations", description = "Ground stations"),
        (name = "camera", description = "Camera feed control")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}
