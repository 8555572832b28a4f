use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::orbit::GroundStation;
use crate::web::auth::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct StationResponse {
    pub name: String,
    #[serde(flatten)]
    pub location: GroundStation,
}

#[utoipa::path(
    get,
    path = "/api/stations",
    responses(
        (status = 200, description = "Configured ground stations", body = [StationResponse])
    ),
    tag = "stations"
)]
pub async fn list_stations(State(state): State<AppState>) -> Json<Vec<StationResponse>> {
    let stations = state
        .config
        .stations
        .iter()
        .filter_map(|s| {
            s.ground_station().map(|location| StationResponse {
                name: s.name.clone(),
                location,
            })
        })
        .collect();
    Json(stations)
}
