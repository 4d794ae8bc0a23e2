use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::predict::{
    evaluate_visibility, Category, ObjectFailure, Pass, PassEngine, Sgp4Provider, TrackedObject,
    VisibilityOptions, VisibilitySample,
};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::server::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct ObjectSummary {
    pub id: String,
    pub name: String,
    pub category: Option<Category>,
    /// Estimated from the two-digit designator year.
    pub launch_year: Option<i32>,
    pub epoch: Option<DateTime<Utc>>,
    pub valid: bool,
}

impl From<&TrackedObject> for ObjectSummary {
    fn from(object: &TrackedObject) -> Self {
        Self {
            id: object.id.clone(),
            name: object.name.clone(),
            category: object.category,
            launch_year: object.elements.launch_year(),
            epoch: object.elements.epoch(),
            valid: object.elements.is_valid(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ObjectsResponse {
    pub objects: Vec<ObjectSummary>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PassesQuery {
    pub start: Option<DateTime<Utc>>,
    pub hours: Option<f64>,
    pub min_elevation: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PassesResponse {
    pub passes: Vec<Pass>,
    pub failures: Vec<ObjectFailure>,
    pub satellite_count: usize,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VisibilityQuery {
    pub time: Option<DateTime<Utc>>,
}

#[utoipa::path(
    get,
    path = "/api/objects",
    tag = "predict",
    responses(
        (status = 200, description = "Loaded objects", body = ObjectsResponse)
    )
)]
pub async fn list_objects(State(state): State<AppState>) -> Json<ObjectsResponse> {
    let loader = state.tle_loader.read().await;
    Json(ObjectsResponse {
        objects: loader.objects().into_iter().map(ObjectSummary::from).collect(),
    })
}

#[utoipa::path(
    get,
    path = "/api/passes",
    tag = "predict",
    params(
        ("start" = Option<String>, Query, description = "Start time (RFC3339), defaults to now"),
        ("hours" = Option<f64>, Query, description = "Window length in hours"),
        ("min_elevation" = Option<f64>, Query, description = "Minimum elevation (degrees)")
    ),
    responses(
        (status = 200, description = "Pass predictions", body = PassesResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 503, description = "No objects loaded", body = ErrorResponse)
    )
)]
pub async fn list_passes(
    State(state): State<AppState>,
    Query(query): Query<PassesQuery>,
) -> ApiResult<Json<PassesResponse>> {
    let objects: Vec<TrackedObject> = {
        let loader = state.tle_loader.read().await;
        loader.objects().into_iter().cloned().collect()
    };
    if objects.is_empty() {
        return Err(ApiError::Unavailable("no_objects_loaded"));
    }

    let start = query.start.unwrap_or_else(Utc::now);
    let hours = query
        .hours
        .unwrap_or_else(|| state.config.predict.horizon_hours());
    let mut options = state.options;
    if let Some(min_elevation) = query.min_elevation {
        options = options.with_min_elevation(min_elevation);
    }
    let observer = state.observer;

    // CPU-bound; keep it off the async workers
    let report = tokio::task::spawn_blocking(move || {
        PassEngine::new(Sgp4Provider)
            .with_options(options)
            .run(&objects, &observer, start, hours)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    let mut ids: Vec<_> = report.passes.iter().map(|p| p.object.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    let satellite_count = ids.len();

    Ok(Json(PassesResponse {
        satellite_count,
        passes: report.passes,
        failures: report.failures,
    }))
}

#[utoipa::path(
    get,
    path = "/api/visibility/{id}",
    tag = "predict",
    params(
        ("id" = String, Path, description = "Catalog number"),
        ("time" = Option<String>, Query, description = "Time (RFC3339), defaults to now")
    ),
    responses(
        (status = 200, description = "Look angles and visibility", body = VisibilitySample),
        (status = 400, description = "Invalid station", body = ErrorResponse),
        (status = 404, description = "Unknown object", body = ErrorResponse)
    )
)]
pub async fn visibility(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<VisibilityQuery>,
) -> ApiResult<Json<VisibilitySample>> {
    let loader = state.tle_loader.read().await;
    let object = loader.get(&id).ok_or(ApiError::NotFound)?;
    let options = VisibilityOptions {
        min_elevation_deg: state.options.min_elevation_deg,
        aperture: state.options.aperture,
        strategy: state.options.strategy,
    };
    let sample = evaluate_visibility(
        &Sgp4Provider,
        object,
        &state.observer,
        query.time.unwrap_or_else(Utc::now),
        &options,
    )?;
    Ok(Json(sample))
}
