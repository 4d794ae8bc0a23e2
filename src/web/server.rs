use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{Config, ConfigError};
use crate::predict::{GeoLocation, ScanOptions, TleLoader};

use super::api::predict as predict_handlers;
use super::api_doc::ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub observer: GeoLocation,
    pub options: ScanOptions,
    pub tle_loader: Arc<RwLock<TleLoader>>,
}

impl AppState {
    pub fn new(config: Config, loader: TleLoader) -> Result<Self, ConfigError> {
        let observer = config.observer()?;
        let options = config.scan_options(&observer)?;
        Ok(Self {
            config: Arc::new(config),
            observer,
            options,
            tle_loader: Arc::new(RwLock::new(loader)),
        })
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/objects", get(predict_handlers::list_objects))
        .route("/api/passes", get(predict_handlers::list_passes))
        .route("/api/visibility/{id}", get(predict_handlers::visibility))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(state: AppState) -> std::io::Result<()> {
    let bind_addr = state.config.web.bind.clone();
    let app = router(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await
}
