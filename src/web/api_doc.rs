use utoipa::OpenApi;

use super::api::error::ErrorResponse;
use super::api::predict::{ObjectSummary, ObjectsResponse, PassesResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::predict::list_objects,
        super::api::predict::list_passes,
        super::api::predict::visibility,
    ),
    components(
        schemas(
            ObjectSummary,
            ObjectsResponse,
            PassesResponse,
            ErrorResponse,
            crate::predict::Pass,
            crate::predict::VisibilitySample,
            crate::predict::TrackedObject,
            crate::predict::Category,
            crate::predict::ObjectFailure,
        )
    ),
    info(
        title = "Pass-O-Mat Prediction API",
        description = "Visibility and pass prediction for tracked objects",
        version = "0.1.0"
    ),
    tags(
        (name = "predict", description = "Visibility and pass prediction")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_all_routes() {
        let doc = ApiDoc::openapi();
        for path in ["/api/objects", "/api/passes", "/api/visibility/{id}"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
