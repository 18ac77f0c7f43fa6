//! Application router configuration.

use axum::{
    Router,
    http::{HeaderValue, Method, header::CONTENT_TYPE},
    routing::get,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{
    AppState, Error, endpoints,
    record::{
        create_record_endpoint, delete_record_endpoint, export_records_endpoint,
        list_records_endpoint,
    },
};

/// Which origins browsers may call the API from.
#[derive(Debug, Clone, Default)]
pub enum CorsPolicy {
    /// Any origin. Only suitable for a local, single user deployment.
    #[default]
    AnyOrigin,
    /// A single origin, e.g. "https://tracker.example.com".
    Origin(HeaderValue),
}

impl CorsPolicy {
    fn into_layer(self) -> CorsLayer {
        let allow_origin = match self {
            CorsPolicy::AnyOrigin => AllowOrigin::any(),
            CorsPolicy::Origin(origin) => AllowOrigin::list([origin]),
        };

        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST, Method::DELETE])
            .allow_headers([CONTENT_TYPE])
    }
}

/// Return a router with all the app's routes.
pub fn build_router(state: AppState, cors: CorsPolicy) -> Router {
    Router::new()
        .route(
            endpoints::RECORDS,
            get(list_records_endpoint)
                .post(create_record_endpoint)
                .delete(delete_record_endpoint),
        )
        .route(endpoints::RECORDS_EXPORT, get(export_records_endpoint))
        .fallback(get_404_not_found)
        .method_not_allowed_fallback(get_405_method_not_allowed)
        .layer(cors.into_layer())
        .with_state(state)
}

async fn get_404_not_found() -> Error {
    Error::NotFound
}

async fn get_405_method_not_allowed(method: Method) -> Error {
    Error::MethodNotAllowed(method.to_string())
}
