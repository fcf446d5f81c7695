//! HTTP surface: axum router, JWT middleware, extractors and OpenAPI docs.

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod validators;

pub use openapi::ApiDoc;
pub use routes::create_router;
pub use state::AppState;
