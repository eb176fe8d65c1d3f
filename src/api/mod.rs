//! HTTP surface for context preparation

pub mod handlers;
pub mod models;
pub mod routes;

pub use handlers::AppState;
pub use models::{ApiError, EstimateRequest, EstimateResponse, PrepareRequest, PrepareResponse};
pub use routes::build_router;
