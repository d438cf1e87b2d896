//! HTTP API server for the darkroom image metadata service.
//!
//! This crate provides the HTTP surface:
//! - Image upload (multipart) and binary streaming
//! - Paginated listing, point lookup, and deletion
//! - Label search and label statistics
//! - Recognition-pipeline status callback
//! - Health probe

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
