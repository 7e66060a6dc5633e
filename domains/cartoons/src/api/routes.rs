//! Route definitions for Cartoons domain API

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::cartoons;
use super::middleware::CartoonsState;

/// Create all Cartoons domain API routes
pub fn routes() -> Router<CartoonsState> {
    Router::new()
        .route("/generate", post(cartoons::generate))
        .route("/images", get(cartoons::list_images))
}
