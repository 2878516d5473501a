//! API route definitions

use crate::api::handlers;
use crate::app::AppState;
use axum::{routing::get, Router};
use std::sync::Arc;

/// Create the boot script router, relative to the configured path prefix
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/mac/:mac", get(handlers::boot_by_mac))
        .route("/serial/:serial", get(handlers::boot_by_serial))
        .route("/group/:group", get(handlers::boot_by_group))
        .route("/default", get(handlers::boot_default))
}
