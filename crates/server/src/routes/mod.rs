//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET     /health     - Liveness check
//! GET     /inventory  - Verify session token, exchange it, query inventory
//! OPTIONS /inventory  - CORS preflight (204, no auth)
//! ```

pub mod inventory;

use axum::{Router, routing::get};

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/inventory",
        get(inventory::lookup).options(inventory::preflight),
    )
}
