//! Axum routes for the exchange proxy.

use super::handler::*;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;

/// Create the proxy routes.
///
/// `/venues` lists the registry; every other two-or-more segment path is
/// forwarded to the venue named by its first segment.
pub fn proxy_routes(state: Arc<ProxyState>) -> Router {
    Router::new()
        .route("/venues", get(list_venues))
        .route("/:venue/*rest", get(proxy_handler))
        .with_state(state)
}
