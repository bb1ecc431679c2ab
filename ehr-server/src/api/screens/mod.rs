//! Screen catalog API (read-only)

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::permissions::{actions, screens};
use crate::auth::require_permission;
use crate::core::ServerState;

/// Catalog listing, used by the role editor - requires Roles/View
pub fn router(state: &ServerState) -> Router<ServerState> {
    Router::new()
        .route("/api/screens", get(handler::list))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_permission(screens::ROLES, actions::VIEW),
        ))
}
