//! Role API Module

mod handler;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::auth::permissions::{actions, screens};
use crate::auth::require_permission;
use crate::core::ServerState;

/// Role router - each group is gated by its own Roles permission
pub fn router(state: &ServerState) -> Router<ServerState> {
    let view_routes = Router::new()
        .route("/api/roles", get(handler::list))
        .route("/api/roles/{id}", get(handler::get_by_id))
        .route("/api/roles/{id}/permissions", get(handler::get_role_permissions));

    let add_routes = Router::new().route("/api/roles", post(handler::create));

    let edit_routes = Router::new()
        .route("/api/roles/{id}", put(handler::update))
        .route("/api/roles/{id}/permissions", put(handler::replace_role_permissions));

    let delete_routes = Router::new().route("/api/roles/{id}", delete(handler::delete));

    gated(view_routes, state, actions::VIEW)
        .merge(gated(add_routes, state, actions::ADD))
        .merge(gated(edit_routes, state, actions::EDIT))
        .merge(gated(delete_routes, state, actions::DELETE))
}

fn gated(
    routes: Router<ServerState>,
    state: &ServerState,
    action: &'static str,
) -> Router<ServerState> {
    routes.route_layer(middleware::from_fn_with_state(
        state.clone(),
        require_permission(screens::ROLES, action),
    ))
}
