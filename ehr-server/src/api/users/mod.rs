//! User API Module

mod handler;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::auth::permissions::{actions, screens};
use crate::auth::require_permission;
use crate::core::ServerState;

/// User administration router - gated by Users permissions
pub fn router(state: &ServerState) -> Router<ServerState> {
    let view_routes = Router::new()
        .route("/api/users", get(handler::list))
        .route("/api/users/{id}", get(handler::get_by_id));

    let add_routes = Router::new().route("/api/users", post(handler::create));
    let edit_routes = Router::new().route("/api/users/{id}", put(handler::update));
    let delete_routes = Router::new().route("/api/users/{id}", delete(handler::delete));

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
        require_permission(screens::USERS, action),
    ))
}
