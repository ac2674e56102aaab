pub mod memberships;

use axum::{Router, middleware, routing::get};

use crate::db::AppState;
use crate::middleware::user_auth;

/// All API routes. Every membership route requires a bearer API key.
pub fn router(state: AppState) -> Router<AppState> {
    let membership_routes = Router::new()
        .route("/memberships", get(memberships::list_memberships))
        .route(
            "/memberships/{id}",
            get(memberships::get_membership)
                .patch(memberships::update_membership)
                .delete(memberships::delete_membership),
        )
        .layer(middleware::from_fn_with_state(state, user_auth));

    Router::new()
        .route("/health", get(health))
        .merge(membership_routes)
}

async fn health() -> &'static str {
    "ok"
}
