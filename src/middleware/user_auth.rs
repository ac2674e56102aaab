use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::models::{Membership, User};
use crate::util::extract_bearer_token;

use super::AuthMethod;

/// The authenticated caller, inserted into request extensions by `user_auth`.
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user: User,
    pub auth_method: AuthMethod,
}

impl UserContext {
    pub fn is_admin(&self) -> bool {
        self.user.is_superuser
    }

    /// The caller's active membership in an organization.
    pub fn membership_in(
        &self,
        conn: &rusqlite::Connection,
        org_id: i64,
    ) -> Result<Option<Membership>> {
        queries::get_active_membership(conn, self.user.id, org_id)
    }
}

/// Authenticate the caller from `Authorization: Bearer <api key>`.
///
/// Missing, unknown or revoked keys are rejected with 401 before any handler runs.
pub async fn user_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = extract_bearer_token(request.headers()).ok_or(AppError::Unauthorized)?;

    // The connection goes back to the pool before the handler runs.
    let (user, api_key) = {
        let conn = state.db.get()?;
        queries::get_user_by_api_key(&conn, token)?.ok_or(AppError::Unauthorized)?
    };

    tracing::debug!("Authenticated {} via {}", user.username, api_key.prefix);

    request.extensions_mut().insert(UserContext {
        user,
        auth_method: AuthMethod {
            key_prefix: api_key.prefix,
        },
    });

    Ok(next.run(request).await)
}
