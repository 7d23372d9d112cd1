use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{
    model::{CrudRepository, ResourceTyped, entity::User},
    web::{AppState, RequestContext, context::AuthenticatedUser, error::WebError},
};

/// Header carrying the acting user's id. Authentication proper is handled
/// by an upstream gateway; this service only resolves the id to a role.
pub static IDENT_HEADER: &str = "X-User-Id";

pub async fn extract_context_fn(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, WebError> {
    let header = match req.headers().get(IDENT_HEADER) {
        Some(value) => value.clone(),
        None => {
            req.extensions_mut().insert(RequestContext::new(None));
            return Ok(next.run(req).await);
        }
    };

    let id = header
        .to_str()
        .ok()
        .and_then(|s| s.parse::<i32>().ok())
        .ok_or_else(|| WebError::identity_header_invalid(format!("{header:?}")))?;

    let user = User::find_by_id(state.mm(), &AuthenticatedUser::system(), id)
        .await
        .map_err(|e| WebError::resource_fetch_error(User::get_resource_type(), e))?;

    match user {
        Some(user) => {
            req.extensions_mut().insert(RequestContext::new(Some(
                AuthenticatedUser::new(user.id(), user.role()),
            )));

            Ok(next.run(req).await)
        }
        None => Err(WebError::identity_unknown_user(id)),
    }
}
