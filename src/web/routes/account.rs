use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};

use crate::{
    model::{
        CrudRepository, PaginatableRepository, ResourceTyped, check_access,
        entity::{User, UserCreate, UserPatch},
    },
    web::{
        AppState, RequestContext, UserRole, WebError, WebResult, error::ErrorResponse, middlewares,
        routes::PaginationQuery,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    let protected = Router::new()
        .route("/page", get(user_list_handler))
        .route(
            "/{id}",
            get(user_get_handler)
                .put(user_update_handler)
                .delete(user_delete_handler),
        )
        .route("/{id}/purge", post(user_purge_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ));

    Router::new()
        .route("/", post(user_create_handler))
        .merge(protected)
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/v1/account/",
    request_body = UserCreate,
    description = "Registers a user record",
    responses(
        (status = 200, description = "User created successfully", body = User),
        (status = 422, description = "A field failed validation", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account"
)]
pub(crate) async fn user_create_handler(
    State(state): State<AppState>,
    Json(payload): Json<UserCreate>,
) -> WebResult<impl IntoResponse> {
    let system = crate::web::AuthenticatedUser::system();
    let found = User::find_by_email(state.mm(), &system, &payload.email)
        .await
        .map_err(|e| WebError::database(User::get_resource_type(), e))?;

    if found.is_some() {
        return Err(WebError::database(
            User::get_resource_type(),
            crate::model::DatabaseError::validation("email", "already registered"),
        ));
    }

    let created = User::create(state.mm(), &system, payload)
        .await
        .map_err(|e| WebError::database(User::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/account/page",
    responses(
        (status = 200, description = "Returns requested page", body = crate::model::Page<User>),
        (status = 403, description = "You're not an admin", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account"
)]
pub(crate) async fn user_list_handler(
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if user.user_role() != UserRole::Admin {
        return Err(WebError::resource_forbidden(User::get_resource_type()));
    }

    let users = User::page(state.mm(), user, page.limit, page.offset)
        .await
        .map_err(|e| WebError::database(User::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(users)))
}

#[utoipa::path(
    get,
    path = "/api/v1/account/{id}",
    responses(
        (status = 200, description = "User found", body = User),
        (status = 404, description = "User not found", body = ErrorResponse),
    ),
    tag = "account"
)]
pub(crate) async fn user_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let found = User::find_by_id(state.mm(), user, id)
        .await
        .map_err(|e| WebError::database(User::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(User::get_resource_type()))?;

    Ok((StatusCode::OK, Json(found)))
}

#[utoipa::path(
    put,
    path = "/api/v1/account/{id}",
    request_body = UserPatch,
    description = "Applies a partial update; omitted fields keep their value",
    responses(
        (status = 200, description = "User updated successfully", body = User),
        (status = 403, description = "Not your account", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 422, description = "A field failed validation", body = ErrorResponse),
    ),
    tag = "account"
)]
pub(crate) async fn user_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UserPatch>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = User::find_by_id(state.mm(), user, id)
        .await
        .map_err(|e| WebError::database(User::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(User::get_resource_type()))?;

    check_access(state.mm(), user, &found, user.user_id())
        .await
        .map_err(|e| WebError::database(User::get_resource_type(), e))?;

    let updated = found
        .update(state.mm(), user, payload)
        .await
        .map_err(|e| WebError::database(User::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/account/{id}",
    description = "Soft-deletes the user; the row stays for audit",
    responses(
        (status = 200, description = "User deleted successfully"),
        (status = 403, description = "Not your account", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    ),
    tag = "account"
)]
pub(crate) async fn user_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = User::find_by_id(state.mm(), user, id)
        .await
        .map_err(|e| WebError::database(User::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(User::get_resource_type()))?;

    check_access(state.mm(), user, &found, user.user_id())
        .await
        .map_err(|e| WebError::database(User::get_resource_type(), e))?;

    found
        .delete(state.mm(), user)
        .await
        .map_err(|e| WebError::database(User::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/account/{id}/purge",
    description = "Physically removes a soft-deleted user (admin only)",
    responses(
        (status = 200, description = "User purged"),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    ),
    tag = "account"
)]
pub(crate) async fn user_purge_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if user.user_role() != UserRole::Admin {
        return Err(WebError::resource_forbidden(User::get_resource_type()));
    }

    // Purge targets soft-deleted rows too, so bypass the live-rows filter.
    let found: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(state.mm().executor())
        .await
        .map_err(|e| WebError::database(User::get_resource_type(), e.into()))?;
    let found = found.ok_or_else(|| WebError::resource_not_found(User::get_resource_type()))?;

    found
        .purge(state.mm(), user)
        .await
        .map_err(|e| WebError::database(User::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}
