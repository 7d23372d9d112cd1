use axum::{
    Json, Router,
    extract::{Path, State as AxumState},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};

use crate::{
    model::{ResourceTyped, entity::State},
    web::{
        AppState, RequestContext, WebError, WebResult, error::ErrorResponse, middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(state_list_handler))
        .route("/{id}", get(state_get_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/states/",
    description = "The fixed lifecycle-state catalog",
    responses(
        (status = 200, description = "All states", body = Vec<State>),
    ),
    tag = "states"
)]
pub(crate) async fn state_list_handler(
    ctx: RequestContext,
    AxumState(state): AxumState<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let states = State::all(state.mm(), user)
        .await
        .map_err(|e| WebError::database(State::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(states)))
}

#[utoipa::path(
    get,
    path = "/api/v1/states/{id}",
    responses(
        (status = 200, description = "State found", body = State),
        (status = 404, description = "State not found", body = ErrorResponse),
    ),
    tag = "states"
)]
pub(crate) async fn state_get_handler(
    ctx: RequestContext,
    AxumState(state): AxumState<AppState>,
    Path(id): Path<i32>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let found = State::find_by_id(state.mm(), user, id)
        .await
        .map_err(|e| WebError::database(State::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(State::get_resource_type()))?;

    Ok((StatusCode::OK, Json(found)))
}
