use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};

use crate::{
    model::{
        CrudRepository, PaginatableRepository, ResourceTyped, check_access,
        entity::{
            AchievementLevel, AchievementLevelCreate, AchievementLevelPatch, Indicator,
            IndicatorCreate, IndicatorPatch, Rubric, RubricCreate, RubricPatch,
        },
    },
    web::{
        AppState, RequestContext, UserRole, WebError, WebResult,
        dto::rubrics::RubricDetailResponse, error::ErrorResponse, middlewares,
        routes::PaginationQuery,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(rubric_create_handler))
        .route("/page", get(rubric_list_handler))
        .route(
            "/{id}",
            get(rubric_get_handler)
                .put(rubric_update_handler)
                .delete(rubric_delete_handler),
        )
        .route("/indicators", post(indicator_create_handler))
        .route(
            "/indicators/{id}",
            put(indicator_update_handler).delete(indicator_delete_handler),
        )
        .route("/levels", post(level_create_handler))
        .route(
            "/levels/{id}",
            put(level_update_handler).delete(level_delete_handler),
        )
        .route("/{id}/purge", post(rubric_purge_handler))
        .route("/indicators/{id}/purge", post(indicator_purge_handler))
        .route("/levels/{id}/purge", post(level_purge_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/v1/rubrics/",
    request_body = RubricCreate,
    responses(
        (status = 200, description = "Rubric created", body = Rubric),
        (status = 403, description = "Students cannot author rubrics", body = ErrorResponse),
    ),
    tag = "rubrics"
)]
pub(crate) async fn rubric_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<RubricCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if !user.can_manage_catalog() {
        return Err(WebError::resource_forbidden(Rubric::get_resource_type()));
    }

    let created = Rubric::create(state.mm(), user, payload)
        .await
        .map_err(|e| WebError::database(Rubric::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/rubrics/page",
    responses(
        (status = 200, description = "Returns requested page", body = crate::model::Page<Rubric>),
    ),
    tag = "rubrics"
)]
pub(crate) async fn rubric_list_handler(
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let rubrics = Rubric::page(state.mm(), user, page.limit, page.offset)
        .await
        .map_err(|e| WebError::database(Rubric::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(rubrics)))
}

#[utoipa::path(
    get,
    path = "/api/v1/rubrics/{id}",
    description = "Rubric with its indicators and their achievement levels",
    responses(
        (status = 200, description = "Rubric found", body = RubricDetailResponse),
        (status = 404, description = "Rubric not found", body = ErrorResponse),
    ),
    tag = "rubrics"
)]
pub(crate) async fn rubric_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let rubric = Rubric::find_by_id(state.mm(), user, id)
        .await
        .map_err(|e| WebError::database(Rubric::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Rubric::get_resource_type()))?;

    let indicators = Indicator::all_by_rubric(state.mm(), user, rubric.id())
        .await
        .map_err(|e| WebError::database(Indicator::get_resource_type(), e))?;

    let mut tree = Vec::with_capacity(indicators.len());
    for indicator in indicators {
        let levels = AchievementLevel::all_by_indicator(state.mm(), user, indicator.id())
            .await
            .map_err(|e| WebError::database(AchievementLevel::get_resource_type(), e))?;
        tree.push((indicator, levels));
    }

    Ok((
        StatusCode::OK,
        Json(RubricDetailResponse::from_entities(rubric, tree)),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/rubrics/{id}",
    request_body = RubricPatch,
    responses(
        (status = 200, description = "Rubric updated", body = Rubric),
        (status = 403, description = "Not the rubric owner", body = ErrorResponse),
        (status = 404, description = "Rubric not found", body = ErrorResponse),
    ),
    tag = "rubrics"
)]
pub(crate) async fn rubric_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<RubricPatch>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = Rubric::find_by_id(state.mm(), user, id)
        .await
        .map_err(|e| WebError::database(Rubric::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Rubric::get_resource_type()))?;

    check_access(state.mm(), user, &found, user.user_id())
        .await
        .map_err(|e| WebError::database(Rubric::get_resource_type(), e))?;

    let updated = found
        .update(state.mm(), user, payload)
        .await
        .map_err(|e| WebError::database(Rubric::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/rubrics/{id}",
    responses(
        (status = 200, description = "Rubric soft-deleted"),
        (status = 403, description = "Not the rubric owner", body = ErrorResponse),
        (status = 404, description = "Rubric not found", body = ErrorResponse),
    ),
    tag = "rubrics"
)]
pub(crate) async fn rubric_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = Rubric::find_by_id(state.mm(), user, id)
        .await
        .map_err(|e| WebError::database(Rubric::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Rubric::get_resource_type()))?;

    check_access(state.mm(), user, &found, user.user_id())
        .await
        .map_err(|e| WebError::database(Rubric::get_resource_type(), e))?;

    found
        .delete(state.mm(), user)
        .await
        .map_err(|e| WebError::database(Rubric::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/rubrics/indicators",
    request_body = IndicatorCreate,
    responses(
        (status = 200, description = "Indicator created", body = Indicator),
        (status = 403, description = "Not the rubric owner", body = ErrorResponse),
        (status = 404, description = "Parent rubric not found", body = ErrorResponse),
    ),
    tag = "rubrics"
)]
pub(crate) async fn indicator_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<IndicatorCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let rubric = Rubric::find_by_id(state.mm(), user, payload.rubric_id.clone())
        .await
        .map_err(|e| WebError::database(Rubric::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Rubric::get_resource_type()))?;

    check_access(state.mm(), user, &rubric, user.user_id())
        .await
        .map_err(|e| WebError::database(Rubric::get_resource_type(), e))?;

    let created = Indicator::create(state.mm(), user, payload)
        .await
        .map_err(|e| WebError::database(Indicator::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/v1/rubrics/indicators/{id}",
    request_body = IndicatorPatch,
    responses(
        (status = 200, description = "Indicator updated", body = Indicator),
        (status = 403, description = "Not the rubric owner", body = ErrorResponse),
        (status = 404, description = "Indicator not found", body = ErrorResponse),
    ),
    tag = "rubrics"
)]
pub(crate) async fn indicator_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<IndicatorPatch>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = Indicator::find_by_id(state.mm(), user, id)
        .await
        .map_err(|e| WebError::database(Indicator::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Indicator::get_resource_type()))?;

    check_access(state.mm(), user, &found, user.user_id())
        .await
        .map_err(|e| WebError::database(Indicator::get_resource_type(), e))?;

    let updated = found
        .update(state.mm(), user, payload)
        .await
        .map_err(|e| WebError::database(Indicator::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/rubrics/indicators/{id}",
    responses(
        (status = 200, description = "Indicator soft-deleted"),
        (status = 403, description = "Not the rubric owner", body = ErrorResponse),
        (status = 404, description = "Indicator not found", body = ErrorResponse),
    ),
    tag = "rubrics"
)]
pub(crate) async fn indicator_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = Indicator::find_by_id(state.mm(), user, id)
        .await
        .map_err(|e| WebError::database(Indicator::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Indicator::get_resource_type()))?;

    check_access(state.mm(), user, &found, user.user_id())
        .await
        .map_err(|e| WebError::database(Indicator::get_resource_type(), e))?;

    found
        .delete(state.mm(), user)
        .await
        .map_err(|e| WebError::database(Indicator::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/rubrics/levels",
    request_body = AchievementLevelCreate,
    responses(
        (status = 200, description = "Achievement level created", body = AchievementLevel),
        (status = 403, description = "Not the rubric owner", body = ErrorResponse),
        (status = 404, description = "Parent indicator not found", body = ErrorResponse),
        (status = 422, description = "Bounds are inverted", body = ErrorResponse),
    ),
    tag = "rubrics"
)]
pub(crate) async fn level_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<AchievementLevelCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let indicator = Indicator::find_by_id(state.mm(), user, payload.indicator_id)
        .await
        .map_err(|e| WebError::database(Indicator::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Indicator::get_resource_type()))?;

    check_access(state.mm(), user, &indicator, user.user_id())
        .await
        .map_err(|e| WebError::database(Indicator::get_resource_type(), e))?;

    let created = AchievementLevel::create(state.mm(), user, payload)
        .await
        .map_err(|e| WebError::database(AchievementLevel::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/v1/rubrics/levels/{id}",
    request_body = AchievementLevelPatch,
    responses(
        (status = 200, description = "Achievement level updated", body = AchievementLevel),
        (status = 403, description = "Not the rubric owner", body = ErrorResponse),
        (status = 404, description = "Achievement level not found", body = ErrorResponse),
        (status = 422, description = "Bounds are inverted", body = ErrorResponse),
    ),
    tag = "rubrics"
)]
pub(crate) async fn level_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<AchievementLevelPatch>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = AchievementLevel::find_by_id(state.mm(), user, id)
        .await
        .map_err(|e| WebError::database(AchievementLevel::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(AchievementLevel::get_resource_type()))?;

    check_access(state.mm(), user, &found, user.user_id())
        .await
        .map_err(|e| WebError::database(AchievementLevel::get_resource_type(), e))?;

    let updated = found
        .update(state.mm(), user, payload)
        .await
        .map_err(|e| WebError::database(AchievementLevel::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/rubrics/levels/{id}",
    responses(
        (status = 200, description = "Achievement level soft-deleted"),
        (status = 403, description = "Not the rubric owner", body = ErrorResponse),
        (status = 404, description = "Achievement level not found", body = ErrorResponse),
    ),
    tag = "rubrics"
)]
pub(crate) async fn level_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = AchievementLevel::find_by_id(state.mm(), user, id)
        .await
        .map_err(|e| WebError::database(AchievementLevel::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(AchievementLevel::get_resource_type()))?;

    check_access(state.mm(), user, &found, user.user_id())
        .await
        .map_err(|e| WebError::database(AchievementLevel::get_resource_type(), e))?;

    found
        .delete(state.mm(), user)
        .await
        .map_err(|e| WebError::database(AchievementLevel::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/rubrics/{id}/purge",
    description = "Physically removes a soft-deleted rubric (admin only)",
    responses(
        (status = 200, description = "Rubric purged"),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Rubric not found", body = ErrorResponse),
    ),
    tag = "rubrics"
)]
pub(crate) async fn rubric_purge_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if user.user_role() != UserRole::Admin {
        return Err(WebError::resource_forbidden(Rubric::get_resource_type()));
    }

    // Purge targets soft-deleted rows too, so bypass the live-rows filter.
    let found: Option<Rubric> = sqlx::query_as("SELECT * FROM rubrics WHERE id = $1")
        .bind(&id)
        .fetch_optional(state.mm().executor())
        .await
        .map_err(|e| WebError::database(Rubric::get_resource_type(), e.into()))?;
    let found = found.ok_or_else(|| WebError::resource_not_found(Rubric::get_resource_type()))?;

    found
        .purge(state.mm(), user)
        .await
        .map_err(|e| WebError::database(Rubric::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/rubrics/indicators/{id}/purge",
    description = "Physically removes a soft-deleted indicator (admin only)",
    responses(
        (status = 200, description = "Indicator purged"),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Indicator not found", body = ErrorResponse),
    ),
    tag = "rubrics"
)]
pub(crate) async fn indicator_purge_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if user.user_role() != UserRole::Admin {
        return Err(WebError::resource_forbidden(Indicator::get_resource_type()));
    }

    let found: Option<Indicator> = sqlx::query_as("SELECT * FROM indicators WHERE id = $1")
        .bind(id)
        .fetch_optional(state.mm().executor())
        .await
        .map_err(|e| WebError::database(Indicator::get_resource_type(), e.into()))?;
    let found =
        found.ok_or_else(|| WebError::resource_not_found(Indicator::get_resource_type()))?;

    found
        .purge(state.mm(), user)
        .await
        .map_err(|e| WebError::database(Indicator::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/rubrics/levels/{id}/purge",
    description = "Physically removes a soft-deleted achievement level (admin only)",
    responses(
        (status = 200, description = "Achievement level purged"),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Achievement level not found", body = ErrorResponse),
    ),
    tag = "rubrics"
)]
pub(crate) async fn level_purge_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if user.user_role() != UserRole::Admin {
        return Err(WebError::resource_forbidden(
            AchievementLevel::get_resource_type(),
        ));
    }

    let found: Option<AchievementLevel> =
        sqlx::query_as("SELECT * FROM achievement_levels WHERE id = $1")
            .bind(id)
            .fetch_optional(state.mm().executor())
            .await
            .map_err(|e| WebError::database(AchievementLevel::get_resource_type(), e.into()))?;
    let found =
        found.ok_or_else(|| WebError::resource_not_found(AchievementLevel::get_resource_type()))?;

    found
        .purge(state.mm(), user)
        .await
        .map_err(|e| WebError::database(AchievementLevel::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}
