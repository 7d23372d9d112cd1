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
        entity::{Course, CourseCreate, CoursePatch, Exam},
    },
    web::{
        AppState, RequestContext, UserRole, WebError, WebResult, error::ErrorResponse, middlewares,
        routes::PaginationQuery,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(course_create_handler))
        .route("/page", get(course_list_handler))
        .route(
            "/{id}",
            get(course_get_handler)
                .put(course_update_handler)
                .delete(course_delete_handler),
        )
        .route("/{id}/exams", get(course_exams_handler))
        .route("/{id}/purge", post(course_purge_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/",
    request_body = CourseCreate,
    responses(
        (status = 200, description = "Course created", body = Course),
        (status = 403, description = "Students cannot create courses", body = ErrorResponse),
        (status = 422, description = "A field failed validation", body = ErrorResponse),
    ),
    tag = "courses"
)]
pub(crate) async fn course_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<CourseCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if !user.can_manage_catalog() {
        return Err(WebError::resource_forbidden(Course::get_resource_type()));
    }

    let created = Course::create(state.mm(), user, payload)
        .await
        .map_err(|e| WebError::database(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/page",
    responses(
        (status = 200, description = "Returns requested page", body = crate::model::Page<Course>),
    ),
    tag = "courses"
)]
pub(crate) async fn course_list_handler(
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let courses = Course::page(state.mm(), user, page.limit, page.offset)
        .await
        .map_err(|e| WebError::database(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(courses)))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}",
    responses(
        (status = 200, description = "Course found", body = Course),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    tag = "courses"
)]
pub(crate) async fn course_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let found = Course::find_by_id(state.mm(), user, id)
        .await
        .map_err(|e| WebError::database(Course::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Course::get_resource_type()))?;

    Ok((StatusCode::OK, Json(found)))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}/exams",
    responses(
        (status = 200, description = "Exams of the course", body = Vec<Exam>),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    tag = "courses"
)]
pub(crate) async fn course_exams_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = Course::find_by_id(state.mm(), user, id)
        .await
        .map_err(|e| WebError::database(Course::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Course::get_resource_type()))?;

    let exams = Exam::all_by_course(state.mm(), user, course.id())
        .await
        .map_err(|e| WebError::database(Exam::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(exams)))
}

#[utoipa::path(
    put,
    path = "/api/v1/courses/{id}",
    request_body = CoursePatch,
    responses(
        (status = 200, description = "Course updated", body = Course),
        (status = 403, description = "Not the course owner", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 422, description = "A field failed validation", body = ErrorResponse),
    ),
    tag = "courses"
)]
pub(crate) async fn course_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<CoursePatch>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = Course::find_by_id(state.mm(), user, id)
        .await
        .map_err(|e| WebError::database(Course::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Course::get_resource_type()))?;

    check_access(state.mm(), user, &found, user.user_id())
        .await
        .map_err(|e| WebError::database(Course::get_resource_type(), e))?;

    let updated = found
        .update(state.mm(), user, payload)
        .await
        .map_err(|e| WebError::database(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}",
    responses(
        (status = 200, description = "Course soft-deleted"),
        (status = 403, description = "Not the course owner", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    tag = "courses"
)]
pub(crate) async fn course_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = Course::find_by_id(state.mm(), user, id)
        .await
        .map_err(|e| WebError::database(Course::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Course::get_resource_type()))?;

    check_access(state.mm(), user, &found, user.user_id())
        .await
        .map_err(|e| WebError::database(Course::get_resource_type(), e))?;

    found
        .delete(state.mm(), user)
        .await
        .map_err(|e| WebError::database(Course::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/purge",
    description = "Physically removes a soft-deleted course (admin only)",
    responses(
        (status = 200, description = "Course purged"),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    tag = "courses"
)]
pub(crate) async fn course_purge_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if user.user_role() != UserRole::Admin {
        return Err(WebError::resource_forbidden(Course::get_resource_type()));
    }

    // Purge targets soft-deleted rows too, so bypass the live-rows filter.
    let found: Option<Course> = sqlx::query_as("SELECT * FROM courses WHERE id = $1")
        .bind(&id)
        .fetch_optional(state.mm().executor())
        .await
        .map_err(|e| WebError::database(Course::get_resource_type(), e.into()))?;
    let found = found.ok_or_else(|| WebError::resource_not_found(Course::get_resource_type()))?;

    found
        .purge(state.mm(), user)
        .await
        .map_err(|e| WebError::database(Course::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}
