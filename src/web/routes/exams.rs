use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, PaginatableRepository, ResourceTyped, check_access,
        entity::{Answer, Course, Exam, ExamCreate, ExamPatch, Question},
    },
    web::{
        AppState, RequestContext, UserRole, WebError, WebResult,
        dto::exams::ExamDetailResponse, error::ErrorResponse, middlewares,
        routes::PaginationQuery,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(exam_create_handler))
        .route("/page", get(exam_list_handler))
        .route(
            "/{id}",
            get(exam_get_handler)
                .put(exam_update_handler)
                .delete(exam_delete_handler),
        )
        .route("/{id}/purge", post(exam_purge_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/v1/exams/",
    request_body = ExamCreate,
    responses(
        (status = 200, description = "Exam created", body = Exam),
        (status = 403, description = "Students cannot create exams", body = ErrorResponse),
        (status = 404, description = "Parent course not found", body = ErrorResponse),
        (status = 422, description = "A field failed validation", body = ErrorResponse),
    ),
    tag = "exams"
)]
pub(crate) async fn exam_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<ExamCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if !user.can_manage_catalog() {
        return Err(WebError::resource_forbidden(Exam::get_resource_type()));
    }

    Course::find_by_id(state.mm(), user, payload.course_id.clone())
        .await
        .map_err(|e| WebError::database(Course::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Course::get_resource_type()))?;

    let created = Exam::create(state.mm(), user, payload)
        .await
        .map_err(|e| WebError::database(Exam::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/exams/page",
    responses(
        (status = 200, description = "Returns requested page", body = crate::model::Page<Exam>),
    ),
    tag = "exams"
)]
pub(crate) async fn exam_list_handler(
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let exams = Exam::page(state.mm(), user, page.limit, page.offset)
        .await
        .map_err(|e| WebError::database(Exam::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(exams)))
}

#[utoipa::path(
    get,
    path = "/api/v1/exams/{id}",
    description = "Exam with its full question and answer tree",
    responses(
        (status = 200, description = "Exam found", body = ExamDetailResponse),
        (status = 404, description = "Exam not found", body = ErrorResponse),
    ),
    tag = "exams"
)]
pub(crate) async fn exam_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let exam = Exam::find_by_id(state.mm(), user, id)
        .await
        .map_err(|e| WebError::database(Exam::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Exam::get_resource_type()))?;

    let questions = Question::all_by_exam(state.mm(), user, exam.id())
        .await
        .map_err(|e| WebError::database(Question::get_resource_type(), e))?;

    let mut tree = Vec::with_capacity(questions.len());
    for question in questions {
        let answers = Answer::all_by_question(state.mm(), user, question.id())
            .await
            .map_err(|e| WebError::database(Answer::get_resource_type(), e))?;
        tree.push((question, answers));
    }

    Ok((
        StatusCode::OK,
        Json(ExamDetailResponse::from_entities(exam, tree)),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/exams/{id}",
    request_body = ExamPatch,
    description = "Applies a partial update; omitted fields keep their value",
    responses(
        (status = 200, description = "Exam updated", body = Exam),
        (status = 403, description = "Not the exam owner", body = ErrorResponse),
        (status = 404, description = "Exam not found", body = ErrorResponse),
        (status = 422, description = "A field failed validation", body = ErrorResponse),
    ),
    tag = "exams"
)]
pub(crate) async fn exam_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ExamPatch>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = Exam::find_by_id(state.mm(), user, id)
        .await
        .map_err(|e| WebError::database(Exam::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Exam::get_resource_type()))?;

    check_access(state.mm(), user, &found, user.user_id())
        .await
        .map_err(|e| WebError::database(Exam::get_resource_type(), e))?;

    let updated = found
        .update(state.mm(), user, payload)
        .await
        .map_err(|e| WebError::database(Exam::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/exams/{id}",
    responses(
        (status = 200, description = "Exam soft-deleted"),
        (status = 403, description = "Not the exam owner", body = ErrorResponse),
        (status = 404, description = "Exam not found", body = ErrorResponse),
    ),
    tag = "exams"
)]
pub(crate) async fn exam_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = Exam::find_by_id(state.mm(), user, id)
        .await
        .map_err(|e| WebError::database(Exam::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Exam::get_resource_type()))?;

    check_access(state.mm(), user, &found, user.user_id())
        .await
        .map_err(|e| WebError::database(Exam::get_resource_type(), e))?;

    found
        .delete(state.mm(), user)
        .await
        .map_err(|e| WebError::database(Exam::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/exams/{id}/purge",
    description = "Physically removes a soft-deleted exam (admin only)",
    responses(
        (status = 200, description = "Exam purged"),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Exam not found", body = ErrorResponse),
    ),
    tag = "exams"
)]
pub(crate) async fn exam_purge_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if user.user_role() != UserRole::Admin {
        return Err(WebError::resource_forbidden(Exam::get_resource_type()));
    }

    // Purge targets soft-deleted rows too, so bypass the live-rows filter.
    let found: Option<Exam> = sqlx::query_as("SELECT * FROM exams WHERE id = $1")
        .bind(id)
        .fetch_optional(state.mm().executor())
        .await
        .map_err(|e| WebError::database(Exam::get_resource_type(), e.into()))?;
    let found = found.ok_or_else(|| WebError::resource_not_found(Exam::get_resource_type()))?;

    found
        .purge(state.mm(), user)
        .await
        .map_err(|e| WebError::database(Exam::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}
