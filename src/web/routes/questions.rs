use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, ResourceTyped, check_access,
        entity::{
            Answer, AnswerCreate, AnswerPatch, Exam, Question, QuestionCreate, QuestionPatch,
        },
    },
    web::{
        AppState, RequestContext, UserRole, WebError, WebResult, error::ErrorResponse, middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(question_create_handler))
        .route(
            "/{id}",
            get(question_get_handler)
                .put(question_update_handler)
                .delete(question_delete_handler),
        )
        .route("/{id}/answers", get(answer_list_handler))
        .route("/answers", post(answer_create_handler))
        .route(
            "/answers/{id}",
            put(answer_update_handler).delete(answer_delete_handler),
        )
        .route("/{id}/purge", post(question_purge_handler))
        .route("/answers/{id}/purge", post(answer_purge_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/v1/questions/",
    request_body = QuestionCreate,
    responses(
        (status = 200, description = "Question created", body = Question),
        (status = 403, description = "Students cannot author questions", body = ErrorResponse),
        (status = 404, description = "Parent exam not found", body = ErrorResponse),
        (status = 422, description = "A field failed validation", body = ErrorResponse),
    ),
    tag = "questions"
)]
pub(crate) async fn question_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<QuestionCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if !user.can_manage_catalog() {
        return Err(WebError::resource_forbidden(Question::get_resource_type()));
    }

    Exam::find_by_id(state.mm(), user, payload.exam_id)
        .await
        .map_err(|e| WebError::database(Exam::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Exam::get_resource_type()))?;

    let created = Question::create(state.mm(), user, payload)
        .await
        .map_err(|e| WebError::database(Question::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/questions/{id}",
    responses(
        (status = 200, description = "Question found", body = Question),
        (status = 404, description = "Question not found", body = ErrorResponse),
    ),
    tag = "questions"
)]
pub(crate) async fn question_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let question = Question::find_by_id(state.mm(), user, id)
        .await
        .map_err(|e| WebError::database(Question::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Question::get_resource_type()))?;

    Ok((StatusCode::OK, Json(question)))
}

#[utoipa::path(
    put,
    path = "/api/v1/questions/{id}",
    request_body = QuestionPatch,
    responses(
        (status = 200, description = "Question updated", body = Question),
        (status = 403, description = "Not the owning instructor", body = ErrorResponse),
        (status = 404, description = "Question not found", body = ErrorResponse),
        (status = 422, description = "A field failed validation", body = ErrorResponse),
    ),
    tag = "questions"
)]
pub(crate) async fn question_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuestionPatch>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = Question::find_by_id(state.mm(), user, id)
        .await
        .map_err(|e| WebError::database(Question::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Question::get_resource_type()))?;

    check_access(state.mm(), user, &found, user.user_id())
        .await
        .map_err(|e| WebError::database(Question::get_resource_type(), e))?;

    let updated = found
        .update(state.mm(), user, payload)
        .await
        .map_err(|e| WebError::database(Question::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/questions/{id}",
    responses(
        (status = 200, description = "Question soft-deleted"),
        (status = 403, description = "Not the owning instructor", body = ErrorResponse),
        (status = 404, description = "Question not found", body = ErrorResponse),
    ),
    tag = "questions"
)]
pub(crate) async fn question_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = Question::find_by_id(state.mm(), user, id)
        .await
        .map_err(|e| WebError::database(Question::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Question::get_resource_type()))?;

    check_access(state.mm(), user, &found, user.user_id())
        .await
        .map_err(|e| WebError::database(Question::get_resource_type(), e))?;

    found
        .delete(state.mm(), user)
        .await
        .map_err(|e| WebError::database(Question::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/api/v1/questions/{id}/answers",
    responses(
        (status = 200, description = "Live answer options for the question", body = Vec<Answer>),
    ),
    tag = "questions"
)]
pub(crate) async fn answer_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let answers = Answer::all_by_question(state.mm(), user, id)
        .await
        .map_err(|e| WebError::database(Answer::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(answers)))
}

#[utoipa::path(
    post,
    path = "/api/v1/questions/answers",
    request_body = AnswerCreate,
    responses(
        (status = 200, description = "Answer option created", body = Answer),
        (status = 403, description = "Students cannot author answers", body = ErrorResponse),
        (status = 404, description = "Parent question not found", body = ErrorResponse),
    ),
    tag = "questions"
)]
pub(crate) async fn answer_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<AnswerCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if !user.can_manage_catalog() {
        return Err(WebError::resource_forbidden(Answer::get_resource_type()));
    }

    Question::find_by_id(state.mm(), user, payload.question_id)
        .await
        .map_err(|e| WebError::database(Question::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Question::get_resource_type()))?;

    let created = Answer::create(state.mm(), user, payload)
        .await
        .map_err(|e| WebError::database(Answer::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/v1/questions/answers/{id}",
    request_body = AnswerPatch,
    responses(
        (status = 200, description = "Answer option updated", body = Answer),
        (status = 403, description = "Not the owning instructor", body = ErrorResponse),
        (status = 404, description = "Answer not found", body = ErrorResponse),
    ),
    tag = "questions"
)]
pub(crate) async fn answer_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AnswerPatch>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = Answer::find_by_id(state.mm(), user, id)
        .await
        .map_err(|e| WebError::database(Answer::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Answer::get_resource_type()))?;

    check_access(state.mm(), user, &found, user.user_id())
        .await
        .map_err(|e| WebError::database(Answer::get_resource_type(), e))?;

    let updated = found
        .update(state.mm(), user, payload)
        .await
        .map_err(|e| WebError::database(Answer::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/questions/answers/{id}",
    responses(
        (status = 200, description = "Answer option soft-deleted"),
        (status = 403, description = "Not the owning instructor", body = ErrorResponse),
        (status = 404, description = "Answer not found", body = ErrorResponse),
    ),
    tag = "questions"
)]
pub(crate) async fn answer_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = Answer::find_by_id(state.mm(), user, id)
        .await
        .map_err(|e| WebError::database(Answer::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Answer::get_resource_type()))?;

    check_access(state.mm(), user, &found, user.user_id())
        .await
        .map_err(|e| WebError::database(Answer::get_resource_type(), e))?;

    found
        .delete(state.mm(), user)
        .await
        .map_err(|e| WebError::database(Answer::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/questions/{id}/purge",
    description = "Physically removes a soft-deleted question (admin only)",
    responses(
        (status = 200, description = "Question purged"),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Question not found", body = ErrorResponse),
    ),
    tag = "questions"
)]
pub(crate) async fn question_purge_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if user.user_role() != UserRole::Admin {
        return Err(WebError::resource_forbidden(Question::get_resource_type()));
    }

    // Purge targets soft-deleted rows too, so bypass the live-rows filter.
    let found: Option<Question> = sqlx::query_as("SELECT * FROM questions WHERE id = $1")
        .bind(id)
        .fetch_optional(state.mm().executor())
        .await
        .map_err(|e| WebError::database(Question::get_resource_type(), e.into()))?;
    let found =
        found.ok_or_else(|| WebError::resource_not_found(Question::get_resource_type()))?;

    found
        .purge(state.mm(), user)
        .await
        .map_err(|e| WebError::database(Question::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/questions/answers/{id}/purge",
    description = "Physically removes a soft-deleted answer (admin only)",
    responses(
        (status = 200, description = "Answer purged"),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Answer not found", body = ErrorResponse),
    ),
    tag = "questions"
)]
pub(crate) async fn answer_purge_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if user.user_role() != UserRole::Admin {
        return Err(WebError::resource_forbidden(Answer::get_resource_type()));
    }

    let found: Option<Answer> = sqlx::query_as("SELECT * FROM answers WHERE id = $1")
        .bind(id)
        .fetch_optional(state.mm().executor())
        .await
        .map_err(|e| WebError::database(Answer::get_resource_type(), e.into()))?;
    let found = found.ok_or_else(|| WebError::resource_not_found(Answer::get_resource_type()))?;

    found
        .purge(state.mm(), user)
        .await
        .map_err(|e| WebError::database(Answer::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}
