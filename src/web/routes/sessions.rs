use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    model::{
        ResourceTyped, check_access,
        entity::{ExamSession, History, QuestionAttempt},
    },
    web::{
        AppState, RequestContext, UserRole, WebError, WebResult,
        dto::sessions::{
            SessionAdvanceRequest, SessionAnswerRequest, SessionProgressResponse, SessionResponse,
            SessionStartRequest,
        },
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(session_start_handler).get(session_list_handler))
        .route("/{id}", get(session_get_handler).delete(session_delete_handler))
        .route("/{id}/progress", get(session_progress_handler))
        .route("/{id}/advance", post(session_advance_handler))
        .route("/{id}/answer", post(session_answer_handler))
        .route("/{id}/finish", post(session_finish_handler))
        .route("/history", get(history_list_handler))
        .route("/history/{id}", delete(history_delete_handler))
        .route("/history/exam/{exam_id}", get(history_for_exam_handler))
        .route(
            "/history/exam/{exam_id}/count",
            get(history_count_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

/// Loads a session and verifies the caller may act on it.
async fn owned_session(
    state: &AppState,
    ctx: &RequestContext,
    id: Uuid,
) -> WebResult<ExamSession> {
    let user = ctx.user()?;
    let session = ExamSession::find_by_id(state.mm(), user, id)
        .await
        .map_err(|e| WebError::database(ExamSession::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(ExamSession::get_resource_type()))?;

    check_access(state.mm(), user, &session, user.user_id())
        .await
        .map_err(|e| WebError::database(ExamSession::get_resource_type(), e))?;

    Ok(session)
}

#[utoipa::path(
    post,
    path = "/api/v1/sessions/",
    request_body = SessionStartRequest,
    responses(
        (status = 200, description = "Session started", body = ExamSession),
        (status = 404, description = "Exam not found", body = ErrorResponse),
        (status = 409, description = "A live session for this exam already exists", body = ErrorResponse),
    ),
    tag = "sessions"
)]
pub(crate) async fn session_start_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<SessionStartRequest>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let session = ExamSession::start(state.mm(), user, payload.exam_id)
        .await
        .map_err(|e| WebError::database(ExamSession::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(session)))
}

#[utoipa::path(
    get,
    path = "/api/v1/sessions/",
    responses(
        (status = 200, description = "The caller's live sessions", body = Vec<ExamSession>),
    ),
    tag = "sessions"
)]
pub(crate) async fn session_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let sessions = ExamSession::all_by_user(state.mm(), user, user.user_id())
        .await
        .map_err(|e| WebError::database(ExamSession::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(sessions)))
}

#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}",
    responses(
        (status = 200, description = "Session and its current attempt", body = SessionResponse),
        (status = 403, description = "Not the session owner", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
    ),
    tag = "sessions"
)]
pub(crate) async fn session_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let session = owned_session(&state, &ctx, id).await?;

    let current_attempt = match session.current_attempt_id() {
        Some(attempt_id) => QuestionAttempt::find_by_id(state.mm(), user, attempt_id)
            .await
            .map_err(|e| WebError::database(QuestionAttempt::get_resource_type(), e))?,
        None => None,
    };

    Ok((
        StatusCode::OK,
        Json(SessionResponse::new(session, current_attempt)),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/sessions/{id}",
    responses(
        (status = 200, description = "Session soft-deleted"),
        (status = 403, description = "Not the session owner", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
    ),
    tag = "sessions"
)]
pub(crate) async fn session_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let session = owned_session(&state, &ctx, id).await?;

    session
        .soft_delete(state.mm(), user)
        .await
        .map_err(|e| WebError::database(ExamSession::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}/progress",
    responses(
        (status = 200, description = "Session and all of its attempts", body = SessionProgressResponse),
        (status = 403, description = "Not the session owner", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
    ),
    tag = "sessions"
)]
pub(crate) async fn session_progress_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let session = owned_session(&state, &ctx, id).await?;

    let attempts = QuestionAttempt::all_by_session(state.mm(), user, session.id())
        .await
        .map_err(|e| WebError::database(QuestionAttempt::get_resource_type(), e))?;

    Ok((
        StatusCode::OK,
        Json(SessionProgressResponse::new(session, attempts)),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/sessions/{id}/advance",
    request_body = SessionAdvanceRequest,
    description = "Moves the current-question pointer, creating the attempt on first visit",
    responses(
        (status = 200, description = "Pointer moved", body = SessionResponse),
        (status = 403, description = "Not the session owner", body = ErrorResponse),
        (status = 404, description = "Session or question not found", body = ErrorResponse),
        (status = 409, description = "Session already completed", body = ErrorResponse),
    ),
    tag = "sessions"
)]
pub(crate) async fn session_advance_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SessionAdvanceRequest>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let session = owned_session(&state, &ctx, id).await?;

    let (session, attempt) = session
        .advance(state.mm(), user, payload.question_id)
        .await
        .map_err(|e| WebError::database(ExamSession::get_resource_type(), e))?;

    Ok((
        StatusCode::OK,
        Json(SessionResponse::new(session, Some(attempt))),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/sessions/{id}/answer",
    request_body = SessionAnswerRequest,
    description = "Records the selected answer on one of the session's attempts",
    responses(
        (status = 200, description = "Answer recorded", body = QuestionAttempt),
        (status = 403, description = "Not the session owner", body = ErrorResponse),
        (status = 404, description = "Session, attempt or answer not found", body = ErrorResponse),
        (status = 409, description = "Session already completed", body = ErrorResponse),
    ),
    tag = "sessions"
)]
pub(crate) async fn session_answer_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SessionAnswerRequest>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let session = owned_session(&state, &ctx, id).await?;

    let attempt = session
        .answer(state.mm(), user, payload.attempt_id, payload.answer_id)
        .await
        .map_err(|e| WebError::database(ExamSession::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(attempt)))
}

#[utoipa::path(
    post,
    path = "/api/v1/sessions/{id}/finish",
    description = "Completes the session and records the score snapshot; repeat calls are no-ops",
    responses(
        (status = 200, description = "Session completed", body = ExamSession),
        (status = 403, description = "Not the session owner", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
    ),
    tag = "sessions"
)]
pub(crate) async fn session_finish_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let session = owned_session(&state, &ctx, id).await?;

    let session = session
        .finish(state.mm(), user)
        .await
        .map_err(|e| WebError::database(ExamSession::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(session)))
}

#[utoipa::path(
    get,
    path = "/api/v1/sessions/history",
    responses(
        (status = 200, description = "The caller's score history", body = Vec<History>),
    ),
    tag = "sessions"
)]
pub(crate) async fn history_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let history = History::all_by_user(state.mm(), user, user.user_id())
        .await
        .map_err(|e| WebError::database(History::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(history)))
}

#[utoipa::path(
    get,
    path = "/api/v1/sessions/history/exam/{exam_id}",
    responses(
        (status = 200, description = "The caller's score for the exam", body = History),
        (status = 404, description = "No score recorded for this exam", body = ErrorResponse),
    ),
    tag = "sessions"
)]
pub(crate) async fn history_for_exam_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(exam_id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let history = History::find_for(state.mm(), user, user.user_id(), exam_id)
        .await
        .map_err(|e| WebError::database(History::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(History::get_resource_type()))?;

    Ok((StatusCode::OK, Json(history)))
}

#[utoipa::path(
    get,
    path = "/api/v1/sessions/history/exam/{exam_id}/count",
    description = "How many students have a recorded score for the exam",
    responses(
        (status = 200, description = "Recorded score count", body = i64),
        (status = 403, description = "Students cannot read exam-wide counts", body = ErrorResponse),
    ),
    tag = "sessions"
)]
pub(crate) async fn history_count_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(exam_id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if !user.can_manage_catalog() {
        return Err(WebError::resource_forbidden(History::get_resource_type()));
    }

    let count = History::count_for_exam(state.mm(), user, exam_id)
        .await
        .map_err(|e| WebError::database(History::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(count)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/sessions/history/{id}",
    description = "Clears a recorded score so the exam may be re-taken and re-recorded",
    responses(
        (status = 200, description = "History entry soft-deleted"),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "History entry not found", body = ErrorResponse),
    ),
    tag = "sessions"
)]
pub(crate) async fn history_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if user.user_role() != UserRole::Admin {
        return Err(WebError::resource_forbidden(History::get_resource_type()));
    }

    let found = History::find_by_id(state.mm(), user, id)
        .await
        .map_err(|e| WebError::database(History::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(History::get_resource_type()))?;

    found
        .soft_delete(state.mm(), user)
        .await
        .map_err(|e| WebError::database(History::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}
