use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::{ExamSession, QuestionAttempt};

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct SessionStartRequest {
    pub exam_id: Uuid,
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct SessionAdvanceRequest {
    pub question_id: Uuid,
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct SessionAnswerRequest {
    pub attempt_id: Uuid,
    pub answer_id: Uuid,
}

/// Session plus the attempt its pointer references, if any.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct SessionResponse {
    pub session: ExamSession,
    pub current_attempt: Option<QuestionAttempt>,
}

impl SessionResponse {
    pub fn new(session: ExamSession, current_attempt: Option<QuestionAttempt>) -> Self {
        Self {
            session,
            current_attempt,
        }
    }
}

/// Full progress view: the session and every attempt it owns.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct SessionProgressResponse {
    pub session: ExamSession,
    pub attempts: Vec<QuestionAttempt>,
}

impl SessionProgressResponse {
    pub fn new(session: ExamSession, attempts: Vec<QuestionAttempt>) -> Self {
        Self { session, attempts }
    }
}
