use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// One student's interaction with one question inside one exam session.
///
/// Rows are created lazily by the session's advance operation, never through
/// a generic CRUD surface; a question that was never shown has no row at all
/// (the `Unvisited` state).
#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct QuestionAttempt {
    id: Uuid,
    session_id: Uuid,
    question_id: Uuid,
    answer_id: Option<Uuid>,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AttemptStatus {
    Visited,
    Answered,
}

impl ResourceTyped for QuestionAttempt {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::QuestionAttempt
    }
}

impl QuestionAttempt {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn question_id(&self) -> Uuid {
        self.question_id
    }

    pub fn answer_id(&self) -> Option<Uuid> {
        self.answer_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn status(&self) -> AttemptStatus {
        if self.answer_id.is_some() {
            AttemptStatus::Answered
        } else {
            AttemptStatus::Visited
        }
    }

    pub async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result =
            sqlx::query_as("SELECT * FROM question_attempts WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .fetch_optional(mm.executor())
                .await?;
        Ok(result)
    }

    pub async fn all_by_session(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        session_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            r#"
            SELECT * FROM question_attempts
            WHERE session_id = $1 AND deleted_at IS NULL
            ORDER BY started_at
            "#,
        )
        .bind(session_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }
}
