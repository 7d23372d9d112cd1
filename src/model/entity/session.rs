use crate::model::access::HasOwner;
use crate::model::entity::{ExamKind, QuestionAttempt};
use crate::model::repo::{CrudRepository, ResourceTyped};
use crate::model::{DatabaseError, ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// One student's attempt at one exam.
///
/// The session is the only stateful record in the model: `finished_at` is
/// null while in progress, and `current_attempt_id` points at the question
/// attempt presently shown to the student. The pointer always references an
/// attempt owned by this same session; every transition below runs in a
/// transaction holding a row lock on the session so concurrent writes
/// serialize.
#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct ExamSession {
    id: Uuid,
    user_id: i32,
    exam_id: Uuid,
    finished_at: Option<DateTime<Utc>>,
    current_attempt_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl ResourceTyped for ExamSession {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::ExamSession
    }
}

impl ExamSession {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> i32 {
        self.user_id
    }

    pub fn exam_id(&self) -> Uuid {
        self.exam_id
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn current_attempt_id(&self) -> Option<Uuid> {
        self.current_attempt_id
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }
}

impl ExamSession {
    /// Starts a session for (actor, exam).
    ///
    /// Sync exams are single-attempt: an existing live session is a
    /// `DuplicateSession` error. Async exams may be re-attempted; the
    /// superseded session is soft-deleted inside the same transaction. The
    /// partial unique index on (user_id, exam_id) backs this up, so a racing
    /// second insert surfaces as `DuplicateSession` as well.
    pub async fn start(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        exam_id: Uuid,
    ) -> DatabaseResult<Self> {
        let exam = super::Exam::find_by_id(mm, actor, exam_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        let mut tx = mm.executor().begin().await?;

        let existing: Option<ExamSession> = sqlx::query_as(
            r#"
            SELECT * FROM exam_sessions
            WHERE user_id = $1 AND exam_id = $2 AND deleted_at IS NULL
            FOR UPDATE
            "#,
        )
        .bind(actor.user_id())
        .bind(exam_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(existing) = existing {
            match exam.kind() {
                ExamKind::Sync => return Err(DatabaseError::DuplicateSession),
                ExamKind::Async => {
                    sqlx::query("UPDATE exam_sessions SET deleted_at = now() WHERE id = $1")
                        .bind(existing.id)
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }

        let created: ExamSession = sqlx::query_as(
            r#"
            INSERT INTO exam_sessions (id, user_id, exam_id)
            VALUES ($1,$2,$3)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor.user_id())
        .bind(exam_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            let e = DatabaseError::from(e);
            if e.is_unique_violation() {
                DatabaseError::DuplicateSession
            } else {
                e
            }
        })?;

        tx.commit().await?;
        Ok(created)
    }

    /// Moves the session's current-question pointer to `question_id`,
    /// creating the question attempt on first visit. `started_at` survives
    /// revisits; the old pointer is replaced atomically with the new one.
    pub async fn advance(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        question_id: Uuid,
    ) -> DatabaseResult<(Self, QuestionAttempt)> {
        let mut tx = mm.executor().begin().await?;

        let session = Self::lock(&mut tx, self.id).await?;
        if session.is_finished() {
            return Err(DatabaseError::SessionCompleted);
        }

        // The target question must belong to the exam this session runs.
        let belongs: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM questions WHERE id = $1 AND exam_id = $2 AND deleted_at IS NULL",
        )
        .bind(question_id)
        .bind(session.exam_id)
        .fetch_optional(&mut *tx)
        .await?;
        if belongs.is_none() {
            return Err(sqlx::Error::RowNotFound.into());
        }

        let attempt: QuestionAttempt = sqlx::query_as(
            r#"
            INSERT INTO question_attempts (id, session_id, question_id)
            VALUES ($1,$2,$3)
            ON CONFLICT (session_id, question_id)
            DO UPDATE SET updated_at = now()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(session.id)
        .bind(question_id)
        .fetch_one(&mut *tx)
        .await?;

        let session: ExamSession = sqlx::query_as(
            r#"
            UPDATE exam_sessions
            SET current_attempt_id = $1, updated_at = now()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(attempt.id())
        .bind(session.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((session, attempt))
    }

    /// Records the selected answer on one of this session's attempts.
    /// An attempt owned by a different session is reported as
    /// `AttemptNotFound` — the cross-session tampering check.
    pub async fn answer(
        &self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        attempt_id: Uuid,
        answer_id: Uuid,
    ) -> DatabaseResult<QuestionAttempt> {
        let mut tx = mm.executor().begin().await?;

        let session = Self::lock(&mut tx, self.id).await?;
        if session.is_finished() {
            return Err(DatabaseError::SessionCompleted);
        }

        let attempt: Option<QuestionAttempt> =
            sqlx::query_as("SELECT * FROM question_attempts WHERE id = $1 AND deleted_at IS NULL")
                .bind(attempt_id)
                .fetch_optional(&mut *tx)
                .await?;
        let attempt = match attempt {
            Some(a) if a.session_id() == session.id => a,
            _ => return Err(DatabaseError::AttemptNotFound),
        };

        // The chosen answer must answer the attempt's question.
        let belongs: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM answers WHERE id = $1 AND question_id = $2 AND deleted_at IS NULL",
        )
        .bind(answer_id)
        .bind(attempt.question_id())
        .fetch_optional(&mut *tx)
        .await?;
        if belongs.is_none() {
            return Err(sqlx::Error::RowNotFound.into());
        }

        // Last write wins on revisit; started_at is left untouched.
        let attempt: QuestionAttempt = sqlx::query_as(
            r#"
            UPDATE question_attempts
            SET answer_id = $1, ended_at = now(), updated_at = now()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(answer_id)
        .bind(attempt.id())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(attempt)
    }

    /// Completes the session: stamps `finished_at`, clears the pointer and
    /// writes the score snapshot. Finishing an already-finished session is
    /// an idempotent no-op returning the stored row.
    pub async fn finish(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<Self> {
        let mut tx = mm.executor().begin().await?;

        let session = Self::lock(&mut tx, self.id).await?;
        if session.is_finished() {
            tx.commit().await?;
            return Ok(session);
        }

        // Questions or answers withdrawn mid-session no longer count.
        let score: i32 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(q.points), 0)::INT
            FROM question_attempts qa
            JOIN answers a ON a.id = qa.answer_id AND a.deleted_at IS NULL
            JOIN questions q ON q.id = qa.question_id AND q.deleted_at IS NULL
            WHERE qa.session_id = $1 AND qa.deleted_at IS NULL AND a.is_correct
            "#,
        )
        .bind(session.id)
        .fetch_one(&mut *tx)
        .await?;

        let session: ExamSession = sqlx::query_as(
            r#"
            UPDATE exam_sessions
            SET finished_at = now(), current_attempt_id = NULL, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(session.id)
        .fetch_one(&mut *tx)
        .await?;

        // Exactly one live history row per (user, exam); a prior attempt's
        // score is kept.
        sqlx::query(
            r#"
            INSERT INTO history (id, user_id, exam_id, score)
            VALUES ($1,$2,$3,$4)
            ON CONFLICT (user_id, exam_id) WHERE deleted_at IS NULL DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(session.user_id)
        .bind(session.exam_id)
        .bind(score)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(session)
    }

    async fn lock(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: Uuid,
    ) -> DatabaseResult<Self> {
        let session: Option<ExamSession> = sqlx::query_as(
            "SELECT * FROM exam_sessions WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
        session.ok_or_else(|| sqlx::Error::RowNotFound.into())
    }

    pub async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result =
            sqlx::query_as("SELECT * FROM exam_sessions WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .fetch_optional(mm.executor())
                .await?;
        Ok(result)
    }

    pub async fn all_by_user(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: i32,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            r#"
            SELECT * FROM exam_sessions
            WHERE user_id = $1 AND deleted_at IS NULL
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn soft_delete(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<()> {
        sqlx::query(
            "UPDATE exam_sessions SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(self.id)
        .execute(mm.executor())
        .await?;
        Ok(())
    }
}

#[async_trait]
impl HasOwner for ExamSession {
    type OwnerId = i32;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.user_id)
    }
}
