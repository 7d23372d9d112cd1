use crate::impl_paginatable_for;
use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{
    DatabaseError, Field, ModelManager, error::DatabaseResult, repo::CrudRepository,
};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Question {
    id: Uuid,
    exam_id: Uuid,
    prompt: String,
    points: i32,
    /// Time limit in minutes. NULL means unlimited; zero is legal and means
    /// no time is permitted at all.
    duration_limit: Option<Decimal>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl ResourceTyped for Question {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Question
    }
}

impl Question {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn exam_id(&self) -> Uuid {
        self.exam_id
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn points(&self) -> i32 {
        self.points
    }

    pub fn duration_limit(&self) -> Option<Decimal> {
        self.duration_limit
    }
}

fn validate_duration(duration_limit: Option<Decimal>) -> DatabaseResult<()> {
    if let Some(limit) = duration_limit
        && limit < Decimal::ZERO
    {
        return Err(DatabaseError::validation(
            "duration_limit",
            "must not be negative",
        ));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct QuestionCreate {
    pub exam_id: Uuid,
    pub prompt: String,
    pub points: Option<i32>,
    pub duration_limit: Option<Decimal>,
}

impl QuestionCreate {
    fn validate(&self) -> DatabaseResult<()> {
        if self.prompt.trim().is_empty() {
            return Err(DatabaseError::validation("prompt", "must not be empty"));
        }
        if self.points.unwrap_or(0) < 0 {
            return Err(DatabaseError::validation("points", "must not be negative"));
        }
        validate_duration(self.duration_limit)
    }
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct QuestionPatch {
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub prompt: Field<String>,
    #[serde(default)]
    #[schema(value_type = Option<i32>)]
    pub points: Field<i32>,
    #[serde(default)]
    #[schema(value_type = Option<Decimal>)]
    pub duration_limit: Field<Option<Decimal>>,
}

#[async_trait]
impl CrudRepository<Question, QuestionCreate, QuestionPatch, Uuid> for Question {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuestionCreate,
    ) -> DatabaseResult<Self> {
        data.validate()?;
        let row = sqlx::query_as(
            r#"
            INSERT INTO questions (id, exam_id, prompt, points, duration_limit)
            VALUES ($1,$2,$3,$4,$5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.exam_id)
        .bind(&data.prompt)
        .bind(data.points.unwrap_or(0))
        .bind(data.duration_limit)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        patch: QuestionPatch,
    ) -> DatabaseResult<Self> {
        if let Field::Set(prompt) = &patch.prompt
            && prompt.trim().is_empty()
        {
            return Err(DatabaseError::validation("prompt", "must not be empty"));
        }
        if *patch.points.resolve(&self.points) < 0 {
            return Err(DatabaseError::validation("points", "must not be negative"));
        }
        validate_duration(*patch.duration_limit.resolve(&self.duration_limit))?;

        patch.prompt.apply_to(&mut self.prompt);
        patch.points.apply_to(&mut self.points);
        patch.duration_limit.apply_to(&mut self.duration_limit);

        sqlx::query(
            r#"
            UPDATE questions
            SET prompt = $1, points = $2, duration_limit = $3, updated_at = now()
            WHERE id = $4
            "#,
        )
        .bind(&self.prompt)
        .bind(self.points)
        .bind(self.duration_limit)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("UPDATE questions SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn purge(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM questions WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM questions WHERE deleted_at IS NULL ORDER BY created_at LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE deleted_at IS NULL")
                .fetch_one(mm.executor())
                .await?;

        Ok(result)
    }
}

impl Question {
    pub async fn all_by_exam(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        exam_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM questions WHERE exam_id = $1 AND deleted_at IS NULL ORDER BY created_at",
        )
        .bind(exam_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }
}

impl_paginatable_for!(Question, QuestionCreate, QuestionPatch, Uuid);

#[async_trait]
impl HasOwner for Question {
    type OwnerId = i32;

    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        let exam = super::Exam::find_by_id(mm, actor, self.exam_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        Ok(exam.created_by())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn missing_duration_means_unlimited() {
        assert!(validate_duration(None).is_ok());
    }

    #[test]
    fn zero_duration_is_legal() {
        assert!(validate_duration(Some(Decimal::ZERO)).is_ok());
    }

    #[test]
    fn negative_duration_is_rejected() {
        let err = validate_duration(Some(Decimal::new(-15, 1))).unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::Validation {
                field: "duration_limit",
                ..
            }
        ));
    }
}
