use crate::impl_paginatable_for;
use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{
    DatabaseError, Field, ModelManager, error::DatabaseResult, repo::CrudRepository,
};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

// Several answers of one question may be flagged correct; that is valid
// multi-select data, not an entry fault.
#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Answer {
    id: Uuid,
    question_id: Uuid,
    text: String,
    is_correct: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl ResourceTyped for Answer {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Answer
    }
}

impl Answer {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn question_id(&self) -> Uuid {
        self.question_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_correct(&self) -> bool {
        self.is_correct
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct AnswerCreate {
    pub question_id: Uuid,
    pub text: String,
    pub is_correct: Option<bool>,
}

impl AnswerCreate {
    fn validate(&self) -> DatabaseResult<()> {
        if self.text.trim().is_empty() {
            return Err(DatabaseError::validation("text", "must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct AnswerPatch {
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub text: Field<String>,
    #[serde(default)]
    #[schema(value_type = Option<bool>)]
    pub is_correct: Field<bool>,
}

#[async_trait]
impl CrudRepository<Answer, AnswerCreate, AnswerPatch, Uuid> for Answer {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: AnswerCreate,
    ) -> DatabaseResult<Self> {
        data.validate()?;
        let row = sqlx::query_as(
            r#"
            INSERT INTO answers (id, question_id, text, is_correct)
            VALUES ($1,$2,$3,$4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.question_id)
        .bind(&data.text)
        .bind(data.is_correct.unwrap_or(false))
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        patch: AnswerPatch,
    ) -> DatabaseResult<Self> {
        if let Field::Set(text) = &patch.text
            && text.trim().is_empty()
        {
            return Err(DatabaseError::validation("text", "must not be empty"));
        }

        patch.text.apply_to(&mut self.text);
        patch.is_correct.apply_to(&mut self.is_correct);

        sqlx::query(
            "UPDATE answers SET text = $1, is_correct = $2, updated_at = now() WHERE id = $3",
        )
        .bind(&self.text)
        .bind(self.is_correct)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("UPDATE answers SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn purge(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM answers WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM answers WHERE id = $1 AND deleted_at IS NULL")
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
            "SELECT * FROM answers WHERE deleted_at IS NULL ORDER BY created_at LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM answers WHERE deleted_at IS NULL")
                .fetch_one(mm.executor())
                .await?;

        Ok(result)
    }
}

impl Answer {
    pub async fn all_by_question(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        question_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM answers WHERE question_id = $1 AND deleted_at IS NULL ORDER BY created_at",
        )
        .bind(question_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }
}

impl_paginatable_for!(Answer, AnswerCreate, AnswerPatch, Uuid);

#[async_trait]
impl HasOwner for Answer {
    type OwnerId = i32;

    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        let question = super::Question::find_by_id(mm, actor, self.question_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        question.get_owner_id(mm, actor).await
    }
}
