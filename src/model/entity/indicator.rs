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

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Indicator {
    id: i32,
    rubric_id: String,
    question_id: Option<Uuid>,
    description: String,
    weight: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl ResourceTyped for Indicator {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Indicator
    }
}

impl Indicator {
    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn rubric_id(&self) -> &str {
        &self.rubric_id
    }

    pub fn question_id(&self) -> Option<Uuid> {
        self.question_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn weight(&self) -> i32 {
        self.weight
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct IndicatorCreate {
    pub rubric_id: String,
    pub question_id: Option<Uuid>,
    pub description: String,
    pub weight: Option<i32>,
}

impl IndicatorCreate {
    fn validate(&self) -> DatabaseResult<()> {
        if self.description.trim().is_empty() {
            return Err(DatabaseError::validation(
                "description",
                "must not be empty",
            ));
        }
        if self.weight.unwrap_or(0) < 0 {
            return Err(DatabaseError::validation("weight", "must not be negative"));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct IndicatorPatch {
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub description: Field<String>,
    #[serde(default)]
    #[schema(value_type = Option<i32>)]
    pub weight: Field<i32>,
    #[serde(default)]
    #[schema(value_type = Option<Uuid>)]
    pub question_id: Field<Option<Uuid>>,
}

#[async_trait]
impl CrudRepository<Indicator, IndicatorCreate, IndicatorPatch, i32> for Indicator {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: IndicatorCreate,
    ) -> DatabaseResult<Self> {
        data.validate()?;
        let row = sqlx::query_as(
            r#"
            INSERT INTO indicators (rubric_id, question_id, description, weight)
            VALUES ($1,$2,$3,$4)
            RETURNING *
            "#,
        )
        .bind(&data.rubric_id)
        .bind(data.question_id)
        .bind(&data.description)
        .bind(data.weight.unwrap_or(0))
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        patch: IndicatorPatch,
    ) -> DatabaseResult<Self> {
        if let Field::Set(description) = &patch.description
            && description.trim().is_empty()
        {
            return Err(DatabaseError::validation(
                "description",
                "must not be empty",
            ));
        }
        if *patch.weight.resolve(&self.weight) < 0 {
            return Err(DatabaseError::validation("weight", "must not be negative"));
        }

        patch.description.apply_to(&mut self.description);
        patch.weight.apply_to(&mut self.weight);
        patch.question_id.apply_to(&mut self.question_id);

        sqlx::query(
            r#"
            UPDATE indicators
            SET description = $1, weight = $2, question_id = $3, updated_at = now()
            WHERE id = $4
            "#,
        )
        .bind(&self.description)
        .bind(self.weight)
        .bind(self.question_id)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("UPDATE indicators SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn purge(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM indicators WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: i32,
    ) -> DatabaseResult<Option<Self>> {
        let result =
            sqlx::query_as("SELECT * FROM indicators WHERE id = $1 AND deleted_at IS NULL")
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
            "SELECT * FROM indicators WHERE deleted_at IS NULL ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM indicators WHERE deleted_at IS NULL")
                .fetch_one(mm.executor())
                .await?;

        Ok(result)
    }
}

impl Indicator {
    pub async fn all_by_rubric(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        rubric_id: &str,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM indicators WHERE rubric_id = $1 AND deleted_at IS NULL ORDER BY id",
        )
        .bind(rubric_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }
}

impl_paginatable_for!(Indicator, IndicatorCreate, IndicatorPatch, i32);

#[async_trait]
impl HasOwner for Indicator {
    type OwnerId = i32;

    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        let rubric = super::Rubric::find_by_id(mm, actor, self.rubric_id.clone())
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        Ok(rubric.owner_id())
    }
}
