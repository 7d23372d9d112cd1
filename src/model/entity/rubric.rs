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

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RubricKind {
    Holistic,
    Analytic,
}

impl std::fmt::Display for RubricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Holistic => write!(f, "holistic"),
            Self::Analytic => write!(f, "analytic"),
        }
    }
}

impl From<&str> for RubricKind {
    fn from(value: &str) -> Self {
        match value {
            "analytic" => Self::Analytic,
            _ => Self::Holistic,
        }
    }
}

/// Scoring-criteria catalog entry; pure reference data with no session-level
/// lifecycle. Optionally attached to an exam.
#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Rubric {
    id: String,
    name: String,
    kind: String,
    owner_id: i32,
    exam_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl ResourceTyped for Rubric {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Rubric
    }
}

impl Rubric {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> RubricKind {
        RubricKind::from(self.kind.as_str())
    }

    pub fn owner_id(&self) -> i32 {
        self.owner_id
    }

    pub fn exam_id(&self) -> Option<Uuid> {
        self.exam_id
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct RubricCreate {
    pub name: String,
    pub kind: RubricKind,
    pub exam_id: Option<Uuid>,
}

impl RubricCreate {
    fn validate(&self) -> DatabaseResult<()> {
        if self.name.trim().is_empty() {
            return Err(DatabaseError::validation("name", "must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct RubricPatch {
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub name: Field<String>,
    #[serde(default)]
    #[schema(value_type = Option<RubricKind>)]
    pub kind: Field<RubricKind>,
    #[serde(default)]
    #[schema(value_type = Option<Uuid>)]
    pub exam_id: Field<Option<Uuid>>,
}

#[async_trait]
impl CrudRepository<Rubric, RubricCreate, RubricPatch, String> for Rubric {
    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: RubricCreate,
    ) -> DatabaseResult<Self> {
        data.validate()?;
        let row = sqlx::query_as(
            r#"
            INSERT INTO rubrics (id, name, kind, owner_id, exam_id)
            VALUES ($1,$2,$3,$4,$5)
            RETURNING *
            "#,
        )
        .bind(cuid2::create_id())
        .bind(&data.name)
        .bind(data.kind.to_string())
        .bind(actor.user_id())
        .bind(data.exam_id)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        patch: RubricPatch,
    ) -> DatabaseResult<Self> {
        if let Field::Set(name) = &patch.name
            && name.trim().is_empty()
        {
            return Err(DatabaseError::validation("name", "must not be empty"));
        }

        patch.name.apply_to(&mut self.name);
        if let Field::Set(kind) = patch.kind {
            self.kind = kind.to_string();
        }
        patch.exam_id.apply_to(&mut self.exam_id);

        sqlx::query(
            "UPDATE rubrics SET name = $1, kind = $2, exam_id = $3, updated_at = now() WHERE id = $4",
        )
        .bind(&self.name)
        .bind(&self.kind)
        .bind(self.exam_id)
        .bind(&self.id)
        .execute(mm.executor())
        .await?;

        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("UPDATE rubrics SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL")
            .bind(&self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn purge(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM rubrics WHERE id = $1")
            .bind(&self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: String,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM rubrics WHERE id = $1 AND deleted_at IS NULL")
            .bind(&id)
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
            "SELECT * FROM rubrics WHERE deleted_at IS NULL ORDER BY created_at LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM rubrics WHERE deleted_at IS NULL")
                .fetch_one(mm.executor())
                .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Rubric, RubricCreate, RubricPatch, String);

#[async_trait]
impl HasOwner for Rubric {
    type OwnerId = i32;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.owner_id)
    }
}
