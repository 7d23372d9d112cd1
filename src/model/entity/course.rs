use crate::impl_paginatable_for;
use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{Field, ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

// Courses use collision-resistant short ids rather than uuids.
#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Course {
    id: String,
    name: String,
    description: String,
    owner_id: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl ResourceTyped for Course {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Course
    }
}

impl Course {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn owner_id(&self) -> i32 {
        self.owner_id
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CourseCreate {
    pub name: String,
    pub description: Option<String>,
}

impl CourseCreate {
    fn validate(&self) -> DatabaseResult<()> {
        if self.name.trim().is_empty() {
            return Err(crate::model::DatabaseError::validation(
                "name",
                "must not be empty",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct CoursePatch {
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub name: Field<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub description: Field<String>,
}

impl CoursePatch {
    fn validate(&self) -> DatabaseResult<()> {
        if let Field::Set(name) = &self.name
            && name.trim().is_empty()
        {
            return Err(crate::model::DatabaseError::validation(
                "name",
                "must not be empty",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl CrudRepository<Course, CourseCreate, CoursePatch, String> for Course {
    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: CourseCreate,
    ) -> DatabaseResult<Self> {
        data.validate()?;
        let row = sqlx::query_as(
            r#"
            INSERT INTO courses (id, name, description, owner_id)
            VALUES ($1,$2,$3,$4)
            RETURNING *
            "#,
        )
        .bind(cuid2::create_id())
        .bind(&data.name)
        .bind(data.description.unwrap_or_default())
        .bind(actor.user_id())
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        patch: CoursePatch,
    ) -> DatabaseResult<Self> {
        patch.validate()?;
        patch.name.apply_to(&mut self.name);
        patch.description.apply_to(&mut self.description);

        sqlx::query(
            "UPDATE courses SET name = $1, description = $2, updated_at = now() WHERE id = $3",
        )
        .bind(&self.name)
        .bind(&self.description)
        .bind(&self.id)
        .execute(mm.executor())
        .await?;

        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("UPDATE courses SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL")
            .bind(&self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn purge(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM courses WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM courses WHERE id = $1 AND deleted_at IS NULL")
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
            "SELECT * FROM courses WHERE deleted_at IS NULL ORDER BY created_at LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM courses WHERE deleted_at IS NULL")
                .fetch_one(mm.executor())
                .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Course, CourseCreate, CoursePatch, String);

#[async_trait]
impl HasOwner for Course {
    type OwnerId = i32;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.owner_id)
    }
}
