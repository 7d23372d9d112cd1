use crate::impl_paginatable_for;
use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{Field, ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::{AuthenticatedUser, UserRole};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct User {
    id: i32,
    name: String,
    email: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl ResourceTyped for User {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::User
    }
}

impl User {
    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> UserRole {
        UserRole::from(self.role.as_str())
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct UserCreate {
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl UserCreate {
    pub fn validate(&self) -> DatabaseResult<()> {
        if self.name.trim().is_empty() {
            return Err(crate::model::DatabaseError::validation(
                "name",
                "must not be empty",
            ));
        }
        if self.email.trim().is_empty() {
            return Err(crate::model::DatabaseError::validation(
                "email",
                "must not be empty",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UserPatch {
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub name: Field<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub email: Field<String>,
    #[serde(default)]
    #[schema(value_type = Option<UserRole>)]
    pub role: Field<UserRole>,
}

impl UserPatch {
    fn validate(&self) -> DatabaseResult<()> {
        if let Field::Set(name) = &self.name
            && name.trim().is_empty()
        {
            return Err(crate::model::DatabaseError::validation(
                "name",
                "must not be empty",
            ));
        }
        if let Field::Set(email) = &self.email
            && email.trim().is_empty()
        {
            return Err(crate::model::DatabaseError::validation(
                "email",
                "must not be empty",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl CrudRepository<User, UserCreate, UserPatch, i32> for User {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: UserCreate,
    ) -> DatabaseResult<Self> {
        data.validate()?;
        let row = sqlx::query_as(
            r#"
            INSERT INTO users (name, email, role)
            VALUES ($1,$2,$3)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.email)
        .bind(data.role.to_string())
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        patch: UserPatch,
    ) -> DatabaseResult<Self> {
        patch.validate()?;
        patch.name.apply_to(&mut self.name);
        patch.email.apply_to(&mut self.email);
        if let Field::Set(role) = patch.role {
            self.role = role.to_string();
        }

        sqlx::query(
            "UPDATE users SET name = $1, email = $2, role = $3, updated_at = now() WHERE id = $4",
        )
        .bind(&self.name)
        .bind(&self.email)
        .bind(&self.role)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("UPDATE users SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn purge(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL")
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
            "SELECT * FROM users WHERE deleted_at IS NULL ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE deleted_at IS NULL")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl User {
    pub async fn find_by_email(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        email: &str,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM users WHERE email = $1 AND deleted_at IS NULL")
            .bind(email)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }
}

impl_paginatable_for!(User, UserCreate, UserPatch, i32);

#[async_trait]
impl HasOwner for User {
    type OwnerId = i32;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.id)
    }
}
