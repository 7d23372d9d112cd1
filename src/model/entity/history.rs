use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// Final score snapshot, one live row per (user, exam). Written by the
/// session finish transition and immutable afterwards; only the soft-delete
/// marker may change.
#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct History {
    id: Uuid,
    user_id: i32,
    exam_id: Uuid,
    score: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl ResourceTyped for History {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::History
    }
}

impl History {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> i32 {
        self.user_id
    }

    pub fn exam_id(&self) -> Uuid {
        self.exam_id
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM history WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    pub async fn find_for(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: i32,
        exam_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as(
            r#"
            SELECT * FROM history
            WHERE user_id = $1 AND exam_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(exam_id)
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
            "SELECT * FROM history WHERE user_id = $1 AND deleted_at IS NULL ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn count_for_exam(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        exam_id: Uuid,
    ) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM history WHERE exam_id = $1 AND deleted_at IS NULL",
        )
        .bind(exam_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn soft_delete(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<()> {
        sqlx::query("UPDATE history SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }
}

#[async_trait]
impl HasOwner for History {
    type OwnerId = i32;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.user_id)
    }
}
