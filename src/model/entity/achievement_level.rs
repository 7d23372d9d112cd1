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

/// How an achievement level interprets its bounds: as a percentage band or
/// as a raw score range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LevelKind {
    Porcentaje,
    Rango,
}

impl std::fmt::Display for LevelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Porcentaje => write!(f, "porcentaje"),
            Self::Rango => write!(f, "rango"),
        }
    }
}

impl From<&str> for LevelKind {
    fn from(value: &str) -> Self {
        match value {
            "rango" => Self::Rango,
            _ => Self::Porcentaje,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct AchievementLevel {
    id: i32,
    indicator_id: i32,
    kind: String,
    label: String,
    min_value: i32,
    max_value: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl ResourceTyped for AchievementLevel {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::AchievementLevel
    }
}

impl AchievementLevel {
    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn indicator_id(&self) -> i32 {
        self.indicator_id
    }

    pub fn kind(&self) -> LevelKind {
        LevelKind::from(self.kind.as_str())
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn min_value(&self) -> i32 {
        self.min_value
    }

    pub fn max_value(&self) -> i32 {
        self.max_value
    }
}

fn validate_bounds(min_value: i32, max_value: i32) -> DatabaseResult<()> {
    if min_value > max_value {
        return Err(DatabaseError::validation(
            "min_value",
            "must not exceed max_value",
        ));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct AchievementLevelCreate {
    pub indicator_id: i32,
    pub kind: LevelKind,
    pub label: String,
    pub min_value: i32,
    pub max_value: i32,
}

impl AchievementLevelCreate {
    fn validate(&self) -> DatabaseResult<()> {
        if self.label.trim().is_empty() {
            return Err(DatabaseError::validation("label", "must not be empty"));
        }
        validate_bounds(self.min_value, self.max_value)
    }
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct AchievementLevelPatch {
    #[serde(default)]
    #[schema(value_type = Option<LevelKind>)]
    pub kind: Field<LevelKind>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub label: Field<String>,
    #[serde(default)]
    #[schema(value_type = Option<i32>)]
    pub min_value: Field<i32>,
    #[serde(default)]
    #[schema(value_type = Option<i32>)]
    pub max_value: Field<i32>,
}

#[async_trait]
impl CrudRepository<AchievementLevel, AchievementLevelCreate, AchievementLevelPatch, i32>
    for AchievementLevel
{
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: AchievementLevelCreate,
    ) -> DatabaseResult<Self> {
        data.validate()?;
        let row = sqlx::query_as(
            r#"
            INSERT INTO achievement_levels (indicator_id, kind, label, min_value, max_value)
            VALUES ($1,$2,$3,$4,$5)
            RETURNING *
            "#,
        )
        .bind(data.indicator_id)
        .bind(data.kind.to_string())
        .bind(&data.label)
        .bind(data.min_value)
        .bind(data.max_value)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        patch: AchievementLevelPatch,
    ) -> DatabaseResult<Self> {
        if let Field::Set(label) = &patch.label
            && label.trim().is_empty()
        {
            return Err(DatabaseError::validation("label", "must not be empty"));
        }
        validate_bounds(
            *patch.min_value.resolve(&self.min_value),
            *patch.max_value.resolve(&self.max_value),
        )?;

        if let Field::Set(kind) = patch.kind {
            self.kind = kind.to_string();
        }
        patch.label.apply_to(&mut self.label);
        patch.min_value.apply_to(&mut self.min_value);
        patch.max_value.apply_to(&mut self.max_value);

        sqlx::query(
            r#"
            UPDATE achievement_levels
            SET kind = $1, label = $2, min_value = $3, max_value = $4, updated_at = now()
            WHERE id = $5
            "#,
        )
        .bind(&self.kind)
        .bind(&self.label)
        .bind(self.min_value)
        .bind(self.max_value)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query(
            "UPDATE achievement_levels SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(self.id)
        .execute(mm.executor())
        .await?;
        Ok(())
    }

    async fn purge(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM achievement_levels WHERE id = $1")
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
            sqlx::query_as("SELECT * FROM achievement_levels WHERE id = $1 AND deleted_at IS NULL")
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
            "SELECT * FROM achievement_levels WHERE deleted_at IS NULL ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM achievement_levels WHERE deleted_at IS NULL")
                .fetch_one(mm.executor())
                .await?;

        Ok(result)
    }
}

impl AchievementLevel {
    pub async fn all_by_indicator(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        indicator_id: i32,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM achievement_levels WHERE indicator_id = $1 AND deleted_at IS NULL ORDER BY id",
        )
        .bind(indicator_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }
}

impl_paginatable_for!(
    AchievementLevel,
    AchievementLevelCreate,
    AchievementLevelPatch,
    i32
);

#[async_trait]
impl HasOwner for AchievementLevel {
    type OwnerId = i32;

    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        let indicator = super::Indicator::find_by_id(mm, actor, self.indicator_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        indicator.get_owner_id(mm, actor).await
    }
}
