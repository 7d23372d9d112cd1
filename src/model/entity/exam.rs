use crate::impl_paginatable_for;
use crate::model::access::HasOwner;
use crate::model::entity::StateType;
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

/// `Sync` exams are a single sit-down attempt; `Async` exams may be
/// re-attempted, superseding the previous session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExamKind {
    Sync,
    Async,
}

impl std::fmt::Display for ExamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sync => write!(f, "sync"),
            Self::Async => write!(f, "async"),
        }
    }
}

impl From<&str> for ExamKind {
    fn from(value: &str) -> Self {
        match value {
            "async" => Self::Async,
            _ => Self::Sync,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Exam {
    id: Uuid,
    title: String,
    weight: i32,
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
    kind: String,
    state_id: i32,
    course_id: String,
    created_by: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl ResourceTyped for Exam {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Exam
    }
}

impl Exam {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn weight(&self) -> i32 {
        self.weight
    }

    pub fn starts_at(&self) -> Option<DateTime<Utc>> {
        self.starts_at
    }

    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        self.ends_at
    }

    pub fn kind(&self) -> ExamKind {
        ExamKind::from(self.kind.as_str())
    }

    pub fn state_id(&self) -> i32 {
        self.state_id
    }

    pub fn course_id(&self) -> &str {
        &self.course_id
    }

    pub fn created_by(&self) -> i32 {
        self.created_by
    }

    pub async fn state_kind(
        &self,
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<Option<StateType>> {
        let state = super::State::find_by_id(mm, actor, self.state_id).await?;
        Ok(state.and_then(|s| s.kind()))
    }
}

fn validate_window(
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
) -> DatabaseResult<()> {
    if let (Some(start), Some(end)) = (starts_at, ends_at)
        && start > end
    {
        return Err(DatabaseError::validation(
            "starts_at",
            "must not be after ends_at",
        ));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ExamCreate {
    pub title: String,
    pub weight: Option<i32>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub kind: ExamKind,
    pub state_id: i32,
    pub course_id: String,
}

impl ExamCreate {
    fn validate(&self) -> DatabaseResult<()> {
        if self.title.trim().is_empty() {
            return Err(DatabaseError::validation("title", "must not be empty"));
        }
        if self.weight.unwrap_or(0) < 0 {
            return Err(DatabaseError::validation("weight", "must not be negative"));
        }
        validate_window(self.starts_at, self.ends_at)
    }
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct ExamPatch {
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub title: Field<String>,
    #[serde(default)]
    #[schema(value_type = Option<i32>)]
    pub weight: Field<i32>,
    #[serde(default)]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub starts_at: Field<Option<DateTime<Utc>>>,
    #[serde(default)]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub ends_at: Field<Option<DateTime<Utc>>>,
    #[serde(default)]
    #[schema(value_type = Option<ExamKind>)]
    pub kind: Field<ExamKind>,
    #[serde(default)]
    #[schema(value_type = Option<i32>)]
    pub state_id: Field<i32>,
}

#[async_trait]
impl CrudRepository<Exam, ExamCreate, ExamPatch, Uuid> for Exam {
    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: ExamCreate,
    ) -> DatabaseResult<Self> {
        data.validate()?;
        let row = sqlx::query_as(
            r#"
            INSERT INTO exams (id, title, weight, starts_at, ends_at, kind, state_id, course_id, created_by)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.title)
        .bind(data.weight.unwrap_or(0))
        .bind(data.starts_at)
        .bind(data.ends_at)
        .bind(data.kind.to_string())
        .bind(data.state_id)
        .bind(&data.course_id)
        .bind(actor.user_id())
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        patch: ExamPatch,
    ) -> DatabaseResult<Self> {
        if let Field::Set(title) = &patch.title
            && title.trim().is_empty()
        {
            return Err(DatabaseError::validation("title", "must not be empty"));
        }
        if *patch.weight.resolve(&self.weight) < 0 {
            return Err(DatabaseError::validation("weight", "must not be negative"));
        }
        validate_window(
            *patch.starts_at.resolve(&self.starts_at),
            *patch.ends_at.resolve(&self.ends_at),
        )?;

        patch.title.apply_to(&mut self.title);
        patch.weight.apply_to(&mut self.weight);
        patch.starts_at.apply_to(&mut self.starts_at);
        patch.ends_at.apply_to(&mut self.ends_at);
        if let Field::Set(kind) = patch.kind {
            self.kind = kind.to_string();
        }
        patch.state_id.apply_to(&mut self.state_id);

        sqlx::query(
            r#"
            UPDATE exams
            SET title = $1, weight = $2, starts_at = $3, ends_at = $4,
                kind = $5, state_id = $6, updated_at = now()
            WHERE id = $7
            "#,
        )
        .bind(&self.title)
        .bind(self.weight)
        .bind(self.starts_at)
        .bind(self.ends_at)
        .bind(&self.kind)
        .bind(self.state_id)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("UPDATE exams SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn purge(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM exams WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM exams WHERE id = $1 AND deleted_at IS NULL")
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
            "SELECT * FROM exams WHERE deleted_at IS NULL ORDER BY created_at LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM exams WHERE deleted_at IS NULL")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl Exam {
    pub async fn all_by_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: &str,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM exams WHERE course_id = $1 AND deleted_at IS NULL ORDER BY created_at",
        )
        .bind(course_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }
}

impl_paginatable_for!(Exam, ExamCreate, ExamPatch, Uuid);

#[async_trait]
impl HasOwner for Exam {
    type OwnerId = i32;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.created_by)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn window_accepts_open_ends() {
        assert!(validate_window(None, None).is_ok());
        assert!(validate_window(Some(ts("2026-01-01T00:00:00Z")), None).is_ok());
        assert!(validate_window(None, Some(ts("2026-01-01T00:00:00Z"))).is_ok());
    }

    #[test]
    fn window_rejects_inverted_bounds() {
        let err = validate_window(
            Some(ts("2026-02-01T00:00:00Z")),
            Some(ts("2026-01-01T00:00:00Z")),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::Validation {
                field: "starts_at",
                ..
            }
        ));
    }

    #[test]
    fn window_accepts_equal_bounds() {
        let at = ts("2026-01-01T00:00:00Z");
        assert!(validate_window(Some(at), Some(at)).is_ok());
    }

    #[test]
    fn unknown_kind_defaults_to_sync() {
        assert_eq!(ExamKind::from("async"), ExamKind::Async);
        assert_eq!(ExamKind::from("whatever"), ExamKind::Sync);
    }
}
