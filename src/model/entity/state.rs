use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

/// Lifecycle states an exam (or other catalog row) can be in. Seeded by the
/// initial migration; the table itself is read-only at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StateType {
    Activo,
    Inconcluso,
    Disponible,
    Suspendido,
    Inactivo,
    Finalizado,
}

impl std::fmt::Display for StateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Activo => "activo",
            Self::Inconcluso => "inconcluso",
            Self::Disponible => "disponible",
            Self::Suspendido => "suspendido",
            Self::Inactivo => "inactivo",
            Self::Finalizado => "finalizado",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for StateType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "activo" => Ok(Self::Activo),
            "inconcluso" => Ok(Self::Inconcluso),
            "disponible" => Ok(Self::Disponible),
            "suspendido" => Ok(Self::Suspendido),
            "inactivo" => Ok(Self::Inactivo),
            "finalizado" => Ok(Self::Finalizado),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct State {
    id: i32,
    kind: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl ResourceTyped for State {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::State
    }
}

impl State {
    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn kind(&self) -> Option<StateType> {
        self.kind.parse().ok()
    }

    pub async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: i32,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM states WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    pub async fn find_by_kind(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        kind: StateType,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM states WHERE kind = $1 AND deleted_at IS NULL")
            .bind(kind.to_string())
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    pub async fn all(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM states WHERE deleted_at IS NULL ORDER BY id")
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn state_kind_round_trips_through_text() {
        for kind in [
            StateType::Activo,
            StateType::Inconcluso,
            StateType::Disponible,
            StateType::Suspendido,
            StateType::Inactivo,
            StateType::Finalizado,
        ] {
            assert_eq!(kind.to_string().parse::<StateType>(), Ok(kind));
        }
    }

    #[test]
    fn unknown_state_kind_is_rejected() {
        assert!("archived".parse::<StateType>().is_err());
    }
}
