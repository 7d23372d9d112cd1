use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;

use crate::{
    error::log_error,
    model::{DatabaseError, ResourceType},
};

pub type WebResult<T> = std::result::Result<T, WebError>;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("IdentityRequired")]
    IdentityRequired,

    #[error("IdentityHeaderInvalid: {value}")]
    IdentityHeaderInvalid { value: String },

    #[error("IdentityUnknownUser: {id}")]
    IdentityUnknownUser { id: i32 },
}

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("ResourceNotFound: {resource_type:?}")]
    ResourceNotFound { resource_type: ResourceType },

    #[error("ResourceForbidden: {resource_type:?}")]
    ResourceForbidden { resource_type: ResourceType },

    #[error("ResourceFetchError: {resource_type:?}. Error: {error}")]
    ResourceFetchError {
        resource_type: ResourceType,
        error: DatabaseError,
    },

    #[error("ResourceValidation: {resource_type:?}, field `{field}`: {reason}")]
    ResourceValidation {
        resource_type: ResourceType,
        field: &'static str,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("SessionDuplicate")]
    SessionDuplicate,

    #[error("SessionAttemptNotFound")]
    SessionAttemptNotFound,

    #[error("SessionCompleted")]
    SessionCompleted,
}

impl IdentityError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::IdentityRequired => StatusCode::UNAUTHORIZED,
            Self::IdentityHeaderInvalid { .. } => StatusCode::BAD_REQUEST,
            Self::IdentityUnknownUser { .. } => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::IdentityRequired => String::from("Identity required."),
            Self::IdentityHeaderInvalid { .. } => {
                String::from("Identity error, header is not a user id.")
            }
            Self::IdentityUnknownUser { .. } => String::from("Identity error, user not found."),
        }
    }
}

impl ResourceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            Self::ResourceForbidden { .. } => StatusCode::FORBIDDEN,
            Self::ResourceFetchError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ResourceValidation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::ResourceNotFound { .. } => String::from("Resource error, resource not found."),
            Self::ResourceForbidden { .. } => String::from("Resource error, resource forbidden."),
            Self::ResourceFetchError { .. } => {
                String::from("Resource error, unable to fetch resource.")
            }
            Self::ResourceValidation { field, reason, .. } => {
                format!("Validation error, field `{field}`: {reason}.")
            }
        }
    }
}

impl SessionError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::SessionDuplicate => StatusCode::CONFLICT,
            Self::SessionAttemptNotFound => StatusCode::NOT_FOUND,
            Self::SessionCompleted => StatusCode::CONFLICT,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::SessionDuplicate => {
                String::from("Session error, a live session for this exam already exists.")
            }
            Self::SessionAttemptNotFound => {
                String::from("Session error, attempt does not belong to this session.")
            }
            Self::SessionCompleted => String::from("Session error, session already completed."),
        }
    }
}

#[derive(Debug, Error)]
pub enum WebError {
    #[error("ResourceError - {0}")]
    ResourceError(#[from] ResourceError),
    #[error("IdentityError - {0}")]
    IdentityError(#[from] IdentityError),
    #[error("SessionError - {0}")]
    SessionError(#[from] SessionError),
}

impl WebError {
    pub fn resource_not_found(r#type: ResourceType) -> Self {
        Self::ResourceError(ResourceError::ResourceNotFound {
            resource_type: r#type,
        })
    }

    pub fn resource_forbidden(r#type: ResourceType) -> Self {
        Self::ResourceError(ResourceError::ResourceForbidden {
            resource_type: r#type,
        })
    }

    pub fn resource_fetch_error(r#type: ResourceType, error: DatabaseError) -> Self {
        Self::ResourceError(ResourceError::ResourceFetchError {
            resource_type: r#type,
            error,
        })
    }

    pub fn identity_required() -> Self {
        Self::IdentityError(IdentityError::IdentityRequired)
    }

    pub fn identity_header_invalid<S: Into<String>>(value: S) -> Self {
        Self::IdentityError(IdentityError::IdentityHeaderInvalid {
            value: value.into(),
        })
    }

    pub fn identity_unknown_user(id: i32) -> Self {
        Self::IdentityError(IdentityError::IdentityUnknownUser { id })
    }

    /// Maps a model-layer failure onto the wire taxonomy. The session and
    /// validation variants carry their own status; anything else is a fetch
    /// failure for `resource_type`.
    pub fn database(resource_type: ResourceType, error: DatabaseError) -> Self {
        match error {
            DatabaseError::Validation { field, reason } => {
                Self::ResourceError(ResourceError::ResourceValidation {
                    resource_type,
                    field,
                    reason,
                })
            }
            DatabaseError::Forbidden => Self::resource_forbidden(resource_type),
            DatabaseError::DuplicateSession => Self::SessionError(SessionError::SessionDuplicate),
            DatabaseError::AttemptNotFound => {
                Self::SessionError(SessionError::SessionAttemptNotFound)
            }
            DatabaseError::SessionCompleted => Self::SessionError(SessionError::SessionCompleted),
            DatabaseError::SqlxError(sqlx::Error::RowNotFound) => {
                Self::resource_not_found(resource_type)
            }
            other => Self::resource_fetch_error(resource_type, other),
        }
    }

    pub fn status_code(&self) -> axum::http::StatusCode {
        match self {
            Self::ResourceError(e) => e.status_code(),
            Self::IdentityError(e) => e.status_code(),
            Self::SessionError(e) => e.status_code(),
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::ResourceError(e) => e.client_display(),
            Self::IdentityError(e) => e.client_display(),
            Self::SessionError(e) => e.client_display(),
        }
    }
}

#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Human-readable message for the client
    pub message: String,
    /// HTTP status code (stringified)
    pub status_code: String,
    /// Optional debug details (only in debug mode)
    pub details: Option<String>,
}

impl IntoResponse for WebError {
    fn into_response(self) -> axum::response::Response {
        log_error(&self);

        let status_code = self.status_code();
        let display = self.client_display();

        let body = ErrorResponse {
            message: display,
            status_code: status_code.as_str().to_string(),
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        };

        (status_code, Json(body)).into_response()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn database_mapping_picks_session_statuses() {
        let err = WebError::database(ResourceType::ExamSession, DatabaseError::DuplicateSession);
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let err = WebError::database(ResourceType::ExamSession, DatabaseError::AttemptNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = WebError::database(ResourceType::ExamSession, DatabaseError::SessionCompleted);
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn database_mapping_surfaces_validation_field() {
        let err = WebError::database(
            ResourceType::Exam,
            DatabaseError::validation("starts_at", "must not be after ends_at"),
        );
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.client_display().contains("starts_at"));
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let err = WebError::database(
            ResourceType::Question,
            DatabaseError::SqlxError(sqlx::Error::RowNotFound),
        );
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
