//! Request context: the acting user and their role.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::web::{WebResult, error::WebError};

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    user_id: i32,
    user_role: UserRole,
}

impl AuthenticatedUser {
    pub fn new(user_id: i32, user_role: UserRole) -> Self {
        Self { user_id, user_role }
    }

    /// Internal actor for lookups that happen before a request context
    /// exists (middleware, CLI bootstrap). The sentinel id never reaches a
    /// foreign-key column.
    pub fn system() -> Self {
        Self {
            user_role: UserRole::Admin,
            user_id: 0,
        }
    }

    pub fn user_id(&self) -> i32 {
        self.user_id
    }

    pub fn user_role(&self) -> UserRole {
        self.user_role.clone()
    }

    pub fn can_manage_catalog(&self) -> bool {
        matches!(self.user_role, UserRole::Admin | UserRole::Instructor)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Instructor,
    Student,
}

impl From<&str> for UserRole {
    fn from(value: &str) -> Self {
        match value {
            "admin" => Self::Admin,
            "instructor" => Self::Instructor,
            _ => Self::Student,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Instructor => write!(f, "instructor"),
            Self::Student => write!(f, "student"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestContext {
    maybe_user: Option<AuthenticatedUser>,
}

impl RequestContext {
    pub fn new(maybe_user: Option<AuthenticatedUser>) -> Self {
        Self { maybe_user }
    }

    pub fn maybe_user(&self) -> Option<&AuthenticatedUser> {
        self.maybe_user.as_ref()
    }

    pub fn user(&self) -> WebResult<&AuthenticatedUser> {
        self.maybe_user.as_ref().ok_or(WebError::identity_required())
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = parts.extensions.get::<RequestContext>();
        if let Some(ctx) = ctx {
            Ok(ctx.clone())
        } else {
            Ok(RequestContext::new(None))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn role_parses_with_student_fallback() {
        assert_eq!(UserRole::from("admin"), UserRole::Admin);
        assert_eq!(UserRole::from("instructor"), UserRole::Instructor);
        assert_eq!(UserRole::from("student"), UserRole::Student);
        assert_eq!(UserRole::from("anything else"), UserRole::Student);
    }

    #[test]
    fn catalog_management_is_staff_only() {
        assert!(AuthenticatedUser::new(1, UserRole::Admin).can_manage_catalog());
        assert!(AuthenticatedUser::new(2, UserRole::Instructor).can_manage_catalog());
        assert!(!AuthenticatedUser::new(3, UserRole::Student).can_manage_catalog());
    }
}
