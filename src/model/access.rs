use crate::{
    model::{
        ModelManager,
        error::{DatabaseError, DatabaseResult},
    },
    web::{AuthenticatedUser, UserRole},
};

/// Resources that belong to a single user. Ownership may live on the row
/// itself or require walking up to a parent (an answer resolves through its
/// question's exam, for example), hence the database handle.
#[async_trait::async_trait]
pub trait HasOwner {
    type OwnerId: PartialEq + Send + Sync;
    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        ctx: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId>;
}

pub async fn check_access<T: HasOwner<OwnerId = O>, O: PartialEq + Send + Sync>(
    mm: &ModelManager,
    ctx: &AuthenticatedUser,
    resource: &T,
    expected: O,
) -> DatabaseResult<()> {
    // admins see everything, no point resolving the owner
    if ctx.user_role() == UserRole::Admin {
        return Ok(());
    }

    if resource.get_owner_id(mm, ctx).await? == expected {
        Ok(())
    } else {
        Err(DatabaseError::Forbidden)
    }
}
