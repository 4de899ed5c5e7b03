//! Access checks for guarded operations.

use thiserror::Error;

use storefront_core::UserId;

use crate::CurrentUser;

#[derive(Debug, Error, Copy, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// The operation needs a signed-in user.
    #[error("authentication required")]
    Unauthenticated,

    /// The operation needs administrator rights.
    #[error("administrator access required")]
    AdminRequired,
}

/// Check that `user` is signed in, yielding the proven identity.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn require_authenticated(user: &CurrentUser) -> Result<UserId, AccessError> {
    match user.id() {
        Some(id) if user.is_authenticated() => Ok(id),
        _ => Err(AccessError::Unauthenticated),
    }
}

/// Check that `user` is a signed-in administrator.
pub fn require_admin(user: &CurrentUser) -> Result<UserId, AccessError> {
    let id = require_authenticated(user)?;
    if user.is_admin() {
        Ok(id)
    } else {
        Err(AccessError::AdminRequired)
    }
}
