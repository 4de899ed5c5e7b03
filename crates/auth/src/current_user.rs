//! Host-supplied user capability.

use serde::{Deserialize, Serialize};

use storefront_core::UserId;

/// Identity facts the hosting application asserts about the current user.
///
/// The host maps whatever its session provider returns onto this shape; the
/// core never sees a provider-specific session object. Constructed through
/// [`CurrentUser::guest`], [`CurrentUser::authenticated`] or
/// [`CurrentUser::admin`], which keep the invariants `id ⇔ authenticated`
/// and `admin ⇒ authenticated`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    id: Option<UserId>,
    is_admin: bool,
    is_authenticated: bool,
}

impl CurrentUser {
    /// Anonymous visitor.
    pub fn guest() -> Self {
        Self {
            id: None,
            is_admin: false,
            is_authenticated: false,
        }
    }

    /// Signed-in user.
    pub fn authenticated(id: UserId) -> Self {
        Self {
            id: Some(id),
            is_admin: false,
            is_authenticated: true,
        }
    }

    /// Signed-in administrator.
    pub fn admin(id: UserId) -> Self {
        Self {
            id: Some(id),
            is_admin: true,
            is_authenticated: true,
        }
    }

    pub fn id(&self) -> Option<UserId> {
        self.id
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }
}
