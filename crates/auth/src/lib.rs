//! `storefront-auth` — pure authentication capability boundary.
//!
//! This crate is intentionally decoupled from any session provider, token
//! format, or transport. The host authenticates however it likes and hands
//! the core a [`CurrentUser`].

pub mod access;
pub mod current_user;

pub use access::{AccessError, require_admin, require_authenticated};
pub use current_user::CurrentUser;
