//! `tableside-auth` — pure access-control vocabulary (zero IO).
//!
//! Role predicates defined here are evaluated identically by the server-side
//! route guard and the client-side session store. This crate is intentionally
//! decoupled from HTTP, storage, and the identity provider.

pub mod navigation;
pub mod permissions;
pub mod roles;
pub mod user;

pub use navigation::{NavItem, NAVIGATION, section_allows, visible_navigation};
pub use permissions::{
    RoleSet, can_manage_inventory, can_manage_orders, has_role, is_manager, is_owner,
};
pub use roles::{Role, UnknownRole};
pub use user::{User, validate_password, validate_registration};
