//! `tableside-client` — client-side session state shared by independent UI components.

pub mod store;

pub use store::{Session, SessionContext, SessionStore};
