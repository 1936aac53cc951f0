//! HTTP surface: the route guard, page and auth endpoints, configuration.

pub mod app;
pub mod config;
pub mod context;
pub mod guard;
pub mod middleware;
