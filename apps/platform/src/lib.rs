//! BFG Platform - list query service
//!
//! Hosts the list endpoints of the administrative backend:
//! - Entity registries (fields, relations, sort allow-lists, facets)
//! - PostgreSQL and in-memory list stores
//! - The list service that plans, fetches, counts and facets
//! - Configuration and logging for the binaries

pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod logging;
pub mod services;

pub use config::Config;
pub use entities::EntityKind;
pub use error::{Error, Result};
