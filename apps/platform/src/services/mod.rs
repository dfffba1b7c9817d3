//! Business logic layer

pub mod list;

pub use list::{ListResult, ListService, ListStore};
