//! Platform users (administrators and coaches)

use std::sync::OnceLock;

use bfg_query::{ColumnRef, EntitySchema, FieldDescriptor, FieldKind, Operator, SortDirection};

pub const ROLES: &[&str] = &["APP_ADMIN", "FEDERATION_ADMIN", "CLUB_ADMIN", "COACH"];

static SCHEMA: OnceLock<EntitySchema> = OnceLock::new();

pub fn schema() -> &'static EntitySchema {
    SCHEMA.get_or_init(build)
}

fn build() -> EntitySchema {
    let text = |name: &str, column: &str| FieldDescriptor::new(name, column, FieldKind::Text).without(Operator::In);

    EntitySchema::builder("user", "users")
        .field(text("firstName", "first_name"))
        .field(text("lastName", "last_name"))
        .field(text("username", "username"))
        .field(FieldDescriptor::new("role", "role", FieldKind::Enum(ROLES)))
        .field(FieldDescriptor::new("isActive", "is_active", FieldKind::Boolean))
        .alias("status", "isActive")
        .field(FieldDescriptor::new("createdAt", "created_at", FieldKind::DateTime))
        .field(FieldDescriptor::new("modifiedAt", "modified_at", FieldKind::DateTime))
        .sortable(&["lastName", "firstName", "username", "role", "createdAt"])
        .default_sort("lastName", SortDirection::Asc)
        .search_text(ColumnRef::root("first_name"))
        .search_text(ColumnRef::root("last_name"))
        .search_text(ColumnRef::root("username"))
        .facet_counts("role", "role")
        .build()
}
