//! Clubs

use std::sync::OnceLock;

use bfg_query::{ColumnRef, EntitySchema, FieldDescriptor, FieldKind, Operator, RelationDef, SortDirection};

static SCHEMA: OnceLock<EntitySchema> = OnceLock::new();

pub fn schema() -> &'static EntitySchema {
    SCHEMA.get_or_init(build)
}

fn build() -> EntitySchema {
    EntitySchema::builder("club", "clubs")
        .field(FieldDescriptor::new("name", "name", FieldKind::Text))
        .field(FieldDescriptor::new("shortName", "short_name", FieldKind::Text))
        .field(FieldDescriptor::new("cardPrefix", "card_prefix", FieldKind::Text).without(Operator::In))
        .field(FieldDescriptor::new("isActive", "is_active", FieldKind::Boolean))
        .alias("clubStatus", "isActive")
        .field(FieldDescriptor::new("createdAt", "created_at", FieldKind::DateTime))
        .field(FieldDescriptor::new("modifiedAt", "modified_at", FieldKind::DateTime))
        .field(FieldDescriptor::new("clubAdminId", "club_admin", FieldKind::Uuid))
        .relation(RelationDef::left("clubAdminUser", "user", "users", "club_admin"))
        .field(
            FieldDescriptor::new("clubAdminUser.lastName", "last_name", FieldKind::Text)
                .on("clubAdminUser")
                .without(Operator::In),
        )
        .field(
            FieldDescriptor::new("clubAdminUser.username", "username", FieldKind::Text)
                .on("clubAdminUser")
                .without(Operator::In),
        )
        .sortable(&["name", "shortName", "isActive", "cardPrefix", "createdAt"])
        .default_sort("name", SortDirection::Asc)
        .search_text(ColumnRef::root("name"))
        .search_text(ColumnRef::root("short_name"))
        .search_text(ColumnRef::root("card_prefix"))
        .facet_counts("isActive", "isActive")
        .build()
}
