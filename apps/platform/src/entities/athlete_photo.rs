//! Athlete photo history

use std::sync::OnceLock;

use bfg_query::{EntitySchema, FieldDescriptor, FieldKind, RelationDef, SortDirection};

static SCHEMA: OnceLock<EntitySchema> = OnceLock::new();

pub fn schema() -> &'static EntitySchema {
    SCHEMA.get_or_init(build)
}

fn build() -> EntitySchema {
    EntitySchema::builder("athletePhoto", "athlete_photo_history")
        .field(FieldDescriptor::new("athleteId", "athlete_id", FieldKind::Uuid))
        .field(FieldDescriptor::new("uploadedAt", "uploaded_at", FieldKind::DateTime))
        .relation(RelationDef::left("uploadedByClub", "club", "clubs", "uploaded_by"))
        .field(FieldDescriptor::new("uploadedByClub.name", "name", FieldKind::Text).on("uploadedByClub"))
        .sortable(&["uploadedAt"])
        .default_sort("uploadedAt", SortDirection::Desc)
        .facet_counts("athleteId", "athleteId")
        .build()
}
