//! Coach assignments to clubs

use std::sync::OnceLock;

use bfg_query::{EntitySchema, FieldDescriptor, FieldKind, RelationDef, SortDirection};

static SCHEMA: OnceLock<EntitySchema> = OnceLock::new();

pub fn schema() -> &'static EntitySchema {
    SCHEMA.get_or_init(build)
}

fn build() -> EntitySchema {
    EntitySchema::builder("clubCoach", "club_coaches")
        .field(FieldDescriptor::new("clubId", "club_id", FieldKind::Uuid))
        .field(FieldDescriptor::new("coachId", "coach_id", FieldKind::Uuid))
        .field(FieldDescriptor::new("assignmentDate", "assignment_date", FieldKind::Date))
        .relation(RelationDef::left("coach", "user", "users", "coach_id"))
        .relation(RelationDef::left("club", "club", "clubs", "club_id"))
        .field(FieldDescriptor::new("coach.lastName", "last_name", FieldKind::Text).on("coach"))
        .field(FieldDescriptor::new("club.name", "name", FieldKind::Text).on("club"))
        .sortable(&["assignmentDate", "coachId"])
        .default_sort("assignmentDate", SortDirection::Desc)
        .facet_counts("clubId", "clubId")
        .build()
}
