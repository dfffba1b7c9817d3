//! Accreditations: one athlete's yearly credential with a club

use std::sync::OnceLock;

use bfg_query::{ColumnRef, EntitySchema, FieldDescriptor, FieldKind, Operator, RelationDef, SortDirection};

pub const STATUSES: &[&str] = &[
    "ACTIVE",
    "EXPIRED",
    "PENDING_VALIDATION",
    "NEW_PHOTO_REQUIRED",
    "PENDING_PHOTO_VALIDATION",
];

static SCHEMA: OnceLock<EntitySchema> = OnceLock::new();

pub fn schema() -> &'static EntitySchema {
    SCHEMA.get_or_init(build)
}

fn build() -> EntitySchema {
    EntitySchema::builder("accreditation", "accreditations")
        .field(FieldDescriptor::new("athleteId", "athlete_id", FieldKind::Uuid))
        .field(FieldDescriptor::new("clubId", "club_id", FieldKind::Uuid))
        .field(FieldDescriptor::new("year", "year", FieldKind::Integer))
        .alias("accreditationYear", "year")
        .narrow("accreditationYear", Operator::Range)
        .narrow("accreditationYear", Operator::In)
        .field(FieldDescriptor::new("status", "status", FieldKind::Enum(STATUSES)))
        .alias("accreditationStatus", "status")
        .field(
            FieldDescriptor::new("accreditationNumber", "accreditation_number", FieldKind::Text)
                .without(Operator::In),
        )
        .field(FieldDescriptor::new("createdAt", "created_at", FieldKind::DateTime))
        // Athlete date of birth without expanding the athlete
        .field(
            FieldDescriptor::new("dateOfBirth", "date_of_birth", FieldKind::Date)
                .on("athlete")
                .without(Operator::Range),
        )
        .alias("athleteDateOfBirth", "dateOfBirth")
        .relation(RelationDef::left("athlete", "athlete", "athletes", "athlete_id"))
        .field(FieldDescriptor::new("athlete.dateOfBirth", "date_of_birth", FieldKind::Date).on("athlete"))
        .field(
            FieldDescriptor::new("athlete.firstName", "first_name", FieldKind::Text)
                .on("athlete")
                .without(Operator::In),
        )
        .field(
            FieldDescriptor::new("athlete.middleName", "middle_name", FieldKind::Text)
                .on("athlete")
                .without(Operator::In),
        )
        .field(
            FieldDescriptor::new("athlete.lastName", "last_name", FieldKind::Text)
                .on("athlete")
                .without(Operator::In),
        )
        .field(FieldDescriptor::new("athlete.gender", "gender", FieldKind::Text).on("athlete"))
        .relation(RelationDef::left("club", "club", "clubs", "club_id"))
        .field(FieldDescriptor::new("club.name", "name", FieldKind::Text).on("club"))
        .field(FieldDescriptor::new("club.shortName", "short_name", FieldKind::Text).on("club"))
        .field(FieldDescriptor::new("club.isActive", "is_active", FieldKind::Boolean).on("club"))
        .sortable(&[
            "year",
            "accreditationNumber",
            "createdAt",
            "athlete.dateOfBirth",
            "athlete.firstName",
            "athlete.lastName",
            "club.name",
        ])
        .default_sort("year", SortDirection::Desc)
        .search_text(ColumnRef::on("athlete", "first_name"))
        .search_text(ColumnRef::on("athlete", "middle_name"))
        .search_text(ColumnRef::on("athlete", "last_name"))
        .search_text(ColumnRef::on("club", "name"))
        .search_text(ColumnRef::root("accreditation_number"))
        .search_date(ColumnRef::on("athlete", "date_of_birth"))
        .facet_counts("athleteId", "athleteId")
        .facet_counts("clubId", "clubId")
        .facet_counts("accreditationYear", "year")
        .facet_counts("status", "status")
        .facet_range("dateOfBirth", "athlete.dateOfBirth")
        .build()
}
