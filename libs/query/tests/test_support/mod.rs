#![allow(dead_code)]

use std::sync::OnceLock;

use bfg_query::memory::{MemoryBackend, MemoryTable, Record};
use bfg_query::{
    plan_list_query, ColumnRef, EntitySchema, FieldDescriptor, FieldKind, ListQuery, PageLimits, QueryPlan,
    RelationDef, Result, SortDirection, Value,
};
use chrono::NaiveDate;

pub const STATUSES: &[&str] = &["ACTIVE", "EXPIRED", "PENDING_VALIDATION"];

static SCHEMA: OnceLock<EntitySchema> = OnceLock::new();

/// Accreditation-like schema with two expandable relations
pub fn schema() -> &'static EntitySchema {
    SCHEMA.get_or_init(|| {
        EntitySchema::builder("accreditation", "accreditations")
            .field(FieldDescriptor::new("year", "year", FieldKind::Integer))
            .field(FieldDescriptor::new("status", "status", FieldKind::Enum(STATUSES)))
            .field(FieldDescriptor::new("accreditationNumber", "accreditation_number", FieldKind::Text))
            .field(FieldDescriptor::new("createdAt", "created_at", FieldKind::DateTime))
            .field(FieldDescriptor::new("clubId", "club_id", FieldKind::Uuid))
            .field(FieldDescriptor::new("dateOfBirth", "date_of_birth", FieldKind::Date).on("athlete"))
            .field(FieldDescriptor::new("athlete.dateOfBirth", "date_of_birth", FieldKind::Date).on("athlete"))
            .field(FieldDescriptor::new("athlete.lastName", "last_name", FieldKind::Text).on("athlete"))
            .field(FieldDescriptor::new("club.name", "name", FieldKind::Text).on("club"))
            .relation(RelationDef::left("athlete", "athlete", "athletes", "athlete_id"))
            .relation(RelationDef::left("club", "club", "clubs", "club_id"))
            .sortable(&["year", "accreditationNumber", "createdAt"])
            .default_sort("year", SortDirection::Desc)
            .search_text(ColumnRef::on("athlete", "last_name"))
            .search_text(ColumnRef::root("accreditation_number"))
            .search_date(ColumnRef::on("athlete", "date_of_birth"))
            .facet_counts("status", "status")
            .facet_counts("year", "year")
            .facet_range("dateOfBirth", "athlete.dateOfBirth")
            .build()
    })
}

pub fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

pub fn club_a() -> uuid::Uuid {
    uuid::Uuid::parse_str("11111111-1111-1111-1111-111111111111").unwrap()
}

pub fn club_b() -> uuid::Uuid {
    uuid::Uuid::parse_str("22222222-2222-2222-2222-222222222222").unwrap()
}

fn athlete(dob: &str, last_name: &str) -> Record {
    Record::new()
        .with("date_of_birth", date(dob))
        .with("last_name", last_name)
}

fn club(name: &str) -> Record {
    Record::new().with("name", name)
}

/// Four accreditations; row 4 has no status and no relations
pub fn table() -> MemoryTable {
    MemoryTable::new(vec![
        Record::new()
            .with("id", 1)
            .with("year", 2023)
            .with("status", "ACTIVE")
            .with("accreditation_number", "A-001")
            .with("club_id", club_a())
            .with_relation("athlete", athlete("1999-05-01", "Ivanov"))
            .with_relation("club", club("Levski")),
        Record::new()
            .with("id", 2)
            .with("year", 2024)
            .with("status", "ACTIVE")
            .with("accreditation_number", "A-002")
            .with("club_id", club_b())
            .with_relation("athlete", athlete("2001-02-03", "Petrova"))
            .with_relation("club", club("Slavia")),
        Record::new()
            .with("id", 3)
            .with("year", 2025)
            .with("status", "EXPIRED")
            .with("accreditation_number", "B-003")
            .with("club_id", club_a())
            .with_relation("athlete", athlete("2005-07-08", "Georgiev"))
            .with_relation("club", club("Levski")),
        Record::new()
            .with("id", 4)
            .with("year", 2024)
            .with("accreditation_number", "B-004"),
    ])
}

pub fn plan(query: &ListQuery) -> Result<QueryPlan<'static, bfg_query::memory::MemoryPredicate>> {
    let mut backend = MemoryBackend::new();
    plan_list_query(schema(), query, &mut backend, &PageLimits::default())
}

pub fn filter_query(filter: &str, expand: &str) -> ListQuery {
    ListQuery {
        filter: Some(filter.to_string()),
        expand: Some(expand.to_string()),
        ..ListQuery::default()
    }
}

/// Ids of matching rows, in plan order
pub fn ids(query: &ListQuery) -> Vec<i64> {
    let plan = plan(query).unwrap();
    table()
        .fetch(&plan)
        .into_iter()
        .map(|record| match record.values.get("id") {
            Some(Value::Integer(id)) => *id,
            other => panic!("row without id: {other:?}"),
        })
        .collect()
}

pub fn sorted_ids(filter: &str, expand: &str) -> Vec<i64> {
    let mut result = ids(&filter_query(filter, expand));
    result.sort();
    result
}
