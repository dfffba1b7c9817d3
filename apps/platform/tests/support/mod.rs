#![allow(dead_code)]

use bfg_platform::config::QueryConfig;
use bfg_platform::db::MemoryListStore;
use bfg_platform::services::ListService;
use bfg_platform::EntityKind;
use bfg_query::memory::Record;
use bfg_query::ListQuery;
use chrono::NaiveDate;
use uuid::Uuid;

pub fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

pub fn club_levski() -> Uuid {
    Uuid::parse_str("11111111-1111-1111-1111-111111111111").unwrap()
}

pub fn club_slavia() -> Uuid {
    Uuid::parse_str("22222222-2222-2222-2222-222222222222").unwrap()
}

fn athlete(first_name: &str, last_name: &str, dob: &str) -> Record {
    Record::new()
        .with("first_name", first_name)
        .with("last_name", last_name)
        .with("date_of_birth", date(dob))
}

fn club(id: Uuid, name: &str) -> Record {
    Record::new().with("id", id).with("name", name).with("is_active", true)
}

/// Four accreditations; the last one has no status and no related rows
pub fn accreditations() -> Vec<Record> {
    vec![
        Record::new()
            .with("id", 1)
            .with("year", 2023)
            .with("status", "ACTIVE")
            .with("accreditation_number", "A-001")
            .with("club_id", club_levski())
            .with_relation("athlete", athlete("Ivan", "Ivanov", "1999-05-01"))
            .with_relation("club", club(club_levski(), "Levski")),
        Record::new()
            .with("id", 2)
            .with("year", 2024)
            .with("status", "ACTIVE")
            .with("accreditation_number", "A-002")
            .with("club_id", club_slavia())
            .with_relation("athlete", athlete("Maria", "Petrova", "2001-02-03"))
            .with_relation("club", club(club_slavia(), "Slavia")),
        Record::new()
            .with("id", 3)
            .with("year", 2025)
            .with("status", "EXPIRED")
            .with("accreditation_number", "B-003")
            .with("club_id", club_levski())
            .with_relation("athlete", athlete("Georgi", "Georgiev", "2005-07-08"))
            .with_relation("club", club(club_levski(), "Levski")),
        Record::new()
            .with("id", 4)
            .with("year", 2024)
            .with("accreditation_number", "B-004"),
    ]
}

pub fn store() -> MemoryListStore {
    MemoryListStore::new().with_table(EntityKind::Accreditation, accreditations())
}

pub fn service() -> ListService<MemoryListStore> {
    bfg_platform::logging::init_simple_logging();
    ListService::new(store(), &QueryConfig::default())
}

pub fn query() -> ListQuery {
    ListQuery::default()
}

/// Row ids in response order
pub fn ids(items: &[serde_json::Value]) -> Vec<i64> {
    items
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect()
}
