//! Athletes

use std::sync::OnceLock;

use bfg_query::{ColumnRef, EntitySchema, FieldDescriptor, FieldKind, Operator, SortDirection};

static SCHEMA: OnceLock<EntitySchema> = OnceLock::new();

pub fn schema() -> &'static EntitySchema {
    SCHEMA.get_or_init(build)
}

fn build() -> EntitySchema {
    let text = |name: &str, column: &str| FieldDescriptor::new(name, column, FieldKind::Text).without(Operator::In);
    let date = |name: &str, column: &str| FieldDescriptor::new(name, column, FieldKind::Date);

    EntitySchema::builder("athlete", "athletes")
        .field(text("firstName", "first_name"))
        .field(text("middleName", "middle_name"))
        .field(text("lastName", "last_name"))
        .field(FieldDescriptor::new("gender", "gender", FieldKind::Text))
        .field(date("dateOfBirth", "date_of_birth"))
        .field(date("medicalExaminationDue", "medical_examination_due"))
        .field(date("insuranceFrom", "insurance_from"))
        .field(date("insuranceTo", "insurance_to"))
        .field(FieldDescriptor::new("registeredOn", "registered_on", FieldKind::DateTime))
        .sortable(&["lastName", "firstName", "dateOfBirth", "registeredOn"])
        .default_sort("lastName", SortDirection::Asc)
        .search_text(ColumnRef::root("first_name"))
        .search_text(ColumnRef::root("middle_name"))
        .search_text(ColumnRef::root("last_name"))
        .search_date(ColumnRef::root("date_of_birth"))
        .facet_counts("gender", "gender")
        .facet_range("dateOfBirth", "dateOfBirth")
        .build()
}
