//! Filter, search, sort and facet behaviour against the in-memory backend

mod test_support;

use bfg_query::memory::MemoryBackend;
use bfg_query::{
    compile_filter, parse_filter, Error, ExpandSet, FacetOption, FacetResult, ListQuery, Value,
};
use test_support::{club_a, date, ids, plan, schema, sorted_ids, table};

#[test]
fn equality_returns_exact_subset() {
    assert_eq!(sorted_ids("year eq 2024", ""), vec![2, 4]);
    assert_eq!(sorted_ids("year ne 2024", ""), vec![1, 3]);
}

#[test]
fn ordering_operators() {
    assert_eq!(sorted_ids("year gt 2023", ""), vec![2, 3, 4]);
    assert_eq!(sorted_ids("year ge 2024 and year lt 2025", ""), vec![2, 4]);
    assert_eq!(sorted_ids("year le 2023", ""), vec![1]);
}

#[test]
fn precedence_and_grouping() {
    // 2023 or (ACTIVE and 2024)
    assert_eq!(
        sorted_ids("year eq 2023 or status eq ACTIVE and year eq 2024", ""),
        vec![1, 2]
    );
    // (2023 or ACTIVE) and 2024
    assert_eq!(
        sorted_ids("(year eq 2023 or status eq ACTIVE) and year eq 2024", ""),
        vec![2]
    );
}

#[test]
fn open_ranges() {
    assert_eq!(sorted_ids("year range '' to 2024", ""), vec![1, 2, 4]);
    assert_eq!(sorted_ids("year range 2024 to ''", ""), vec![2, 3, 4]);
    assert_eq!(sorted_ids("year range 2024 to 2024", ""), vec![2, 4]);
    assert_eq!(sorted_ids("year range '' to ''", ""), vec![1, 2, 3, 4]);
}

#[test]
fn in_lists() {
    assert_eq!(sorted_ids("year in (2023, 2025)", ""), vec![1, 3]);
    let filter = format!("clubId in ('{}')", club_a());
    assert_eq!(sorted_ids(&filter, ""), vec![1, 3]);
}

#[test]
fn strings_compare_case_insensitively() {
    assert_eq!(sorted_ids("accreditationNumber eq 'a-001'", ""), vec![1]);
    assert_eq!(sorted_ids("accreditationNumber ne 'A-001'", ""), vec![2, 3, 4]);
}

#[test]
fn enum_literals_are_normalized_and_nulls_never_match() {
    assert_eq!(sorted_ids("status eq 'active'", ""), vec![1, 2]);
    assert_eq!(sorted_ids("status ne ACTIVE", ""), vec![3]);
}

#[test]
fn unexpanded_relation_clause_is_skipped() {
    let gated = sorted_ids("athlete.dateOfBirth ge 2000-01-01 and year ge 2024", "");
    let without_clause = sorted_ids("year ge 2024", "");
    assert_eq!(gated, without_clause);
}

#[test]
fn expanded_relation_clause_is_applied() {
    assert_eq!(
        sorted_ids("athlete.dateOfBirth ge 2000-01-01 and year ge 2024", "athlete"),
        vec![2, 3]
    );
    let plan = plan(&test_support::filter_query("athlete.dateOfBirth ge 2000-01-01", "athlete")).unwrap();
    assert_eq!(plan.relations(), ExpandSet::from(["athlete".to_string()]));
}

#[test]
fn alias_on_relation_joins_without_expand() {
    let query = test_support::filter_query("dateOfBirth lt 2000-01-01", "");
    let plan = plan(&query).unwrap();
    assert!(plan.requested_expand.is_empty());
    assert_eq!(plan.relations(), ExpandSet::from(["athlete".to_string()]));
    assert_eq!(ids(&query), vec![1]);
}

#[test]
fn datetime_bounds() {
    assert_eq!(sorted_ids("createdAt ge 2024-01-01", ""), Vec::<i64>::new());
}

#[test]
fn compile_errors_are_distinguishable() {
    let err = plan(&test_support::filter_query("color eq 'red'", "")).unwrap_err();
    assert_eq!(err, Error::UnsupportedField("color".into()));

    let err = plan(&test_support::filter_query("accreditationNumber gt 'A'", "")).unwrap_err();
    assert!(matches!(err, Error::UnsupportedOperator { ref operator, .. } if operator == "gt"));

    let err = plan(&test_support::filter_query("status range 'A' to 'B'", "")).unwrap_err();
    assert!(matches!(err, Error::UnsupportedOperator { ref operator, .. } if operator == "range"));

    let err = plan(&test_support::filter_query("year eq abc", "")).unwrap_err();
    assert!(matches!(err, Error::InvalidValue { ref kind, .. } if kind == "integer"));

    let err = plan(&test_support::filter_query("status eq 'GONE'", "")).unwrap_err();
    assert!(matches!(err, Error::InvalidValue { ref kind, .. } if kind == "enum"));

    let err = plan(&test_support::filter_query("clubId eq 42", "")).unwrap_err();
    assert!(matches!(err, Error::InvalidValue { ref kind, .. } if kind == "uuid"));
}

#[test]
fn field_names_are_case_sensitive() {
    let err = plan(&test_support::filter_query("Year eq 2024", "")).unwrap_err();
    assert_eq!(err, Error::UnsupportedField("Year".into()));
}

#[test]
fn syntax_errors_fail_before_compilation() {
    let err = plan(&test_support::filter_query("status eq 'ACTIVE", "")).unwrap_err();
    assert!(err.position().is_some_and(|p| p <= "status eq 'ACTIVE".len()));
}

#[test]
fn compiling_twice_is_identical() {
    let parsed = parse_filter("year range 2020 to 2024 or status eq ACTIVE", &ExpandSet::new()).unwrap();
    let first = compile_filter(&parsed.expr, schema(), &mut MemoryBackend::new()).unwrap();
    let second = compile_filter(&parsed.expr, schema(), &mut MemoryBackend::new()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn search_matches_any_column_for_every_term() {
    let query = |search: &str| ListQuery {
        search: Some(search.to_string()),
        ..ListQuery::default()
    };
    assert_eq!(ids(&query("ivanov")), vec![1]);
    assert_eq!(ids(&query("b-00")), vec![3, 4]);
    assert_eq!(ids(&query("a-00 PET")), vec![2]);
    assert_eq!(ids(&query("2001-02-03")), vec![2]);
    assert_eq!(ids(&query("   ")).len(), 4);
}

#[test]
fn default_sort_is_total() {
    // year desc, then id asc
    assert_eq!(ids(&ListQuery::default()), vec![3, 2, 4, 1]);
}

#[test]
fn paging_over_sorted_rows() {
    let query = ListQuery {
        sort: Some("year_asc".into()),
        skip: Some(1),
        top: Some(2),
        ..ListQuery::default()
    };
    assert_eq!(ids(&query), vec![2, 4]);
}

#[test]
fn sort_on_expanded_relation_puts_nulls_last() {
    let query = ListQuery {
        sort: Some("athlete.lastName_asc".into()),
        expand: Some("athlete".into()),
        ..ListQuery::default()
    };
    assert_eq!(ids(&query), vec![3, 1, 2, 4]);

    let unexpanded = ListQuery {
        sort: Some("athlete.lastName_asc".into()),
        ..ListQuery::default()
    };
    assert!(matches!(plan(&unexpanded), Err(Error::UnexpandedSortField { .. })));
}

#[test]
fn invalid_expand_is_rejected() {
    let err = plan(&test_support::filter_query("", "athlete,coach")).unwrap_err();
    assert!(matches!(err, Error::InvalidExpand { ref invalid, .. } if invalid == &vec!["coach".to_string()]));
}

#[test]
fn facet_counts_exclude_null() {
    let plan = plan(&ListQuery::default()).unwrap();
    let status = schema().facets().iter().find(|f| f.name == "status").unwrap();
    assert_eq!(
        table().facet(&plan, status).unwrap(),
        FacetResult::Counts(vec![
            FacetOption { value: "ACTIVE".into(), count: 2 },
            FacetOption { value: "EXPIRED".into(), count: 1 },
        ])
    );
}

#[test]
fn facets_follow_the_filter() {
    let plan = plan(&test_support::filter_query("year ge 2024", "")).unwrap();
    let facets = schema().facets();

    let status = table().facet(&plan, &facets[0]).unwrap();
    assert_eq!(
        status,
        FacetResult::Counts(vec![
            FacetOption { value: "ACTIVE".into(), count: 1 },
            FacetOption { value: "EXPIRED".into(), count: 1 },
        ])
    );

    let range = table().facet(&plan, &facets[2]).unwrap();
    match range {
        FacetResult::Range(range) => {
            assert_eq!(range.min, Some(Value::Date(date("2001-02-03"))));
            assert_eq!(range.max, Some(Value::Date(date("2005-07-08"))));
        }
        other => panic!("expected range, got {other:?}"),
    }
}

#[test]
fn count_ignores_paging() {
    let query = ListQuery {
        top: Some(1),
        ..ListQuery::default()
    };
    let plan = plan(&query).unwrap();
    assert_eq!(table().fetch(&plan).len(), 1);
    assert_eq!(table().count(&plan), 4);
}

#[test]
fn extreme_integer_bounds() {
    assert_eq!(sorted_ids("year range '' to -9223372036854775808", ""), Vec::<i64>::new());
    assert_eq!(sorted_ids("year range -9223372036854775808 to ''", ""), vec![1, 2, 3, 4]);
    assert_eq!(sorted_ids("year range '' to 9223372036854775807", ""), vec![1, 2, 3, 4]);

    let err = plan(&test_support::filter_query("year range '' to 9223372036854775808", "")).unwrap_err();
    assert!(matches!(err, Error::InvalidValue { ref kind, .. } if kind == "integer"));
}

#[test]
fn text_in_lists_ignore_case() {
    assert_eq!(sorted_ids("accreditationNumber in ('a-001', 'B-003')", ""), vec![1, 3]);
    assert_eq!(
        sorted_ids("athlete.lastName in ('IVANOV', 'petrova')", "athlete"),
        vec![1, 2]
    );
}

#[test]
fn quoted_whitespace_is_part_of_the_value() {
    assert_eq!(sorted_ids("accreditationNumber eq ' A-001'", ""), Vec::<i64>::new());
    assert_eq!(sorted_ids("accreditationNumber eq 'A-001'", ""), vec![1]);

    // A blank bound is not an open one
    let err = plan(&test_support::filter_query("year range ' ' to 2024", "")).unwrap_err();
    assert!(matches!(err, Error::InvalidValue { ref kind, .. } if kind == "integer"));
}

#[test]
fn long_clause_chains_compile_and_match() {
    let conjunction = vec!["year eq 2024"; 10_000].join(" and ");
    let parsed = parse_filter(&conjunction, &ExpandSet::new()).unwrap();
    compile_filter(&parsed.expr, schema(), &mut MemoryBackend::new()).unwrap();
    assert_eq!(sorted_ids(&conjunction, ""), vec![2, 4]);

    let disjunction = vec!["year eq 2023"; 10_000].join(" or ");
    assert_eq!(sorted_ids(&disjunction, ""), vec![1]);
}
