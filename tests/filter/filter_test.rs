//! Integration tests for the filter store and its binding.

use chrono::NaiveDate;
use dashql::filter::{
    DateRange, FilterBinding, FilterDef, FilterError, FilterKind, FilterOption, FilterStore, FilterValue,
    PathCondition, PathOperator, SqlFragment,
};
use dashql::template::{parse, resolve};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn offices() -> Vec<FilterOption> {
    ["oslo", "vestland"]
        .iter()
        .map(|slug| FilterOption {
            label: slug.to_string(),
            value: format!("/no/lokalt/{}", slug),
        })
        .collect()
}

fn store() -> FilterStore {
    FilterStore::new(vec![
        FilterDef::new("website_id", FilterKind::Text)
            .required()
            .with_default("35abb2b7-3f97-42ce-931b-cf547d40d967"),
        FilterDef::new(
            "url_sti",
            FilterKind::Path {
                operator: PathOperator::StartsWith,
                options: offices(),
            },
        )
        .with_label("Fylkeskontor")
        .required(),
        FilterDef::new(
            "event_type",
            FilterKind::Select {
                options: vec![
                    FilterOption {
                        label: "Sidevisning".into(),
                        value: "1".into(),
                    },
                    FilterOption {
                        label: "Hendelse".into(),
                        value: "2".into(),
                    },
                ],
            },
        ),
        FilterDef::new("share", FilterKind::Number),
        FilterDef::new(
            "created_at",
            FilterKind::DateRange {
                column: Some("base_query.created_at".into()),
            },
        ),
        FilterDef::new("window", FilterKind::DateRange { column: None }),
    ])
    .unwrap()
}

#[test]
fn test_defaults_are_committed() {
    let store = store();
    assert_eq!(
        store.get("website_id"),
        Some(&FilterValue::text("35abb2b7-3f97-42ce-931b-cf547d40d967"))
    );
    assert!(!store.is_set("url_sti"));
}

#[test]
fn test_required_filters_listed_in_declaration_order() {
    let store = store();
    let missing: Vec<&str> = store.missing_required().map(|d| d.name.as_str()).collect();
    assert_eq!(missing, vec!["url_sti"]);
    assert_eq!(
        store.check_required(),
        Err(FilterError::MissingRequiredFilter("url_sti".into()))
    );
}

#[test]
fn test_options_restrict_values() {
    let mut store = store();
    assert!(store.set_text("url_sti", "/no/lokalt/oslo").is_ok());
    assert!(matches!(
        store.set_text("url_sti", "/no/lokalt/bergen"),
        Err(FilterError::InvalidFilterValue { .. })
    ));
    assert_eq!(
        store.get("url_sti"),
        Some(&FilterValue::Path(PathCondition::new(PathOperator::StartsWith, "/no/lokalt/oslo")))
    );

    assert!(store.set_text("event_type", "2").is_ok());
    assert!(store.set_text("event_type", "3").is_err());
}

#[test]
fn test_numbers() {
    let mut store = store();
    store.set_text("share", "0.25").unwrap();
    assert_eq!(store.get("share"), Some(&FilterValue::Decimal(0.25)));
    store.set_text("share", "-3").unwrap();
    assert_eq!(store.get("share"), Some(&FilterValue::Integer(-3)));
    assert!(store.set_text("share", "NaN").is_err());
    assert!(store.set_text("share", "ten").is_err());
}

#[test]
fn test_single_date_becomes_one_day_range() {
    let mut store = store();
    store.set("window", FilterValue::Date(date(2025, 12, 24))).unwrap();
    assert_eq!(
        store.get("window"),
        Some(&FilterValue::DateRange(DateRange::new(date(2025, 12, 24), date(2025, 12, 24))))
    );
}

#[test]
fn test_binding_exports_columns_and_ranges() {
    let mut store = store();
    store.set_text("url_sti", "/no/lokalt/vestland").unwrap();
    store.set_text("created_at", "..31.12.2025").unwrap();
    store.set_text("window", "01.12.2025..31.12.2025").unwrap();

    let binding = store.binding().unwrap();
    let template = parse(
        "WHERE website_id = '{{website_id}}' AND url_path [[ {{url_sti}} --]] = '/'\n\
         [[AND {{created_at}}]] [[AND day {{window}}]]",
    )
    .unwrap();

    assert_eq!(
        resolve(&template, &binding).unwrap(),
        "WHERE website_id = '35abb2b7-3f97-42ce-931b-cf547d40d967' AND url_path LIKE '/no/lokalt/vestland%'\n\
         AND base_query.created_at < TIMESTAMP('2026-01-01') AND day BETWEEN '2025-12-01' AND '2025-12-31'"
    );
}

#[test]
fn test_cleared_date_range_is_unbound() {
    let mut store = store();
    store.set_text("created_at", "2025-12-01..2025-12-31").unwrap();
    store.set("created_at", FilterValue::DateRange(DateRange::default())).unwrap();
    assert!(!store.binding().unwrap().contains("created_at"));
}

#[test]
fn test_invalid_definitions() {
    assert!(matches!(
        FilterStore::new(vec![FilterDef::new("url sti", FilterKind::Text)]),
        Err(FilterError::InvalidDefinition { .. })
    ));
    assert!(matches!(
        FilterStore::new(vec![
            FilterDef::new("a", FilterKind::Text),
            FilterDef::new("a", FilterKind::Number),
        ]),
        Err(FilterError::InvalidDefinition { .. })
    ));
    assert!(matches!(
        FilterStore::new(vec![FilterDef::new(
            "created_at",
            FilterKind::DateRange {
                column: Some("created_at; DROP".into())
            }
        )]),
        Err(FilterError::InvalidDefinition { .. })
    ));
    assert!(matches!(
        FilterStore::new(vec![FilterDef::new("share", FilterKind::Number).with_default("many")]),
        Err(FilterError::InvalidDefinition { .. })
    ));
}

#[test]
fn test_binding_from_pairs() {
    let binding: FilterBinding = vec![
        ("website_id", FilterValue::text("abc")),
        ("empty", FilterValue::text("")),
        ("condition", SqlFragment::trusted("1 = 1").into()),
    ]
    .into_iter()
    .collect();

    assert_eq!(binding.len(), 2);
    assert!(!binding.contains("empty"));
    assert_eq!(binding.names().collect::<Vec<_>>(), vec!["condition", "website_id"]);
}
