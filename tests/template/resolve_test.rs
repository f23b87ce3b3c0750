//! Integration tests for template resolution.

use chrono::NaiveDate;
use dashql::filter::{DateRange, FilterBinding, FilterValue, PathCondition, PathOperator, SqlFragment};
use dashql::template::{parse, render, resolve, ResolveError, TemplateError};
use insta::assert_snapshot;

const PATH_QUERY: &str = "WHERE id = '{{website_id}}' AND path = [[ {{url_path}} --]] '/'";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_fallback_replaced_when_trigger_bound() {
    let template = parse(PATH_QUERY).unwrap();
    let binding = FilterBinding::new()
        .with("website_id", "abc")
        .with("url_path", SqlFragment::trusted("starts-with '/foo'"));

    assert_eq!(
        resolve(&template, &binding).unwrap(),
        "WHERE id = 'abc' AND path = starts-with '/foo'"
    );
}

#[test]
fn test_fallback_used_when_trigger_unbound() {
    let template = parse(PATH_QUERY).unwrap();
    let binding = FilterBinding::new().with("website_id", "abc");

    assert_eq!(resolve(&template, &binding).unwrap(), "WHERE id = 'abc' AND path = '/'");
}

#[test]
fn test_block_and_negated_twin_are_exclusive() {
    let template = parse("[[ {{flag}} -- off ]]").unwrap();

    let on = FilterBinding::new().with("flag", "on");
    assert_eq!(resolve(&template, &on).unwrap(), "on");
    assert_eq!(resolve(&template, &FilterBinding::new()).unwrap(), "off");
}

#[test]
fn test_resolution_is_deterministic() {
    let template = parse(PATH_QUERY).unwrap();
    let binding = FilterBinding::new()
        .with("website_id", "abc")
        .with("url_path", SqlFragment::trusted("'/foo'"));

    let first = resolve(&template, &binding).unwrap();
    let second = resolve(&template, &binding).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, "WHERE id = 'abc' AND path = '/foo'");
}

#[test]
fn test_literal_template_resolves_to_itself() {
    for source in ["", "SELECT 1", "SELECT * FROM t -- comment\nWHERE a = 'b'"] {
        let template = parse(source).unwrap();
        assert_eq!(resolve(&template, &FilterBinding::new()).unwrap(), source);
    }
}

#[test]
fn test_unguarded_placeholder_must_be_bound() {
    let template = parse(PATH_QUERY).unwrap();
    assert_eq!(
        resolve(&template, &FilterBinding::new()),
        Err(ResolveError::MissingRequiredFilter("website_id".into()))
    );
}

#[test]
fn test_injection_attempt_is_rejected() {
    let template = parse(PATH_QUERY).unwrap();
    for attempt in ["abc' OR '1'='1", "abc; DROP TABLE event", "abc -- ", "a\\'b", "a/* x */"] {
        let binding = FilterBinding::new().with("website_id", attempt);
        assert!(
            matches!(resolve(&template, &binding), Err(ResolveError::InvalidFilterValue { .. })),
            "accepted {:?}",
            attempt
        );
    }
}

#[test]
fn test_path_values() {
    let template = parse("url_path [[ {{url_sti}} --]] = '/'").unwrap();

    let equals = FilterBinding::new().with("url_sti", PathCondition::new(PathOperator::Equals, "/arbeid"));
    assert_eq!(resolve(&template, &equals).unwrap(), "url_path = '/arbeid'");

    let prefix = FilterBinding::new().with("url_sti", PathCondition::new(PathOperator::StartsWith, "/a_b%"));
    assert_eq!(resolve(&template, &prefix).unwrap(), r"url_path LIKE '/a\\_b\\%%'");
}

#[test]
fn test_typed_values() {
    let template = parse("LIMIT {{limit}} [[AND day {{day}}]] [[AND ts {{range}}]]").unwrap();
    let binding = FilterBinding::new()
        .with("limit", 1000i64)
        .with("day", DateRange::new(date(2025, 12, 1), date(2025, 12, 31)))
        .with("range", DateRange { start: Some(date(2025, 12, 1)), end: None });

    assert_eq!(
        resolve(&template, &binding).unwrap(),
        "LIMIT 1000 AND day BETWEEN '2025-12-01' AND '2025-12-31' AND ts >= '2025-12-01'"
    );

    let nan = FilterBinding::new().with("limit", FilterValue::Decimal(f64::NAN));
    assert!(matches!(
        resolve(&parse("LIMIT {{limit}}").unwrap(), &nan),
        Err(ResolveError::InvalidFilterValue { .. })
    ));
}

#[test]
fn test_render_reports_either_stage() {
    assert!(matches!(
        render("{{oops", &FilterBinding::new()),
        Err(TemplateError::Parse(_))
    ));
    assert!(matches!(
        render("{{x}}", &FilterBinding::new()),
        Err(TemplateError::Resolve(ResolveError::MissingRequiredFilter(_)))
    ));
}

#[test]
fn test_dashboard_query_snapshot() {
    let template = parse(
        "SELECT
  FORMAT_TIMESTAMP('%Y-%m-%d', created_at) AS dato,
  COUNT(DISTINCT session_id) AS Unike_besokende
FROM `fagtorsdag-prod-81a6.umami_student.event`
WHERE website_id = '{{website_id}}'
  AND url_path [[ {{url_sti}} --]] = '/'
  [[AND {{created_at}}]]
GROUP BY dato
ORDER BY dato ASC",
    )
    .unwrap();

    let december = DateRange::new(date(2025, 12, 1), date(2025, 12, 31));
    let binding = FilterBinding::new()
        .with("website_id", "35abb2b7-3f97-42ce-931b-cf547d40d967")
        .with("url_sti", PathCondition::new(PathOperator::StartsWith, "/no/lokalt/oslo"))
        .with(
            "created_at",
            SqlFragment::date_range_condition("created_at", &december).unwrap().unwrap(),
        );

    assert_snapshot!(resolve(&template, &binding).unwrap(), @r"
SELECT
  FORMAT_TIMESTAMP('%Y-%m-%d', created_at) AS dato,
  COUNT(DISTINCT session_id) AS Unike_besokende
FROM `fagtorsdag-prod-81a6.umami_student.event`
WHERE website_id = '35abb2b7-3f97-42ce-931b-cf547d40d967'
  AND url_path LIKE '/no/lokalt/oslo%'
  AND created_at >= TIMESTAMP('2025-12-01') AND created_at < TIMESTAMP('2026-01-01')
GROUP BY dato
ORDER BY dato ASC
");

    let unfiltered = FilterBinding::new().with("website_id", "35abb2b7-3f97-42ce-931b-cf547d40d967");
    let sql = resolve(&template, &unfiltered).unwrap();
    assert!(sql.contains("  AND url_path = '/'\n"));
    assert!(!sql.contains("created_at >="));
}
