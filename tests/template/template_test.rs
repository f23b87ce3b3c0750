//! Integration tests for template parsing.
//!
//! These parse complete dashboard queries and check the segment structure
//! and the diagnostics for malformed input.

use dashql::template::{parse, OptionalBlock, ParseError, PlaceholderRef, Segment, Template, TemplateCache};
use std::sync::Arc;

const BASE_QUERY: &str = r#"WITH base_query AS (
  SELECT
    `fagtorsdag-prod-81a6.umami_student.event`.*  FROM `fagtorsdag-prod-81a6.umami_student.event`
  WHERE `fagtorsdag-prod-81a6.umami_student.event`.website_id = '{{website_id}}'
  AND `fagtorsdag-prod-81a6.umami_student.event`.event_type = 1
  AND `fagtorsdag-prod-81a6.umami_student.event`.url_path [[ {{url_sti}} --]] = '/'
  [[AND {{created_at}} ]]
)

SELECT
  FORMAT_TIMESTAMP('%Y-%m-%d', base_query.created_at) AS dato,
  COUNT(DISTINCT base_query.session_id) as Unike_besokende
FROM base_query
GROUP BY
  dato
ORDER BY dato ASC
LIMIT 1000"#;

fn lit(s: &str) -> Segment {
    Segment::Literal(s.to_string())
}

fn ph(name: &str) -> Segment {
    Segment::Placeholder(PlaceholderRef::new(name))
}

fn block(trigger: &str, negate: bool, segments: Vec<Segment>) -> Segment {
    Segment::Optional(OptionalBlock {
        trigger: trigger.to_string(),
        negate,
        segments,
    })
}

#[test]
fn test_dashboard_query_structure() {
    let template = parse(BASE_QUERY).unwrap();

    assert_eq!(
        template.placeholders().into_iter().collect::<Vec<_>>(),
        vec!["created_at", "url_sti", "website_id"]
    );
    assert_eq!(template.unguarded().into_iter().collect::<Vec<_>>(), vec!["website_id"]);
    assert_eq!(
        template.triggers().into_iter().collect::<Vec<_>>(),
        vec!["created_at", "url_sti"]
    );

    let blocks: Vec<&OptionalBlock> = template
        .segments
        .iter()
        .filter_map(|s| match s {
            Segment::Optional(b) => Some(b),
            _ => None,
        })
        .collect();
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[0].segments, vec![ph("url_sti")]);
    assert!(!blocks[0].negate);
    assert_eq!(blocks[1].segments, vec![lit("= '/'")]);
    assert!(blocks[1].negate);
    assert_eq!(blocks[2].segments, vec![lit("AND "), ph("created_at"), lit(" ")]);
}

#[test]
fn test_literals_are_merged() {
    // `--` outside a block is plain text and joins its neighbours
    let template = parse("SELECT 1 -- total\nFROM t").unwrap();
    assert_eq!(template, Template::new(vec![lit("SELECT 1 -- total\nFROM t")]));
    assert!(template.is_literal());
}

#[test]
fn test_inline_fallback() {
    let template = parse("path = [[ {{p}} -- '/' ]] LIMIT 5").unwrap();
    assert_eq!(
        template.segments,
        vec![
            lit("path = "),
            block("p", false, vec![ph("p")]),
            block("p", true, vec![lit("'/'")]),
            lit(" LIMIT 5"),
        ]
    );
}

#[test]
fn test_line_fallback_may_hold_placeholders() {
    let template = parse("x = [[ {{a}} --]] {{b}}\nAND 1 = 1").unwrap();
    assert_eq!(
        template.segments,
        vec![
            lit("x = "),
            block("a", false, vec![ph("a")]),
            block("a", true, vec![ph("b")]),
            lit("\nAND 1 = 1"),
        ]
    );
}

#[test]
fn test_nested_block_trigger_is_first_placeholder_depth_first() {
    let template = parse("[[ AND [[ x = {{inner}} ]] y = {{outer}} ]]").unwrap();
    let Segment::Optional(outer) = &template.segments[0] else {
        panic!("expected optional block");
    };
    assert_eq!(outer.trigger, "inner");
}

#[test]
fn test_brackets_and_braces_pass_through() {
    let source = "SELECT ARRAY[1, 2][OFFSET(0)], STRUCT{} FROM t WHERE a = '}'";
    let template = parse(source).unwrap();
    assert_eq!(template, Template::new(vec![lit(source)]));
}

#[test]
fn test_malformed_templates() {
    assert!(matches!(
        parse("WHERE id = '{{website_id'"),
        Err(ParseError::UnclosedPlaceholder { .. })
    ));
    assert!(matches!(
        parse("WHERE 1 = 1 [[AND {{created_at}}"),
        Err(ParseError::UnclosedBlock { .. })
    ));
    assert!(matches!(
        parse("WHERE 1 = 1 ]]"),
        Err(ParseError::UnexpectedCloser { token: "]]", .. })
    ));
    assert!(matches!(
        parse("[[ AND a = 1 ]]"),
        Err(ParseError::MissingTrigger { .. })
    ));
    assert!(matches!(
        parse("{{ website id }}"),
        Err(ParseError::InvalidPlaceholderName { .. })
    ));
    assert!(matches!(
        parse("[[ {{a}} -- b -- c ]]"),
        Err(ParseError::DuplicateSeparator { .. })
    ));
}

#[test]
fn test_error_span_points_into_source() {
    let source = "SELECT 1 [[AND {{created_at}}";
    let err = parse(source).unwrap_err();
    assert_eq!(err.span(), 9..11);
    assert_eq!(&source[err.span()], "[[");
}

#[test]
fn test_parse_is_deterministic() {
    assert_eq!(parse(BASE_QUERY).unwrap(), parse(BASE_QUERY).unwrap());
}

#[test]
fn test_cache_shares_parsed_templates() {
    let cache = TemplateCache::new();
    let a = cache.get_or_parse(BASE_QUERY).unwrap();
    let b = cache.get_or_parse(BASE_QUERY).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(*a, parse(BASE_QUERY).unwrap());

    cache.clear();
    assert!(cache.is_empty());
}
