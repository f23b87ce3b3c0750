//! Integration tests for period presets and selection.

use chrono::NaiveDate;
use dashql::filter::DateRange;
use dashql::period::{
    month_bounds, parse_date_text, DateInput, PeriodError, PeriodPresets, PeriodSelection, PeriodTag, PresetDef,
    PresetKind,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// The presets of a dataset that only covers late 2025.
fn pinned() -> PeriodPresets {
    PeriodPresets::new(vec![
        PresetDef::new(
            "current-month",
            PresetKind::Fixed {
                start: date(2025, 12, 1),
                end: date(2025, 12, 31),
            },
        ),
        PresetDef::new(
            "previous-month",
            PresetKind::Fixed {
                start: date(2025, 11, 1),
                end: date(2025, 11, 30),
            },
        ),
    ])
    .unwrap()
}

#[test]
fn test_current_month_against_anchor() {
    let presets = PeriodPresets::standard();
    let cases = [
        (date(2025, 12, 15), date(2025, 12, 1), date(2025, 12, 31)),
        (date(2024, 2, 29), date(2024, 2, 1), date(2024, 2, 29)),
        (date(2023, 2, 1), date(2023, 2, 1), date(2023, 2, 28)),
        (date(2025, 4, 30), date(2025, 4, 1), date(2025, 4, 30)),
    ];
    for (today, start, end) in cases {
        assert_eq!(presets.resolve_preset("current-month", today).unwrap(), (start, end));
    }
}

#[test]
fn test_previous_month_crosses_year() {
    let presets = PeriodPresets::standard();
    assert_eq!(
        presets.resolve_preset("previous-month", date(2026, 1, 10)).unwrap(),
        (date(2025, 12, 1), date(2025, 12, 31))
    );
    assert_eq!(
        presets.resolve_preset("previous-month", date(2024, 3, 31)).unwrap(),
        (date(2024, 2, 1), date(2024, 2, 29))
    );
}

#[test]
fn test_recognize_inverts_resolve() {
    let today = date(2025, 12, 15);
    for presets in [PeriodPresets::standard(), pinned()] {
        for preset in presets.iter() {
            let (start, end) = presets.resolve_preset(&preset.tag, today).unwrap();
            assert_eq!(
                presets.recognize_preset(start, end, today),
                PeriodTag::Preset(preset.tag.clone())
            );
        }
    }
}

#[test]
fn test_unmatched_range_is_custom() {
    let presets = PeriodPresets::standard();
    assert_eq!(
        presets.recognize_preset(date(2025, 12, 2), date(2025, 12, 31), date(2025, 12, 15)),
        PeriodTag::Custom
    );
}

#[test]
fn test_unknown_preset() {
    assert_eq!(
        PeriodPresets::standard().resolve_preset("last-year", date(2025, 12, 15)),
        Err(PeriodError::UnknownPreset("last-year".into()))
    );
}

#[test]
fn test_invalid_preset_definitions() {
    assert!(matches!(
        PeriodPresets::new(vec![PresetDef::new("custom", PresetKind::Today)]),
        Err(PeriodError::InvalidPreset { .. })
    ));
    assert!(matches!(
        PeriodPresets::new(vec![
            PresetDef::new("today", PresetKind::Today),
            PresetDef::new("today", PresetKind::CurrentMonth),
        ]),
        Err(PeriodError::InvalidPreset { .. })
    ));
}

#[test]
fn test_selection_flow() {
    let presets = pinned();
    let today = date(2026, 10, 18);

    let mut selection = PeriodSelection::preset(&presets, "current-month", today).unwrap();
    assert_eq!(selection.range(), DateRange::new(date(2025, 12, 1), date(2025, 12, 31)));

    // editing one bound makes the selection custom
    selection.set_end(Some(date(2025, 12, 24)));
    assert_eq!(selection.tag(), &PeriodTag::Custom);
    assert_eq!(selection.display_tag(&presets, today), PeriodTag::Custom);

    // back onto the preset's range: displayed as the preset, stored as custom
    selection.set_end(Some(date(2025, 12, 31)));
    assert_eq!(selection.tag(), &PeriodTag::Custom);
    assert_eq!(
        selection.display_tag(&presets, today),
        PeriodTag::Preset("current-month".into())
    );

    // choosing custom keeps the dates
    selection.select_preset(&presets, "previous-month", today).unwrap();
    selection.select_preset(&presets, "custom", today).unwrap();
    assert_eq!(selection.tag(), &PeriodTag::Custom);
    assert_eq!(selection.range(), DateRange::new(date(2025, 11, 1), date(2025, 11, 30)));
}

#[test]
fn test_inverted_range_is_kept_as_given() {
    let mut selection = PeriodSelection::default();
    let inverted = DateRange::new(date(2025, 12, 31), date(2025, 12, 1));
    selection.select_custom(inverted);
    assert_eq!(selection.range(), inverted);
}

#[test]
fn test_refresh_follows_reference_date() {
    let presets = PeriodPresets::standard();
    let mut selection = PeriodSelection::preset(&presets, "previous-month", date(2025, 12, 15)).unwrap();

    assert!(selection.refresh(&presets, date(2026, 1, 1)).unwrap());
    assert_eq!(selection.start(), Some(date(2025, 12, 1)));
    assert!(!selection.refresh(&presets, date(2026, 1, 31)).unwrap());
}

#[test]
fn test_date_input_commits_only_complete_dates() {
    let mut input = DateInput::new(Some(date(2025, 12, 1)));
    assert_eq!(input.text(), "01.12.2025");

    for partial in ["0", "05.1", "05.12.202", "32.12.2025", "2025-12-05"] {
        assert_eq!(input.edit(partial), None, "committed {:?}", partial);
        assert_eq!(input.committed(), Some(date(2025, 12, 1)));
    }

    assert_eq!(input.edit("05.12.2025"), Some(date(2025, 12, 5)));
    assert_eq!(input.committed(), Some(date(2025, 12, 5)));
}

#[test]
fn test_date_text_parsing() {
    assert_eq!(parse_date_text("29.02.2024").unwrap(), date(2024, 2, 29));
    assert!(parse_date_text("29.02.2025").is_err());
    assert!(parse_date_text("1.2.2025").is_err());
}

#[test]
fn test_month_bounds() {
    assert_eq!(month_bounds(date(2025, 12, 31)), Some((date(2025, 12, 1), date(2025, 12, 31))));
}
