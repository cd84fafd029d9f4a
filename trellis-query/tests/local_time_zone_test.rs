//! Server-zone behaviour around DST transitions, with the process zone
//! pinned to America/Los_Angeles. Lives in its own test binary so the
//! environment change cannot leak into other suites.

use chrono::{DateTime, FixedOffset, Utc, TimeZone};
use serde_json::json;
use std::sync::Once;
use trellis_query::{Literal, LiteralParser, ServerTimeZone};

static PIN_TZ: Once = Once::new();

fn local() -> LiteralParser {
    PIN_TZ.call_once(|| {
        // SAFETY: runs once, before any test in this binary reads the zone.
        unsafe { std::env::set_var("TZ", "America/Los_Angeles") };
    });
    LiteralParser::new(ServerTimeZone::Local)
}

fn date(raw: &str) -> DateTime<FixedOffset> {
    match local().parse(&json!(raw)).unwrap() {
        Literal::DateTime(value) => value,
        other => panic!("expected a date, got {other:?}"),
    }
}

#[test]
fn test_zulu_value_in_daylight_time() {
    let value = date("2013-06-03T22:06:35Z");
    assert_eq!(value.to_rfc3339(), "2013-06-03T15:06:35-07:00");
    assert_eq!(value, Utc.with_ymd_and_hms(2013, 6, 3, 22, 6, 35).unwrap());
}

#[test]
fn test_spring_gap_shifts_forward() {
    assert_eq!(date("2014-03-09T02:30:00").to_rfc3339(), "2014-03-09T03:30:00-07:00");
}

#[test]
fn test_fall_back_ambiguity_takes_standard_time() {
    let value = date("2014-11-02T01:30:00");
    assert_eq!(value.to_rfc3339(), "2014-11-02T01:30:00-08:00");
    assert_eq!(value, Utc.with_ymd_and_hms(2014, 11, 2, 9, 30, 0).unwrap());
}

#[test]
fn test_winter_local_value() {
    assert_eq!(date("2014-02-03T22:06:35").to_rfc3339(), "2014-02-03T22:06:35-08:00");
}
