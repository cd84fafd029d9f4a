//! Typed filter literals and the JSON-to-literal conversion rules.

use crate::error::{Error, Result};
use chrono::{
    DateTime, FixedOffset, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    SecondsFormat, TimeDelta, TimeZone, Utc,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// A closed set of literal kinds a filter expression can carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Int(i64),
    Decimal(f64),
    Bool(bool),
    Null,
    Text(String),
    /// Wall-clock value in the server time zone. Equality compares instants.
    DateTime(DateTime<FixedOffset>),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(n) => write!(f, "{n}"),
            Literal::Decimal(d) if d.is_finite() && d.fract() == 0.0 => write!(f, "{d:.1}"),
            Literal::Decimal(d) => write!(f, "{d}"),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Null => f.write_str("null"),
            Literal::Text(s) => write_quoted(f, s),
            Literal::DateTime(dt) => {
                write_quoted(f, &dt.to_rfc3339_opts(SecondsFormat::AutoSi, false))
            }
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("'")?;
    for c in s.chars() {
        if c == '\'' || c == '\\' {
            f.write_str("\\")?;
        }
        write!(f, "{c}")?;
    }
    f.write_str("'")
}

/// The server's default time zone, used to interpret date literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ServerTimeZone {
    /// Whatever the host process is configured with.
    #[default]
    Local,
    Fixed(FixedOffset),
}

impl ServerTimeZone {
    pub fn utc() -> Self {
        ServerTimeZone::Fixed(Utc.fix())
    }

    /// Interprets a wall-clock value in this zone.
    ///
    /// A value inside a DST gap moves forward by the gap length; an
    /// ambiguous value picks the later instant.
    pub fn from_local(&self, naive: NaiveDateTime) -> DateTime<FixedOffset> {
        match self {
            ServerTimeZone::Fixed(offset) => offset.from_utc_datetime(&(naive - *offset)),
            ServerTimeZone::Local => {
                match Local.from_local_datetime(&naive) {
                    LocalResult::Single(dt) => return dt.fixed_offset(),
                    // chrono orders the pair by offset, not by instant
                    LocalResult::Ambiguous(a, b) => return a.max(b).fixed_offset(),
                    LocalResult::None => {}
                }
                let before = Local
                    .offset_from_local_datetime(&(naive - TimeDelta::days(1)))
                    .latest()
                    .unwrap_or_else(|| Utc.fix());
                let utc = Utc.from_utc_datetime(&(naive - before));
                self.from_utc(utc)
            }
        }
    }

    /// Converts an instant to this zone's wall clock.
    pub fn from_utc(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            ServerTimeZone::Fixed(offset) => instant.with_timezone(offset),
            ServerTimeZone::Local => instant.with_timezone(&Local).fixed_offset(),
        }
    }
}

impl fmt::Display for ServerTimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerTimeZone::Local => f.write_str("local"),
            ServerTimeZone::Fixed(offset) if offset.local_minus_utc() == 0 => f.write_str("UTC"),
            ServerTimeZone::Fixed(offset) => write!(f, "{offset}"),
        }
    }
}

impl FromStr for ServerTimeZone {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("local") {
            return Ok(ServerTimeZone::Local);
        }
        if trimmed.eq_ignore_ascii_case("utc") || trimmed == "Z" {
            return Ok(ServerTimeZone::utc());
        }
        parse_offset(trimmed)
            .map(ServerTimeZone::Fixed)
            .ok_or_else(|| format!("invalid time zone '{s}', expected 'local', 'UTC' or '+HH:MM'"))
    }
}

impl TryFrom<String> for ServerTimeZone {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ServerTimeZone> for String {
    fn from(value: ServerTimeZone) -> Self {
        value.to_string()
    }
}

fn parse_offset(raw: &str) -> Option<FixedOffset> {
    let (sign, rest) = match raw.as_bytes().first()? {
        b'+' => (1, &raw[1..]),
        b'-' => (-1, &raw[1..]),
        _ => return None,
    };
    if !matches_shape(rest, "dd:dd") {
        return None;
    }
    let hours: i32 = rest[0..2].parse().ok()?;
    let minutes: i32 = rest[3..5].parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Checks `raw` against a shape where `d` stands for an ASCII digit and any
/// other character must match literally.
fn matches_shape(raw: &str, shape: &str) -> bool {
    raw.len() == shape.len()
        && raw.bytes().zip(shape.bytes()).all(|(c, s)| match s {
            b'd' => c.is_ascii_digit(),
            _ => c == s,
        })
}

/// Whether a string should be treated as a date: four digits, a date-ish
/// separator, then another digit.
pub fn looks_like_date(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() >= 6
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && matches!(bytes[4], b'-' | b':' | b'/' | b'.')
        && bytes[5].is_ascii_digit()
}

/// Converts raw JSON parameter values into [`Literal`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralParser {
    time_zone: ServerTimeZone,
}

impl LiteralParser {
    pub fn new(time_zone: ServerTimeZone) -> Self {
        Self { time_zone }
    }

    pub fn time_zone(&self) -> ServerTimeZone {
        self.time_zone
    }

    /// Converts a JSON scalar. Arrays and objects are not literals.
    pub fn parse(&self, value: &Value) -> Result<Literal> {
        match value {
            Value::Null => Ok(Literal::Null),
            Value::Bool(b) => Ok(Literal::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Literal::Int(i)),
                None => n.as_f64().map(Literal::Decimal).ok_or_else(|| {
                    Error::BadFilterSpec(format!("Unsupported numeric parameter: {n}"))
                }),
            },
            Value::String(s) => self.parse_str(s),
            Value::Array(_) | Value::Object(_) => Err(Error::BadFilterSpec(format!(
                "Parameter value is not a scalar: {value}"
            ))),
        }
    }

    /// A date-looking string must parse as a date; everything else is text.
    pub fn parse_str(&self, raw: &str) -> Result<Literal> {
        if looks_like_date(raw) {
            return self.parse_date(raw).map(Literal::DateTime);
        }
        Ok(Literal::Text(raw.to_string()))
    }

    /// Parses the accepted ISO-8601 forms:
    ///
    /// * `YYYY-MM-DD` (midnight, server zone)
    /// * `YYYY-MM-DDTHH:MM[:SS[.fff]]` (server zone)
    /// * either of the above time forms with `Z` or `±HH:MM`, converted
    ///   to the server zone
    pub fn parse_date(&self, raw: &str) -> Result<DateTime<FixedOffset>> {
        let invalid = || Error::InvalidDateLiteral(format!("Invalid date literal: '{raw}'"));

        let (date_part, time_part) = match raw.split_once('T') {
            Some((date, time)) => (date, Some(time)),
            None => (raw, None),
        };
        if !matches_shape(date_part, "dddd-dd-dd") {
            return Err(invalid());
        }
        let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| invalid())?;

        let Some(time_part) = time_part else {
            return Ok(self.time_zone.from_local(date.and_time(NaiveTime::MIN)));
        };

        let (clock, offset) = if let Some(clock) = time_part.strip_suffix('Z') {
            (clock, Some(Utc.fix()))
        } else if time_part.len() > 6
            && matches!(time_part.as_bytes()[time_part.len() - 6], b'+' | b'-')
        {
            let (clock, offset) = time_part.split_at(time_part.len() - 6);
            (clock, Some(parse_offset(offset).ok_or_else(invalid)?))
        } else {
            (time_part, None)
        };

        let time = parse_clock(clock).ok_or_else(invalid)?;
        let naive = date.and_time(time);
        Ok(match offset {
            Some(offset) => self
                .time_zone
                .from_utc(Utc.from_utc_datetime(&(naive - offset))),
            None => self.time_zone.from_local(naive),
        })
    }
}

fn parse_clock(clock: &str) -> Option<NaiveTime> {
    if matches_shape(clock, "dd:dd") {
        return NaiveTime::parse_from_str(clock, "%H:%M").ok();
    }
    let (whole, fraction) = match clock.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (clock, None),
    };
    if !matches_shape(whole, "dd:dd:dd") {
        return None;
    }
    if let Some(fraction) = fraction
        && (fraction.is_empty() || fraction.len() > 9 || !fraction.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }
    NaiveTime::parse_from_str(clock, "%H:%M:%S%.f").ok()
}
