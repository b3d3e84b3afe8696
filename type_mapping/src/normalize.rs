//! Timestamp normalization for embedded JSON
//!
//! PostgreSQL renders `timestamp` values inside `json_build_object` as
//! `2024-01-02T03:04:05.123456`: microsecond precision, no timezone. Typed fields
//! expect RFC 3339, so record-level keys following the `*_at` naming convention are
//! rewritten before deserializing. The rewrite is syntactic, it never parses the
//! document as a whole.

use chrono::{NaiveDateTime, SecondsFormat};
use regex::Regex;
use std::borrow::Cow;
use std::fmt::Write;
use std::sync::LazyLock;

/// Key suffix marking a timestamp field
pub const TIME_FIELD_SUFFIX: &str = "_at";

const SOURCE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

static TIME_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r#""(\w+{TIME_FIELD_SUFFIX})"\s*:\s*"([^"]+)""#))
        .expect("time field pattern is valid")
});

/// Rewrite timezone-less `*_at` values of record-level keys to RFC 3339 UTC
///
/// Record level is depth 1 of an object document and depth 2 of an array of
/// objects. Values that do not match the source format are left untouched.
pub fn normalize_timestamps(raw: &str) -> Cow<'_, str> {
    let record_depth = match raw.trim_start().as_bytes().first() {
        Some(b'{') => 1,
        Some(b'[') => 2,
        _ => return Cow::Borrowed(raw),
    };

    let depths = outside_string_depths(raw);
    let mut out = String::new();
    let mut last = 0;

    for caps in TIME_FIELD.captures_iter(raw) {
        let (Some(whole), Some(key), Some(value)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        if depths.get(whole.start()).copied().flatten() != Some(record_depth) {
            continue;
        }
        let Some(rewritten) = reformat(value.as_str()) else {
            continue;
        };

        out.push_str(&raw[last..whole.start()]);
        let _ = write!(out, "\"{}\":\"{}\"", key.as_str(), rewritten);
        last = whole.end();
    }

    if last == 0 {
        return Cow::Borrowed(raw);
    }
    out.push_str(&raw[last..]);
    Cow::Owned(out)
}

fn reformat(value: &str) -> Option<String> {
    NaiveDateTime::parse_from_str(value, SOURCE_FORMAT)
        .ok()
        .map(|parsed| parsed.and_utc().to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Nesting depth before each byte, `None` inside string literals
fn outside_string_depths(raw: &str) -> Vec<Option<u32>> {
    let mut depths = Vec::with_capacity(raw.len());
    let mut depth = 0u32;
    let mut in_string = false;
    let mut escaped = false;

    for byte in raw.bytes() {
        depths.push(if in_string { None } else { Some(depth) });
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => depth += 1,
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    depths
}
