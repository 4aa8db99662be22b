//! Query-string codec for pagination, sorting, and per-column filter values.
//!
//! Decoders never fail: malformed or tampered input degrades to the supplied fallback or to
//! `None`, so the table stays renderable under any URL.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::model::{ColumnSort, FilterValue, SortingState};

/// Separator used to join list filter values into a single query value.
pub const ARRAY_SEPARATOR: char = ',';

/// Encodes a sort descriptor as a JSON array of `{id, desc}` objects.
pub fn encode_sort(sort: &[ColumnSort]) -> String {
    serde_json::to_string(sort).unwrap_or_else(|_| "[]".to_string())
}

/// Decodes a sort descriptor, returning `fallback` unless every entry is well formed.
///
/// The whole sequence is rejected when `raw` is absent, is not a JSON array, or contains an
/// entry that is not an object with a string `id` and boolean `desc`, or whose `id` is not in
/// `valid_ids`.
pub fn decode_sort(
    raw: Option<&str>,
    valid_ids: &BTreeSet<String>,
    fallback: &[ColumnSort],
) -> SortingState {
    let Some(raw) = raw.filter(|raw| !raw.is_empty()) else {
        return fallback.to_vec();
    };

    let Ok(Value::Array(items)) = serde_json::from_str::<Value>(raw) else {
        tracing::debug!(raw, "sort query is not a JSON array; using fallback");
        return fallback.to_vec();
    };

    let mut decoded = Vec::with_capacity(items.len());
    for item in &items {
        let Some(entry) = sort_entry(item) else {
            tracing::debug!(raw, "sort query has a malformed entry; using fallback");
            return fallback.to_vec();
        };
        if !valid_ids.contains(&entry.id) {
            tracing::debug!(raw, column = %entry.id, "sort query names an unknown column");
            return fallback.to_vec();
        }
        decoded.push(entry);
    }
    decoded
}

fn sort_entry(item: &Value) -> Option<ColumnSort> {
    let object = item.as_object()?;
    let id = object.get("id")?.as_str()?;
    let desc = object.get("desc")?.as_bool()?;
    Some(ColumnSort {
        id: id.to_string(),
        desc,
    })
}

/// Parses a strictly positive integer; values above `u32::MAX` are still accepted.
pub fn parse_positive(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|value| *value > 0)
}

/// Decodes a strictly positive integer, falling back to `default` for anything else.
pub fn decode_positive(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(parse_positive)
        .map(|value| u32::try_from(value).unwrap_or(u32::MAX))
        .unwrap_or(default)
}

/// Encodes a filter value: scalars pass through, lists join on [`ARRAY_SEPARATOR`].
pub fn encode_filter_value(value: &FilterValue) -> String {
    match value {
        FilterValue::Scalar(value) => value.clone(),
        FilterValue::List(values) => values.join(&ARRAY_SEPARATOR.to_string()),
    }
}

/// Decodes a raw filter query value.
///
/// With `as_list` the value splits on [`ARRAY_SEPARATOR`], segments are trimmed, and empty
/// segments dropped; an empty result is `None`. Otherwise the raw value passes through as a
/// scalar, with the empty string mapping to `None`.
pub fn decode_filter_value(raw: &str, as_list: bool) -> Option<FilterValue> {
    if !as_list {
        return (!raw.is_empty()).then(|| FilterValue::Scalar(raw.to_string()));
    }

    let items: Vec<String> = raw
        .split(ARRAY_SEPARATOR)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();
    (!items.is_empty()).then_some(FilterValue::List(items))
}

/// Equality used to skip redundant filter writes: element-wise for lists, exact otherwise.
pub fn filter_values_eq(a: Option<&FilterValue>, b: Option<&FilterValue>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(FilterValue::List(a)), Some(FilterValue::List(b))) => {
            a.len() == b.len() && a.iter().zip(b).all(|(left, right)| left == right)
        }
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
