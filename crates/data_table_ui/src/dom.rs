//! `data-ui-*` attribute helpers and date input conversions shared by the components.

use chrono::{DateTime, NaiveDate};

pub(crate) fn merge_layout_class(base: &'static str, layout_class: Option<&'static str>) -> String {
    match layout_class {
        Some(layout_class) if !layout_class.is_empty() => format!("{base} {layout_class}"),
        _ => base.to_string(),
    }
}

pub(crate) fn bool_token(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// `aria-sort` token for a column's sort direction.
pub(crate) fn aria_sort(direction: Option<bool>) -> &'static str {
    match direction {
        Some(true) => "descending",
        Some(false) => "ascending",
        None => "none",
    }
}

/// Parses an `<input type="date">` value into a UTC-midnight timestamp in milliseconds.
pub(crate) fn parse_date_input(value: &str) -> Option<i64> {
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis())
}

/// Formats a millisecond timestamp for an `<input type="date">`.
pub(crate) fn date_input_value(timestamp_ms: Option<i64>) -> String {
    timestamp_ms
        .and_then(DateTime::from_timestamp_millis)
        .map(|at| at.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn layout_class_is_appended_when_present() {
        assert_eq!(merge_layout_class("ui-table", None), "ui-table");
        assert_eq!(merge_layout_class("ui-table", Some("")), "ui-table");
        assert_eq!(
            merge_layout_class("ui-table", Some("users-table")),
            "ui-table users-table"
        );
    }

    #[test]
    fn sort_tokens_follow_aria() {
        assert_eq!(aria_sort(Some(false)), "ascending");
        assert_eq!(aria_sort(Some(true)), "descending");
        assert_eq!(aria_sort(None), "none");
    }

    #[test]
    fn date_inputs_map_to_utc_midnight() {
        assert_eq!(parse_date_input("2023-11-14"), Some(1_699_920_000_000));
        assert_eq!(parse_date_input("14/11/2023"), None);
        assert_eq!(date_input_value(Some(1_699_920_000_000)), "2023-11-14");
        assert_eq!(date_input_value(None), "");
    }
}
