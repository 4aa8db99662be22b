//! Host-facing configuration: query keys, timing windows, and URL write behaviour.

use serde::{Deserialize, Serialize};

use crate::model::DEFAULT_PAGE_SIZE;

/// Default debounce window before the host is notified of a new query.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
/// Default throttle window for URL write flushes.
pub const DEFAULT_THROTTLE_MS: u64 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// URL parameter names used by the table.
pub struct QueryKeys {
    /// One-based page number key.
    pub page: String,
    /// Page size key.
    pub per_page: String,
    /// JSON sort descriptor key.
    pub sort: String,
    /// Advanced filter list key (published in table metadata only).
    pub filters: String,
    /// Advanced join operator key (published in table metadata only).
    pub join_operator: String,
}

impl Default for QueryKeys {
    fn default() -> Self {
        Self {
            page: "page".to_string(),
            per_page: "perPage".to_string(),
            sort: "sort".to_string(),
            filters: "filters".to_string(),
            join_operator: "joinOperator".to_string(),
        }
    }
}

impl QueryKeys {
    /// Keys reserved by pagination and sorting. Filter columns must not reuse them.
    pub fn reserved(&self) -> [&str; 5] {
        [
            self.page.as_str(),
            self.per_page.as_str(),
            self.sort.as_str(),
            self.filters.as_str(),
            self.join_operator.as_str(),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Browser history mode for URL writes.
pub enum HistoryMode {
    /// Replace the current history entry.
    #[default]
    Replace,
    /// Push a new history entry.
    Push,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Coordinator configuration.
pub struct DataTableOptions {
    /// URL parameter names.
    pub query_keys: QueryKeys,
    /// History mode used for every URL write.
    pub history: HistoryMode,
    /// Debounce window for host notifications, in milliseconds.
    pub debounce_ms: u64,
    /// Throttle window for URL flushes, in milliseconds.
    pub throttle_ms: u64,
    /// Flush on the leading edge of a throttle window.
    pub throttle_leading: bool,
    /// Flush pending writes on the trailing edge of a throttle window.
    pub throttle_trailing: bool,
    /// Remove keys whose value equals the default instead of writing them.
    pub clear_on_default: bool,
    /// Freeze URL-bound filter state; filters are then managed externally.
    pub enable_advanced_filter: bool,
    /// Page size used when neither the URL nor the initial state provides one.
    pub default_page_size: u32,
}

impl Default for DataTableOptions {
    fn default() -> Self {
        Self {
            query_keys: QueryKeys::default(),
            history: HistoryMode::Replace,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            throttle_ms: DEFAULT_THROTTLE_MS,
            throttle_leading: true,
            throttle_trailing: true,
            clear_on_default: false,
            enable_advanced_filter: false,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl DataTableOptions {
    /// Parses options from host-supplied JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns the JSON error when `raw` is not a valid options object.
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        let mut options: Self = serde_json::from_str(raw)?;
        options.default_page_size = options.default_page_size.max(1);
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let options = DataTableOptions::from_json_str(
            r#"{"debounceMs": 120, "queryKeys": {"page": "p"}, "unknown": 1}"#,
        )
        .expect("parse options");
        assert_eq!(options.debounce_ms, 120);
        assert_eq!(options.throttle_ms, DEFAULT_THROTTLE_MS);
        assert_eq!(options.query_keys.page, "p");
        assert_eq!(options.query_keys.per_page, "perPage");
        assert_eq!(options.history, HistoryMode::Replace);
    }

    #[test]
    fn zero_default_page_size_is_raised_to_one() {
        let options =
            DataTableOptions::from_json_str(r#"{"defaultPageSize": 0}"#).expect("parse options");
        assert_eq!(options.default_page_size, 1);
    }

    #[test]
    fn history_mode_parses_lowercase_tokens() {
        let options =
            DataTableOptions::from_json_str(r#"{"history": "push"}"#).expect("parse options");
        assert_eq!(options.history, HistoryMode::Push);
    }
}
