//! Browser (`wasm32`) implementation of the [`data_table::QueryStore`] contract.
//!
//! Reads go through `window.location.search`; writes rebuild the query with `URLSearchParams`
//! and commit it through `history.replaceState` or `history.pushState`, so navigation never
//! reloads the page. Native builds get an inert store that holds nothing.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

use data_table::{QueryStore, QueryStoreError, QueryWrite, WriteOptions};

#[derive(Debug, Clone, Copy, Default)]
/// Query store backed by the current page URL.
pub struct WebQueryStore;

impl WebQueryStore {
    /// Current raw query string including the leading `?`, or empty.
    pub fn search(self) -> String {
        #[cfg(target_arch = "wasm32")]
        {
            web_sys::window()
                .and_then(|window| window.location().search().ok())
                .unwrap_or_default()
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            String::new()
        }
    }
}

/// Joins a path, an encoded query without `?`, and a fragment into a relative URL.
pub fn relative_url(pathname: &str, query: &str, hash: &str) -> String {
    if query.is_empty() {
        format!("{pathname}{hash}")
    } else {
        format!("{pathname}?{query}{hash}")
    }
}

#[cfg(target_arch = "wasm32")]
fn js_error(context: &str, err: wasm_bindgen::JsValue) -> QueryStoreError {
    QueryStoreError::Write(format!("{context}: {err:?}"))
}

impl QueryStore for WebQueryStore {
    fn get(&self, key: &str) -> Option<String> {
        #[cfg(target_arch = "wasm32")]
        {
            let params = web_sys::UrlSearchParams::new_with_str(&self.search()).ok()?;
            params.get(key)
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = key;
            None
        }
    }

    fn set(&self, write: &QueryWrite, options: &WriteOptions) -> Result<(), QueryStoreError> {
        #[cfg(target_arch = "wasm32")]
        {
            use data_table::HistoryMode;
            use wasm_bindgen::JsValue;

            let window = web_sys::window()
                .ok_or_else(|| QueryStoreError::Unavailable("window".to_string()))?;
            let location = window.location();
            let search = location
                .search()
                .map_err(|err| js_error("location.search", err))?;
            let params = web_sys::UrlSearchParams::new_with_str(&search)
                .map_err(|err| js_error("URLSearchParams", err))?;
            for (key, value) in write.iter() {
                match value {
                    Some(value) => params.set(key, value),
                    None => params.delete(key),
                }
            }

            let query: js_sys::JsString = params.to_string();
            let query = String::from(query);
            let pathname = location
                .pathname()
                .map_err(|err| js_error("location.pathname", err))?;
            let hash = location.hash().unwrap_or_default();
            let url = relative_url(&pathname, &query, &hash);

            let history = window
                .history()
                .map_err(|_| QueryStoreError::Unavailable("history".to_string()))?;
            let result = match options.history {
                HistoryMode::Replace => {
                    history.replace_state_with_url(&JsValue::NULL, "", Some(&url))
                }
                HistoryMode::Push => history.push_state_with_url(&JsValue::NULL, "", Some(&url)),
            };
            result.map_err(|err| js_error("history", err))?;
            tracing::debug!(url = %url, "query string updated");
            Ok(())
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = (write, options);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn relative_url_omits_empty_query() {
        assert_eq!(relative_url("/docs", "", "#top"), "/docs#top");
        assert_eq!(
            relative_url("/docs", "page=2&role=admin", ""),
            "/docs?page=2&role=admin"
        );
    }

    #[test]
    fn native_fallback_is_inert() {
        let store = WebQueryStore;
        let write = QueryWrite::new().with("page", Some("2".to_string()));
        assert_eq!(store.set(&write, &WriteOptions::default()), Ok(()));
        assert_eq!(store.get("page"), None);
        assert_eq!(store.search(), "");
    }
}
