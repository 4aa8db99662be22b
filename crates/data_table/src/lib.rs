//! Headless remote-pagination data table.
//!
//! The crate owns everything that does not touch the DOM: the table model, the query-string
//! codec, filter normalization, the reducer and its coordinator, debounce/throttle timing, the
//! query-store contract, and the models behind the toolbar filter widgets. Browser URL access
//! lives in `data_table_web` and Leptos rendering in `data_table_ui`.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod codec;
pub mod config;
pub mod coordinator;
pub mod filters;
pub mod model;
pub mod pagination;
pub mod reducer;
pub mod store;
pub mod timing;
pub mod toolbar;

pub use config::{DataTableOptions, HistoryMode, QueryKeys};
pub use coordinator::{TableCoordinator, TableMeta};
pub use model::*;
pub use pagination::{page_count_from_pagination, resolve_page_count};
pub use reducer::{reduce_table, TableAction, TableContext, TableEffect, TableError};
pub use store::{
    MemoryQueryStore, NoopQueryStore, QueryStore, QueryStoreError, QueryWrite,
    ThrottledQueryStore, WriteOptions,
};
pub use timing::{Clock, Debouncer, ManualClock, SystemClock, ThrottleGate};
