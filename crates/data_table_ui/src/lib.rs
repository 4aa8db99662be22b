//! Leptos components for the remote-pagination data table.
//!
//! [`RemoteDataTable`] owns a [`data_table::TableCoordinator`] bound to the page URL, mirrors its
//! state into signals, and drives the debounce/throttle timers with browser timeouts. The
//! toolbar, filter widgets, pagination footer, and loading skeleton render on top of the headless
//! models in [`data_table::toolbar`] and keep the stable `data-ui-*` DOM contract used by the
//! site stylesheet.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

mod dom;
mod filter_widgets;
mod pagination;
mod row;
mod skeleton;
mod table;
mod toolbar;

pub use filter_widgets::{
    DateFilter, MultiSelectFilter, NumberFilter, RangeFilter, SelectFilter, TextFilter,
};
pub use pagination::{DataTablePagination, PAGE_SIZE_OPTIONS};
pub use row::{faceted_range, TableRow};
pub use skeleton::{DataTableSkeleton, SkeletonOptions};
pub use table::{use_data_table, DataTableContext, RemoteDataTable};
pub use toolbar::{ColumnFilterControl, DataTableToolbar, DataTableViewOptions};
