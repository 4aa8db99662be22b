//! Table state coordinator: owns the canonical state, the URL store, and the query emitter.
//!
//! The coordinator is the only writer of the query store. Every mutation goes through
//! [`reduce_table`]; the resulting effects are executed here against the throttled store and the
//! debounced emitter. Hosts drive time by calling [`TableCoordinator::poll`] at
//! [`TableCoordinator::next_deadline`].

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::codec::{decode_filter_value, decode_positive, decode_sort, parse_positive};
use crate::config::{DataTableOptions, HistoryMode, QueryKeys};
use crate::filters::{normalize, seed_value};
use crate::model::{
    ColumnDef, ColumnFilter, ColumnFiltersState, InitialTableState, PaginationState,
    QuerySnapshot, SortingState, TableState,
};
use crate::pagination;
use crate::reducer::{reduce_table, TableAction, TableContext, TableEffect, TableError};
use crate::store::{QueryStore, ThrottledQueryStore, WriteOptions};
use crate::timing::{earliest, Clock, Debouncer, ThrottleGate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Table metadata published to UI layers.
pub struct TableMeta {
    /// Resolved URL parameter names.
    pub query_keys: QueryKeys,
    /// Whether filters are managed by an external advanced filter UI.
    pub enable_advanced_filter: bool,
}

/// Owns table state and binds it to a [`QueryStore`].
pub struct TableCoordinator<S: QueryStore> {
    ctx: TableContext,
    initial: InitialTableState,
    state: TableState,
    store: ThrottledQueryStore<S>,
    emitter: Debouncer<QuerySnapshot>,
    clock: Rc<dyn Clock>,
    history: HistoryMode,
    page_count: u32,
    mounted: bool,
    mount_snapshot: Option<QuerySnapshot>,
}

impl<S: QueryStore> TableCoordinator<S> {
    /// Builds a coordinator. State stays at its defaults until [`TableCoordinator::mount`].
    pub fn new(
        columns: Vec<ColumnDef>,
        initial: InitialTableState,
        options: &DataTableOptions,
        store: S,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let fallback = PaginationState {
            page: 1,
            per_page: options.default_page_size.max(1),
        };
        let default_pagination = initial
            .pagination
            .map(|pagination| pagination.clamped(fallback))
            .unwrap_or(fallback);
        let ctx = TableContext {
            columns,
            keys: options.query_keys.clone(),
            default_pagination,
            default_sorting: initial.sorting.clone().unwrap_or_default(),
            enable_advanced_filter: options.enable_advanced_filter,
            clear_on_default: options.clear_on_default,
        };
        warn_on_reserved_keys(&ctx);

        let state = TableState {
            pagination: default_pagination,
            sorting: ctx.default_sorting.clone(),
            column_filters: Vec::new(),
            column_visibility: initial.column_visibility.clone().unwrap_or_default(),
            row_selection: initial.row_selection.clone().unwrap_or_default(),
        };
        let gate = ThrottleGate::new(
            options.throttle_ms,
            options.throttle_leading,
            options.throttle_trailing,
        );

        Self {
            ctx,
            initial,
            state,
            store: ThrottledQueryStore::new(store, clock.clone(), gate),
            emitter: Debouncer::new(options.debounce_ms),
            clock,
            history: options.history,
            page_count: 1,
            mounted: false,
            mount_snapshot: None,
        }
    }

    /// Hydrates pagination and sorting from the store and seeds filters once.
    ///
    /// The mount snapshot is returned by the next [`TableCoordinator::poll`] without waiting for
    /// the debounce window. Calling `mount` again is a no-op.
    pub fn mount(&mut self) {
        if self.mounted {
            return;
        }
        self.mounted = true;
        self.state.pagination = self.read_pagination();
        self.state.sorting = self.read_sorting();

        let seed = self.seed_filters();
        self.run(TableAction::SeedColumnFilters(seed));

        self.emitter.cancel();
        self.mount_snapshot = Some(self.state.snapshot());
        tracing::debug!(
            page = self.state.pagination.page,
            per_page = self.state.pagination.per_page,
            filters = self.state.column_filters.len(),
            "table mounted"
        );
    }

    /// Applies an action and executes its effects.
    ///
    /// # Errors
    ///
    /// Returns the reducer's [`TableError`]; state is unchanged in that case.
    pub fn dispatch(&mut self, action: TableAction) -> Result<(), TableError> {
        let effects = reduce_table(&mut self.state, &self.ctx, action)?;
        self.execute(effects);
        Ok(())
    }

    /// Re-reads pagination and sorting after the URL changed outside the coordinator.
    ///
    /// Filters are not re-seeded; pending URL writes are dropped.
    pub fn sync_from_store(&mut self) {
        self.store.discard_pending();
        let pagination = self.read_pagination();
        let sorting = self.read_sorting();
        self.run(TableAction::HydrateQuery {
            pagination,
            sorting,
        });
    }

    /// Flushes due URL writes and returns the snapshot due for delivery, if any.
    pub fn poll(&mut self) -> Option<QuerySnapshot> {
        if let Err(err) = self.store.poll() {
            tracing::warn!(error = %err, "query store flush failed");
        }
        if let Some(snapshot) = self.mount_snapshot.take() {
            return Some(snapshot);
        }
        self.emitter.poll(self.clock.now_ms())
    }

    /// Earliest time at which [`TableCoordinator::poll`] has work to do.
    pub fn next_deadline(&self) -> Option<u64> {
        if self.mount_snapshot.is_some() {
            return Some(self.clock.now_ms());
        }
        earliest(self.emitter.deadline(), self.store.deadline())
    }

    /// Writes every pending URL update and releases the pending snapshot immediately.
    pub fn flush(&mut self) -> Option<QuerySnapshot> {
        if let Err(err) = self.store.flush_now() {
            tracing::warn!(error = %err, "query store flush failed");
        }
        self.mount_snapshot.take().or_else(|| self.emitter.flush())
    }

    /// Updates the page count used by page navigation.
    pub fn set_page_count(&mut self, page_count: u32) {
        self.page_count = page_count.max(1);
    }

    /// Current page count.
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Advances one page when possible.
    pub fn next_page(&mut self) {
        let page_count = self.page_count;
        self.run(TableAction::NextPage { page_count });
    }

    /// Goes back one page when possible.
    pub fn previous_page(&mut self) {
        self.run(TableAction::PreviousPage);
    }

    /// Whether a next page exists.
    pub fn can_next_page(&self) -> bool {
        pagination::can_next_page(self.state.pagination.page, self.page_count)
    }

    /// Whether a previous page exists.
    pub fn can_previous_page(&self) -> bool {
        pagination::can_previous_page(self.state.pagination.page)
    }

    /// Canonical state.
    pub fn state(&self) -> &TableState {
        &self.state
    }

    /// Current query snapshot.
    pub fn snapshot(&self) -> QuerySnapshot {
        self.state.snapshot()
    }

    /// Reducer context.
    pub fn context(&self) -> &TableContext {
        &self.ctx
    }

    /// Column definitions.
    pub fn columns(&self) -> &[ColumnDef] {
        &self.ctx.columns
    }

    /// Metadata for UI layers.
    pub fn meta(&self) -> TableMeta {
        TableMeta {
            query_keys: self.ctx.keys.clone(),
            enable_advanced_filter: self.ctx.enable_advanced_filter,
        }
    }

    /// Underlying (unthrottled) store.
    pub fn store(&self) -> &S {
        self.store.inner()
    }

    fn run(&mut self, action: TableAction) {
        match reduce_table(&mut self.state, &self.ctx, action) {
            Ok(effects) => self.execute(effects),
            Err(err) => tracing::warn!(error = %err, "table action rejected"),
        }
    }

    fn execute(&mut self, effects: Vec<TableEffect>) {
        let options = WriteOptions {
            history: self.history,
        };
        for effect in effects {
            match effect {
                TableEffect::WriteQuery(write) => {
                    if let Err(err) = self.store.set(&write, &options) {
                        tracing::warn!(error = %err, "query store write failed");
                    }
                }
                TableEffect::QueryChanged => {
                    self.emitter
                        .schedule(self.state.snapshot(), self.clock.now_ms());
                }
            }
        }
    }

    fn read_pagination(&self) -> PaginationState {
        let defaults = self.ctx.default_pagination;
        PaginationState {
            page: self.read_positive(&self.ctx.keys.page, defaults.page),
            per_page: self.read_positive(&self.ctx.keys.per_page, defaults.per_page),
        }
    }

    fn read_positive(&self, key: &str, default: u32) -> u32 {
        let raw = self.store.get(key);
        let value = decode_positive(raw.as_deref(), default);
        if let Some(raw) = raw.as_deref().filter(|raw| is_discarded(raw)) {
            tracing::warn!(key, raw, default, "discarding non-positive query value");
        }
        value
    }

    fn read_sorting(&self) -> SortingState {
        decode_sort(
            self.store.get(&self.ctx.keys.sort).as_deref(),
            &self.ctx.column_ids(),
            &self.ctx.default_sorting,
        )
    }

    fn url_filters(&self) -> ColumnFiltersState {
        self.ctx
            .filterable_columns()
            .filter_map(|column| {
                let raw = self.store.get(&column.id)?;
                let value = normalize(decode_filter_value(&raw, column.has_options()))?;
                Some(ColumnFilter::new(column.id.clone(), value))
            })
            .collect()
    }

    fn seed_filters(&self) -> ColumnFiltersState {
        let from_url = self.url_filters();
        if from_url.is_empty() {
            if let Some(initial) = &self.initial.column_filters {
                return initial.clone();
            }
        }
        from_url
            .into_iter()
            .filter_map(|filter| {
                seed_value(filter.value).map(|value| ColumnFilter::new(filter.id, value))
            })
            .collect()
    }
}

/// Whether a raw pagination value falls back to its default.
fn is_discarded(raw: &str) -> bool {
    parse_positive(raw).is_none()
}

fn warn_on_reserved_keys(ctx: &TableContext) {
    let reserved = ctx.keys.reserved();
    for column in ctx.filterable_columns() {
        if reserved.contains(&column.id.as_str()) {
            tracing::warn!(
                column = %column.id,
                "filter column id collides with a reserved query key"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{ColumnSort, FilterOption, FilterValue, FilterVariant};
    use crate::store::MemoryQueryStore;
    use crate::timing::ManualClock;

    fn columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("name", "Name").filter(FilterVariant::Text),
            ColumnDef::new("role", "Role")
                .filter(FilterVariant::Select)
                .options(vec![FilterOption::new("Admin", "admin")]),
        ]
    }

    fn coordinator(
        store: MemoryQueryStore,
        clock: &ManualClock,
    ) -> TableCoordinator<MemoryQueryStore> {
        TableCoordinator::new(
            columns(),
            InitialTableState::default(),
            &DataTableOptions::default(),
            store,
            Rc::new(clock.clone()),
        )
    }

    #[test]
    fn mount_hydrates_from_store_and_delivers_immediately() {
        let clock = ManualClock::starting_at(0);
        let store = MemoryQueryStore::from_pairs([
            ("page", "3"),
            ("perPage", "25"),
            ("sort", r#"[{"id":"name","desc":true}]"#),
        ]);
        let mut table = coordinator(store, &clock);
        table.mount();

        assert_eq!(table.next_deadline(), Some(0));
        let snapshot = table.poll().expect("mount snapshot");
        assert_eq!(snapshot.page, 3);
        assert_eq!(snapshot.per_page, 25);
        assert_eq!(snapshot.sorting, vec![ColumnSort::desc("name")]);
        assert_eq!(table.poll(), None);
    }

    #[test]
    fn oversized_page_is_clamped_without_being_reported_as_discarded() {
        assert!(!is_discarded("5000000000"));
        assert!(is_discarded("0"));
        assert!(is_discarded("-3"));
        assert!(is_discarded("abc"));

        let clock = ManualClock::starting_at(0);
        let store = MemoryQueryStore::from_pairs([("page", "5000000000")]);
        let mut table = coordinator(store, &clock);
        table.mount();
        assert_eq!(table.state().pagination.page, u32::MAX);
    }

    #[test]
    fn popstate_sync_rereads_pagination_without_reseeding_filters() {
        let clock = ManualClock::starting_at(0);
        let store = MemoryQueryStore::from_pairs([("role", "admin")]);
        let mut table = coordinator(store.clone(), &clock);
        table.mount();
        let _ = table.poll();

        store.insert("page", "4");
        store.insert("role", "user");
        table.sync_from_store();

        assert_eq!(table.state().pagination.page, 4);
        assert_eq!(
            table.state().filter_value("role"),
            Some(&FilterValue::list(["admin"]))
        );
    }

    #[test]
    fn page_navigation_uses_page_count() {
        let clock = ManualClock::starting_at(0);
        let mut table = coordinator(MemoryQueryStore::default(), &clock);
        table.mount();
        table.set_page_count(2);

        assert!(table.can_next_page());
        table.next_page();
        assert_eq!(table.state().pagination.page, 2);
        assert!(!table.can_next_page());
        table.next_page();
        assert_eq!(table.state().pagination.page, 2);
        table.previous_page();
        assert!(!table.can_previous_page());
    }

    #[test]
    fn meta_publishes_query_keys() {
        let clock = ManualClock::starting_at(0);
        let table = coordinator(MemoryQueryStore::default(), &clock);
        let meta = table.meta();
        assert_eq!(meta.query_keys.sort, "sort");
        assert!(!meta.enable_advanced_filter);
    }
}
