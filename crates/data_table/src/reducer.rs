//! Reducer actions, side-effect intents, and transition logic for the table state coordinator.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::codec::{encode_filter_value, encode_sort};
use crate::config::QueryKeys;
use crate::filters::{filters_structurally_eq, normalize};
use crate::model::{
    column_id_set, ColumnDef, ColumnFilter, ColumnFiltersState, ColumnSort, FilterValue,
    PaginationState, RowSelectionState, SortingState, TableState, Updater, VisibilityState,
};
use crate::store::QueryWrite;

#[derive(Debug, Clone, PartialEq)]
/// Static inputs of the reducer: column set, query keys, and defaults.
pub struct TableContext {
    /// Column definitions.
    pub columns: Vec<ColumnDef>,
    /// URL parameter names.
    pub keys: QueryKeys,
    /// Pagination used when the URL carries no usable value.
    pub default_pagination: PaginationState,
    /// Sort descriptor used when the URL carries no usable value.
    pub default_sorting: SortingState,
    /// Whether URL-bound filters are frozen.
    pub enable_advanced_filter: bool,
    /// Whether values equal to their default are removed from the URL.
    pub clear_on_default: bool,
}

impl TableContext {
    /// Context with default keys and pagination.
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Self {
            columns,
            keys: QueryKeys::default(),
            default_pagination: PaginationState::default(),
            default_sorting: Vec::new(),
            enable_advanced_filter: false,
            clear_on_default: false,
        }
    }

    /// Ids of every column with a non-empty id.
    pub fn column_ids(&self) -> BTreeSet<String> {
        column_id_set(&self.columns)
    }

    /// Looks up a column by id.
    pub fn column(&self, column_id: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|column| column.id == column_id)
    }

    /// Columns whose filters are bound to the URL. Empty in advanced mode.
    pub fn filterable_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        let enabled = !self.enable_advanced_filter;
        self.columns
            .iter()
            .filter(move |column| enabled && column.enable_column_filter && !column.id.is_empty())
    }
}

#[derive(Debug)]
/// Actions accepted by [`reduce_table`] to mutate [`TableState`].
pub enum TableAction {
    /// Replace pagination with a literal or a function of the current pagination.
    SetPagination(Updater<PaginationState>),
    /// Jump to a zero-based page index.
    SetPageIndex(u32),
    /// Change the page size, keeping the first visible row on screen.
    SetPageSize(u32),
    /// Advance one page when another page exists.
    NextPage {
        /// Total number of pages.
        page_count: u32,
    },
    /// Go back one page when not on the first page.
    PreviousPage,
    /// Replace the sort descriptor.
    SetSorting(Updater<SortingState>),
    /// Cycle a column through ascending, descending, and unsorted.
    ToggleSort {
        /// Column to toggle.
        column_id: String,
        /// Keep other sorted columns instead of replacing them.
        multi: bool,
    },
    /// Replace the column filter set.
    SetColumnFilters(Updater<ColumnFiltersState>),
    /// Set or clear one column's filter value.
    SetColumnFilterValue {
        /// Filtered column.
        column_id: String,
        /// New value; `None` removes the filter.
        value: Option<FilterValue>,
    },
    /// Replace column visibility.
    SetColumnVisibility(Updater<VisibilityState>),
    /// Flip one column's visibility.
    ToggleColumnVisibility {
        /// Column to flip.
        column_id: String,
    },
    /// Replace row selection.
    SetRowSelection(Updater<RowSelectionState>),
    /// Flip one row's selection.
    ToggleRowSelected {
        /// Row to flip.
        row_id: String,
    },
    /// Clear filters (outside advanced mode) and sorting.
    ResetFiltersAndSorting,
    /// Mount-time filter seed. Skipped when structurally equal to the current filters.
    SeedColumnFilters(ColumnFiltersState),
    /// Re-apply pagination and sorting read back from the URL.
    HydrateQuery {
        /// Decoded pagination.
        pagination: PaginationState,
        /// Decoded sort descriptor.
        sorting: SortingState,
    },
}

#[derive(Debug, Clone, PartialEq)]
/// Side-effect intents emitted by [`reduce_table`] for the coordinator to execute.
pub enum TableEffect {
    /// Write a batch of query keys to the store.
    WriteQuery(QueryWrite),
    /// The query snapshot changed; schedule a host notification.
    QueryChanged,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Reducer errors for actions that target a single column.
pub enum TableError {
    /// The action names a column that is not part of the column set.
    #[error("unknown column `{0}`")]
    UnknownColumn(String),
    /// URL-bound filters are frozen while advanced filtering is enabled.
    #[error("column filters are managed externally while advanced filtering is enabled")]
    AdvancedFilterEnabled,
    /// The column does not allow sorting.
    #[error("column `{0}` is not sortable")]
    SortingDisabled(String),
    /// The column cannot be hidden.
    #[error("column `{0}` cannot be hidden")]
    HidingDisabled(String),
}

/// Applies a [`TableAction`] to the table state and collects resulting side effects.
///
/// Slice-level actions never fail; unknown ids and non-positive values are dropped or clamped.
///
/// # Errors
///
/// Returns a [`TableError`] when a single-column action names an unknown column, or a column
/// whose capability flags forbid the action.
pub fn reduce_table(
    state: &mut TableState,
    ctx: &TableContext,
    action: TableAction,
) -> Result<Vec<TableEffect>, TableError> {
    let mut effects = Vec::new();
    match action {
        TableAction::SetPagination(updater) => {
            let next = updater
                .resolve(&state.pagination)
                .clamped(ctx.default_pagination);
            apply_pagination(state, ctx, next, &mut effects);
        }
        TableAction::SetPageIndex(page_index) => {
            let next = PaginationState::from_index(page_index, state.pagination.per_page);
            apply_pagination(state, ctx, next, &mut effects);
        }
        TableAction::SetPageSize(per_page) => {
            let per_page = per_page.max(1);
            let first_row = state.pagination.page_index() as u64 * state.pagination.per_page as u64;
            let page_index = u32::try_from(first_row / per_page as u64).unwrap_or(u32::MAX - 1);
            let next = PaginationState::from_index(page_index, per_page);
            apply_pagination(state, ctx, next, &mut effects);
        }
        TableAction::NextPage { page_count } => {
            if state.pagination.page < page_count {
                let next = PaginationState {
                    page: state.pagination.page + 1,
                    ..state.pagination
                };
                apply_pagination(state, ctx, next, &mut effects);
            }
        }
        TableAction::PreviousPage => {
            if state.pagination.page > 1 {
                let next = PaginationState {
                    page: state.pagination.page - 1,
                    ..state.pagination
                };
                apply_pagination(state, ctx, next, &mut effects);
            }
        }
        TableAction::SetSorting(updater) => {
            let next = updater.resolve(&state.sorting);
            apply_sorting(state, ctx, next, &mut effects);
        }
        TableAction::ToggleSort { column_id, multi } => {
            let column = ctx
                .column(&column_id)
                .ok_or_else(|| TableError::UnknownColumn(column_id.clone()))?;
            if !column.enable_sorting {
                return Err(TableError::SortingDisabled(column_id));
            }
            let next = toggled_sorting(&state.sorting, &column_id, multi);
            apply_sorting(state, ctx, next, &mut effects);
        }
        TableAction::SetColumnFilters(updater) => {
            if ctx.enable_advanced_filter {
                tracing::debug!("ignoring column filter change in advanced filter mode");
                return Ok(effects);
            }
            let next = updater.resolve(&state.column_filters);
            apply_filters(state, ctx, next, true, &mut effects);
        }
        TableAction::SetColumnFilterValue { column_id, value } => {
            if ctx.enable_advanced_filter {
                return Err(TableError::AdvancedFilterEnabled);
            }
            if ctx.column(&column_id).is_none() {
                return Err(TableError::UnknownColumn(column_id));
            }
            let next = with_filter_value(&state.column_filters, &column_id, value);
            apply_filters(state, ctx, next, true, &mut effects);
        }
        TableAction::SetColumnVisibility(updater) => {
            state.column_visibility = updater.resolve(&state.column_visibility);
        }
        TableAction::ToggleColumnVisibility { column_id } => {
            let column = ctx
                .column(&column_id)
                .ok_or_else(|| TableError::UnknownColumn(column_id.clone()))?;
            if !column.enable_hiding {
                return Err(TableError::HidingDisabled(column_id));
            }
            let visible = state.is_column_visible(&column_id);
            state.column_visibility.insert(column_id, !visible);
        }
        TableAction::SetRowSelection(updater) => {
            state.row_selection = updater.resolve(&state.row_selection);
        }
        TableAction::ToggleRowSelected { row_id } => {
            if state.is_row_selected(&row_id) {
                state.row_selection.remove(&row_id);
            } else {
                state.row_selection.insert(row_id, true);
            }
        }
        TableAction::ResetFiltersAndSorting => {
            apply_sorting(state, ctx, Vec::new(), &mut effects);
            if !ctx.enable_advanced_filter {
                apply_filters(state, ctx, Vec::new(), true, &mut effects);
            }
            effects = coalesce(effects);
        }
        TableAction::SeedColumnFilters(filters) => {
            if ctx.enable_advanced_filter {
                return Ok(effects);
            }
            let seeded = canonical_filters(ctx, filters);
            if filters_structurally_eq(&state.column_filters, &seeded) {
                tracing::debug!("seeded filters match current filters; skipping");
                return Ok(effects);
            }
            apply_filters(state, ctx, seeded, false, &mut effects);
        }
        TableAction::HydrateQuery {
            pagination,
            sorting,
        } => {
            let pagination = pagination.clamped(ctx.default_pagination);
            if state.pagination != pagination || state.sorting != sorting {
                state.pagination = pagination;
                state.sorting = sorting;
                effects.push(TableEffect::QueryChanged);
            }
        }
    }
    Ok(effects)
}

fn apply_pagination(
    state: &mut TableState,
    ctx: &TableContext,
    next: PaginationState,
    effects: &mut Vec<TableEffect>,
) {
    tracing::debug!(page = next.page, per_page = next.per_page, "pagination changed");
    state.pagination = next;
    let mut write = QueryWrite::new();
    write.set(&ctx.keys.page, page_value(ctx, next.page));
    write.set(&ctx.keys.per_page, per_page_value(ctx, next.per_page));
    effects.push(TableEffect::WriteQuery(write));
    effects.push(TableEffect::QueryChanged);
}

fn apply_sorting(
    state: &mut TableState,
    ctx: &TableContext,
    next: SortingState,
    effects: &mut Vec<TableEffect>,
) {
    let ids = ctx.column_ids();
    let mut seen = BTreeSet::new();
    let normalized: SortingState = next
        .into_iter()
        .filter(|sort| ids.contains(&sort.id) && seen.insert(sort.id.clone()))
        .collect();
    tracing::debug!(entries = normalized.len(), "sorting changed");

    let value = if ctx.clear_on_default && normalized == ctx.default_sorting {
        None
    } else {
        Some(encode_sort(&normalized))
    };
    state.sorting = normalized;
    effects.push(TableEffect::WriteQuery(
        QueryWrite::new().with(&ctx.keys.sort, value),
    ));
    effects.push(TableEffect::QueryChanged);
}

fn apply_filters(
    state: &mut TableState,
    ctx: &TableContext,
    next: ColumnFiltersState,
    reset_page: bool,
    effects: &mut Vec<TableEffect>,
) {
    state.column_filters = canonical_filters(ctx, next);
    tracing::debug!(active = state.column_filters.len(), "column filters changed");

    let mut write = QueryWrite::new();
    if reset_page {
        state.pagination.page = 1;
        write.set(&ctx.keys.page, page_value(ctx, 1));
    }
    for column in ctx.filterable_columns() {
        let value = state.filter_value(&column.id).map(encode_filter_value);
        write.set(&column.id, value);
    }
    effects.push(TableEffect::WriteQuery(write));
    effects.push(TableEffect::QueryChanged);
}

fn page_value(ctx: &TableContext, page: u32) -> Option<String> {
    (!(ctx.clear_on_default && page == ctx.default_pagination.page)).then(|| page.to_string())
}

fn per_page_value(ctx: &TableContext, per_page: u32) -> Option<String> {
    (!(ctx.clear_on_default && per_page == ctx.default_pagination.per_page))
        .then(|| per_page.to_string())
}

/// Normalizes every value, dropping empty entries, unknown ids, and duplicate ids.
fn canonical_filters(ctx: &TableContext, filters: ColumnFiltersState) -> ColumnFiltersState {
    let ids = ctx.column_ids();
    let mut seen = BTreeSet::new();
    filters
        .into_iter()
        .filter(|filter| ids.contains(&filter.id))
        .filter_map(|filter| {
            let value = normalize(Some(filter.value))?;
            seen.insert(filter.id.clone())
                .then(|| ColumnFilter::new(filter.id, value))
        })
        .collect()
}

fn with_filter_value(
    filters: &[ColumnFilter],
    column_id: &str,
    value: Option<FilterValue>,
) -> ColumnFiltersState {
    let mut next: ColumnFiltersState = filters.to_vec();
    let position = next.iter().position(|filter| filter.id == column_id);
    match (position, value) {
        (Some(index), Some(value)) => next[index].value = value,
        (Some(index), None) => {
            next.remove(index);
        }
        (None, Some(value)) => next.push(ColumnFilter::new(column_id, value)),
        (None, None) => {}
    }
    next
}

fn toggled_sorting(current: &[ColumnSort], column_id: &str, multi: bool) -> SortingState {
    let existing = current.iter().find(|sort| sort.id == column_id);
    let replacement = match existing {
        None => Some(ColumnSort::asc(column_id)),
        Some(sort) if !sort.desc => Some(ColumnSort::desc(column_id)),
        Some(_) => None,
    };

    if !multi {
        return replacement.into_iter().collect();
    }

    let mut next: SortingState = Vec::with_capacity(current.len() + 1);
    let mut placed = false;
    for sort in current {
        if sort.id == column_id {
            if let Some(replacement) = replacement.clone() {
                next.push(replacement);
            }
            placed = true;
        } else {
            next.push(sort.clone());
        }
    }
    if !placed {
        next.extend(replacement);
    }
    next
}

/// Merges every `WriteQuery` into one batch and keeps a single `QueryChanged`.
fn coalesce(effects: Vec<TableEffect>) -> Vec<TableEffect> {
    let mut write: Option<QueryWrite> = None;
    let mut changed = false;
    for effect in effects {
        match effect {
            TableEffect::WriteQuery(batch) => match write.as_mut() {
                Some(write) => write.merge(batch),
                None => write = Some(batch),
            },
            TableEffect::QueryChanged => changed = true,
        }
    }
    let mut merged: Vec<TableEffect> = write.into_iter().map(TableEffect::WriteQuery).collect();
    if changed {
        merged.push(TableEffect::QueryChanged);
    }
    merged
}
