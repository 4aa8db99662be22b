//! Table container: coordinator wiring, timers, and the header/body grid.

use std::rc::Rc;
use std::time::Duration;

use data_table::toolbar::{page_selection, set_page_selected, PageSelection};
use data_table::{
    resolve_page_count, Clock, ColumnDef, DataTableOptions, InitialTableState, QuerySnapshot,
    QueryStore, RemotePaginationMeta, SystemClock, TableAction, TableCoordinator, TableMeta,
    TableState,
};
use data_table_web::WebQueryStore;
use leptos::ev::MouseEvent;
use leptos::leptos_dom::helpers::TimeoutHandle;
use leptos::*;

use crate::dom::{aria_sort, bool_token, merge_layout_class};
use crate::pagination::DataTablePagination;
use crate::row::{row_ids, TableRow};
use crate::skeleton::{shows_skeleton, DataTableSkeleton, SkeletonOptions};
use crate::toolbar::DataTableToolbar;

type Coordinator = TableCoordinator<Rc<dyn QueryStore>>;

#[derive(Clone, Copy)]
/// Leptos context shared by the table grid, toolbar, and pagination footer.
pub struct DataTableContext {
    coordinator: StoredValue<Coordinator>,
    timer: StoredValue<Option<TimeoutHandle>>,
    on_query_change: Option<Callback<QuerySnapshot>>,
    /// Reactive mirror of the coordinator state.
    pub state: RwSignal<TableState>,
    /// Page count resolved from the server pagination meta.
    pub page_count: RwSignal<u32>,
    /// Rows of the current page.
    pub rows: Signal<Vec<TableRow>>,
    /// Whether a background fetch is in flight.
    pub is_fetching: Signal<bool>,
    /// Host refetch action rendered by the toolbar.
    pub on_refetch: Option<Callback<()>>,
    /// Host action for a click on a body row.
    pub on_row_click: Option<Callback<TableRow>>,
}

impl DataTableContext {
    /// Applies an action and mirrors the resulting state.
    pub fn dispatch(&self, action: TableAction) {
        let mut result = Ok(());
        self.update(|table| result = table.dispatch(action));
        if let Err(err) = result {
            logging::warn!("data table action rejected: {err}");
        }
    }

    /// Advances one page when another page exists.
    pub fn next_page(&self) {
        self.update(|table| table.next_page());
    }

    /// Goes back one page.
    pub fn previous_page(&self) {
        self.update(|table| table.previous_page());
    }

    /// Re-reads pagination and sorting after browser history navigation.
    pub fn sync_from_url(&self) {
        self.update(|table| table.sync_from_store());
    }

    /// Column definitions.
    pub fn columns(&self) -> Vec<ColumnDef> {
        self.coordinator
            .try_with_value(|table| table.columns().to_vec())
            .unwrap_or_default()
    }

    /// Columns currently shown. Tracks [`DataTableContext::state`].
    pub fn visible_columns(&self) -> Vec<ColumnDef> {
        let state = self.state.get();
        self.columns()
            .into_iter()
            .filter(|column| state.is_column_visible(&column.id))
            .collect()
    }

    /// Query keys and filter mode.
    pub fn meta(&self) -> Option<TableMeta> {
        self.coordinator.try_with_value(|table| table.meta())
    }

    fn set_page_count(&self, page_count: u32) {
        self.coordinator
            .try_update_value(|table| table.set_page_count(page_count));
        if self.page_count.get_untracked() != page_count {
            self.page_count.set(page_count);
        }
    }

    fn update(&self, f: impl FnOnce(&mut Coordinator)) {
        let next = self.coordinator.try_update_value(|table| {
            f(table);
            table.state().clone()
        });
        if let Some(next) = next {
            if self.state.with_untracked(|current| current != &next) {
                self.state.set(next);
            }
        }
        self.arm_timer();
    }

    fn cancel_timer(&self) {
        if let Some(Some(handle)) = self.timer.try_update_value(Option::take) {
            handle.clear();
        }
    }

    fn arm_timer(self) {
        self.cancel_timer();
        let Some(Some(deadline)) = self.coordinator.try_with_value(|table| table.next_deadline())
        else {
            return;
        };
        let delay = deadline.saturating_sub(SystemClock.now_ms());
        match set_timeout_with_handle(move || self.tick(), Duration::from_millis(delay)) {
            Ok(handle) => self.timer.set_value(Some(handle)),
            Err(err) => logging::warn!("data table timer failed: {err:?}"),
        }
    }

    fn tick(self) {
        self.timer.try_update_value(|slot| *slot = None);
        let delivered = self
            .coordinator
            .try_update_value(|table| table.poll())
            .flatten();
        if let (Some(snapshot), Some(on_query_change)) = (delivered, self.on_query_change) {
            on_query_change.call(snapshot);
        }
        self.arm_timer();
    }
}

/// Returns the current [`DataTableContext`].
///
/// # Panics
///
/// Panics if called outside [`RemoteDataTable`].
pub fn use_data_table() -> DataTableContext {
    use_context::<DataTableContext>().expect("DataTableContext not provided")
}

#[component]
/// URL-synchronized table for server-paginated data.
///
/// Pagination, sorting, and filters live in the query string; `on_query_change` receives the
/// debounced [`QuerySnapshot`] the host should fetch with.
pub fn RemoteDataTable(
    /// Column definitions. Read once at mount.
    columns: Vec<ColumnDef>,
    /// Rows of the current page.
    #[prop(into)]
    data: Signal<Vec<TableRow>>,
    /// Server pagination meta; preferred over `page_count` when present.
    #[prop(optional, into)]
    pagination: MaybeSignal<Option<RemotePaginationMeta>>,
    /// Explicit page count.
    #[prop(optional, into)]
    page_count: MaybeSignal<Option<i64>>,
    /// First load in flight; renders the skeleton.
    #[prop(optional, into)]
    is_loading: MaybeSignal<bool>,
    /// Background refetch in flight; renders the toolbar indicator.
    #[prop(optional, into)]
    is_fetching: MaybeSignal<bool>,
    #[prop(optional)] initial_state: InitialTableState,
    #[prop(optional)] options: DataTableOptions,
    /// Query store; defaults to the page URL.
    #[prop(optional)]
    store: Option<Rc<dyn QueryStore>>,
    #[prop(optional)] on_query_change: Option<Callback<QuerySnapshot>>,
    #[prop(optional)] on_refetch: Option<Callback<()>>,
    /// Called with the clicked row.
    #[prop(optional)]
    on_row_click: Option<Callback<TableRow>>,
    #[prop(optional)] enable_row_selection: bool,
    #[prop(optional)] skeleton: Option<SkeletonOptions>,
    #[prop(optional)] layout_class: Option<&'static str>,
    /// Extra toolbar actions.
    #[prop(optional)]
    children: Option<Children>,
) -> impl IntoView {
    let store = store.unwrap_or_else(|| Rc::new(WebQueryStore) as Rc<dyn QueryStore>);
    let skeleton = skeleton.unwrap_or_else(|| SkeletonOptions::for_columns(columns.len()));
    let coordinator = TableCoordinator::new(
        columns,
        initial_state,
        &options,
        store,
        Rc::new(SystemClock),
    );

    let ctx = DataTableContext {
        state: create_rw_signal(coordinator.state().clone()),
        coordinator: store_value(coordinator),
        timer: store_value(None),
        on_query_change,
        page_count: create_rw_signal(1),
        rows: data,
        is_fetching: Signal::derive(move || is_fetching.get()),
        on_refetch,
        on_row_click,
    };
    provide_context(ctx);

    create_effect(move |_| {
        let explicit = page_count.get();
        let count = pagination.with(|meta| resolve_page_count(meta.as_ref(), explicit));
        ctx.set_page_count(count);
    });

    let popstate_listener = window_event_listener(ev::popstate, move |_| ctx.sync_from_url());
    on_cleanup(move || {
        popstate_listener.remove();
        ctx.cancel_timer();
    });

    ctx.update(|table| table.mount());

    let is_loading = Signal::derive(move || is_loading.get());
    let show_skeleton = move || ctx.rows.with(|rows| shows_skeleton(is_loading.get(), rows.len()));
    let toolbar_actions = children.map(|children| children());

    view! {
        <div
            class=merge_layout_class("ui-remote-data-table", layout_class)
            data-ui-primitive="true"
            data-ui-kind="remote-data-table"
            data-ui-loading=move || bool_token(is_loading.get())
        >
            <div class="ui-data-table-toolbar-row" data-ui-slot="toolbar-row">
                <DataTableToolbar />
                <div data-ui-slot="toolbar-actions">{toolbar_actions}</div>
            </div>
            <Show
                when=move || !show_skeleton()
                fallback=move || view! { <DataTableSkeleton options=skeleton.clone() /> }
            >
                <TableGrid enable_row_selection />
                <DataTablePagination />
            </Show>
        </div>
    }
}

#[component]
fn TableGrid(enable_row_selection: bool) -> impl IntoView {
    let ctx = use_data_table();
    let column_span = move || ctx.visible_columns().len() + usize::from(enable_row_selection);

    view! {
        <table
            class="ui-data-table"
            data-ui-primitive="true"
            data-ui-kind="data-table"
            aria-busy=move || bool_token(ctx.is_fetching.get())
        >
            <thead>
                <tr data-ui-slot="header-row">
                    {enable_row_selection.then(|| view! { <PageSelectionHeader /> })}
                    {move || {
                        ctx.visible_columns()
                            .into_iter()
                            .map(|column| view! { <SortableHeader column /> })
                            .collect_view()
                    }}
                </tr>
            </thead>
            <tbody>
                {move || {
                    let rows = ctx.rows.get();
                    if rows.is_empty() {
                        return view! {
                            <tr data-ui-slot="empty-row">
                                <td colspan=column_span() data-ui-kind="empty-state">
                                    "No results."
                                </td>
                            </tr>
                        }
                            .into_view();
                    }
                    rows.into_iter()
                        .map(|row| view! { <BodyRow row enable_row_selection /> })
                        .collect_view()
                }}
            </tbody>
        </table>
    }
}

#[component]
fn SortableHeader(column: ColumnDef) -> impl IntoView {
    let ctx = use_data_table();
    let column_id = column.id.clone();
    let direction = {
        let column_id = column_id.clone();
        move || ctx.state.with(|state| state.sort_direction(&column_id))
    };
    let title = column.title().to_string();

    if !column.enable_sorting {
        return view! {
            <th scope="col" data-ui-sortable="false">
                {title}
            </th>
        }
        .into_view();
    }

    let indicator = {
        let direction = direction.clone();
        move || match direction() {
            Some(true) => "\u{2193}",
            Some(false) => "\u{2191}",
            None => "\u{2195}",
        }
    };
    let on_click = move |ev: MouseEvent| {
        ctx.dispatch(TableAction::ToggleSort {
            column_id: column_id.clone(),
            multi: ev.shift_key(),
        });
    };

    view! {
        <th scope="col" data-ui-sortable="true" aria-sort=move || aria_sort(direction())>
            <button type="button" class="ui-data-table-sort" on:click=on_click>
                {title}
                <span aria-hidden="true" data-ui-slot="sort-indicator">{indicator}</span>
            </button>
        </th>
    }
    .into_view()
}

#[component]
fn PageSelectionHeader() -> impl IntoView {
    let ctx = use_data_table();
    let selection = move || {
        let ids = row_ids(&ctx.rows.get());
        ctx.state.with(|state| page_selection(&ids, &state.row_selection))
    };

    view! {
        <th scope="col" data-ui-slot="select-all">
            <input
                type="checkbox"
                aria-label="Select all"
                prop:checked=move || selection() == PageSelection::All
                prop:indeterminate=move || selection() == PageSelection::Partial
                on:change=move |ev| {
                    let checked = event_target_checked(&ev);
                    let ids = row_ids(&ctx.rows.get_untracked());
                    let next = ctx
                        .state
                        .with_untracked(|state| set_page_selected(&ids, &state.row_selection, checked));
                    ctx.dispatch(TableAction::SetRowSelection(next.into()));
                }
            />
        </th>
    }
}

#[component]
fn BodyRow(row: TableRow, enable_row_selection: bool) -> impl IntoView {
    let ctx = use_data_table();
    let selected = {
        let row_id = row.id.clone();
        move || ctx.state.with(|state| state.is_row_selected(&row_id))
    };
    let select_cell = enable_row_selection.then(|| {
        let row_id = row.id.clone();
        let selected = selected.clone();
        view! {
            <td data-ui-slot="select-row">
                <input
                    type="checkbox"
                    aria-label="Select row"
                    prop:checked=selected
                    on:click=|ev: MouseEvent| ev.stop_propagation()
                    on:change=move |_| {
                        ctx.dispatch(TableAction::ToggleRowSelected {
                            row_id: row_id.clone(),
                        })
                    }
                />
            </td>
        }
    });

    let on_click = ctx.on_row_click.map(|on_row_click| {
        let row = row.clone();
        move |_: MouseEvent| on_row_click.call(row.clone())
    });
    let clickable = bool_token(on_click.is_some());

    view! {
        <tr
            data-state=move || if selected() { "selected" } else { "" }
            data-ui-clickable=clickable
            on:click=move |ev: MouseEvent| {
                if let Some(on_click) = &on_click {
                    on_click(ev);
                }
            }
        >
            {select_cell}
            {move || {
                ctx.visible_columns()
                    .into_iter()
                    .map(|column| view! { <td data-column=column.id.clone()>{row.text(&column.id).to_string()}</td> })
                    .collect_view()
            }}
        </tr>
    }
}
