use std::time::Duration;

use data_table::{ColumnSort, InitialTableState, QuerySnapshot};
use data_table_ui::{RemoteDataTable, SkeletonOptions, TableRow};
use leptos::*;
use leptos_meta::*;
use leptos_router::*;

use crate::demo::{fetch_users, user_columns, UsersPage};

/// Simulated network latency of the preview backend.
const FETCH_LATENCY: Duration = Duration::from_millis(250);

#[component]
pub fn SiteApp() -> impl IntoView {
    provide_meta_context();

    view! {
        <Title text="InDream UI" />
        <Meta name="description" content="Reusable UI components with live previews." />

        <Router>
            <main class="site-root">
                <Routes>
                    <Route path="" view=UsersTableDemo />
                    <Route path="/docs/data-table" view=UsersTableDemo />
                </Routes>
            </main>
        </Router>
    }
}

#[component]
pub fn UsersTableDemo() -> impl IntoView {
    let rows = create_rw_signal(Vec::<TableRow>::new());
    let meta = create_rw_signal(None);
    let is_loading = create_rw_signal(true);
    let is_fetching = create_rw_signal(false);
    let last_query = create_rw_signal(None::<QuerySnapshot>);

    let load = move |query: QuerySnapshot| {
        is_fetching.set(true);
        let requested = query.clone();
        last_query.set(Some(query));
        set_timeout(
            move || {
                // Drop responses for queries that were superseded while in flight.
                if last_query.with_untracked(|last| last.as_ref() != Some(&requested)) {
                    return;
                }
                let UsersPage { rows: page, meta: page_meta } = fetch_users(&requested);
                rows.set(page);
                meta.set(Some(page_meta));
                is_loading.set(false);
                is_fetching.set(false);
            },
            FETCH_LATENCY,
        );
    };
    let on_query_change = Callback::new(move |query: QuerySnapshot| {
        logging::log!("users query: {query:?}");
        load(query);
    });
    let on_row_click = Callback::new(move |row: TableRow| {
        logging::log!("users row clicked: {}", row.id);
    });
    let on_refetch = Callback::new(move |_: ()| {
        if let Some(query) = last_query.get_untracked() {
            load(query);
        }
    });

    let initial_state = InitialTableState {
        sorting: Some(vec![ColumnSort::desc("createdAt")]),
        ..InitialTableState::default()
    };
    let skeleton = SkeletonOptions {
        column_count: 4,
        filter_count: 3,
        cell_widths: vec![
            "12rem".to_string(),
            "16rem".to_string(),
            "8rem".to_string(),
            "10rem".to_string(),
        ],
        ..SkeletonOptions::default()
    };

    view! {
        <section class="docs-preview" data-preview="data-table">
            <h1>"Data Table"</h1>
            <p>
                "Server-side pagination, sorting, and filtering kept in the URL. Try filtering by role, then use the browser back button."
            </p>
            <RemoteDataTable
                columns=user_columns()
                data=rows
                pagination=meta
                is_loading=is_loading
                is_fetching=is_fetching
                initial_state=initial_state
                on_query_change=on_query_change
                on_refetch=on_refetch
                on_row_click=on_row_click
                enable_row_selection=true
                skeleton=skeleton
            />
        </section>
    }
}
