//! Toolbar: column filters, reset, fetching indicator, refetch, and view options.

use data_table::toolbar::{can_reset, filter_control, hideable_columns, FilterControl};
use data_table::{ColumnDef, TableAction};
use leptos::*;

use crate::dom::{bool_token, merge_layout_class};
use crate::filter_widgets::{
    DateFilter, MultiSelectFilter, NumberFilter, RangeFilter, SelectFilter, TextFilter,
};
use crate::table::use_data_table;

#[component]
/// Filter widget for one column, chosen by its filter variant.
pub fn ColumnFilterControl(column: ColumnDef) -> impl IntoView {
    match filter_control(&column) {
        Some(FilterControl::Text) => view! { <TextFilter column /> }.into_view(),
        Some(FilterControl::Number) => view! { <NumberFilter column /> }.into_view(),
        Some(FilterControl::Range) => view! { <RangeFilter column /> }.into_view(),
        Some(FilterControl::Date { range }) => view! { <DateFilter column range /> }.into_view(),
        Some(FilterControl::Select) => view! { <SelectFilter column /> }.into_view(),
        Some(FilterControl::MultiSelect) => view! { <MultiSelectFilter column /> }.into_view(),
        None => ().into_view(),
    }
}

#[component]
/// Toolbar rendered above the table grid.
///
/// Column filters are hidden while advanced filtering is enabled; the reset button only shows
/// when a filter or sort is active.
pub fn DataTableToolbar(#[prop(optional)] layout_class: Option<&'static str>) -> impl IntoView {
    let ctx = use_data_table();
    let advanced = ctx
        .meta()
        .is_some_and(|meta| meta.enable_advanced_filter);
    let filter_columns: Vec<ColumnDef> = if advanced {
        Vec::new()
    } else {
        ctx.columns()
            .into_iter()
            .filter(|column| filter_control(column).is_some())
            .collect()
    };
    let show_reset = move || ctx.state.with(can_reset);
    let on_refetch = ctx.on_refetch;

    view! {
        <div
            class=merge_layout_class("ui-data-table-toolbar", layout_class)
            role="toolbar"
            data-ui-primitive="true"
            data-ui-kind="data-table-toolbar"
        >
            <div data-ui-slot="filters">
                {filter_columns
                    .into_iter()
                    .map(|column| {
                        let visible = {
                            let column_id = column.id.clone();
                            move || ctx.state.with(|state| state.is_column_visible(&column_id))
                        };
                        view! {
                            <Show when=visible>
                                <ColumnFilterControl column=column.clone() />
                            </Show>
                        }
                    })
                    .collect_view()}
                <Show when=show_reset>
                    <button
                        type="button"
                        class="ui-button"
                        aria-label="Reset filters"
                        data-ui-slot="reset"
                        on:click=move |_| ctx.dispatch(TableAction::ResetFiltersAndSorting)
                    >
                        "Reset"
                    </button>
                </Show>
            </div>
            <div data-ui-slot="actions">
                <Show when=move || ctx.is_fetching.get()>
                    <span class="ui-spinner" role="status" aria-label="Fetching" data-ui-kind="spinner"></span>
                </Show>
                {on_refetch
                    .map(|on_refetch| {
                        view! {
                            <button
                                type="button"
                                class="ui-button"
                                aria-label="Refresh data"
                                data-ui-slot="refetch"
                                disabled=move || ctx.is_fetching.get()
                                on:click=move |_| on_refetch.call(())
                            >
                                "Refresh"
                            </button>
                        }
                    })}
                <DataTableViewOptions />
            </div>
        </div>
    }
}

#[component]
/// Column visibility menu.
pub fn DataTableViewOptions() -> impl IntoView {
    let ctx = use_data_table();
    let open = create_rw_signal(false);
    let columns: Vec<ColumnDef> = hideable_columns(&ctx.columns()).cloned().collect();

    view! {
        <div class="ui-view-options" data-ui-primitive="true" data-ui-kind="view-options">
            <button
                type="button"
                class="ui-button"
                aria-haspopup="menu"
                aria-expanded=move || bool_token(open.get())
                on:click=move |_| open.update(|open| *open = !*open)
            >
                "View"
            </button>
            <Show when=move || open.get()>
                <ul role="menu" data-ui-slot="menu">
                    {columns
                        .iter()
                        .map(|column| {
                            let column_id = column.id.clone();
                            let checked = {
                                let column_id = column_id.clone();
                                move || ctx.state.with(|state| state.is_column_visible(&column_id))
                            };
                            let aria_checked = checked.clone();
                            view! {
                                <li
                                    role="menuitemcheckbox"
                                    aria-checked=move || bool_token(aria_checked())
                                >
                                    <label>
                                        <input
                                            type="checkbox"
                                            prop:checked=checked
                                            on:change=move |_| {
                                                ctx.dispatch(TableAction::ToggleColumnVisibility {
                                                    column_id: column_id.clone(),
                                                })
                                            }
                                        />
                                        {column.title().to_string()}
                                    </label>
                                </li>
                            }
                        })
                        .collect_view()}
                </ul>
            </Show>
        </div>
    }
}
