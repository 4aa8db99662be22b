//! Per-variant toolbar filter widgets.
//!
//! Every widget reads the committed value from the table state and turns user input into a
//! [`FilterCommit`] through the headless models in [`data_table::toolbar`].

use data_table::toolbar::{
    commit_number, commit_select, commit_text, input_value, is_option_selected, select_value,
    toggle_option, DateFilterDraft, DateSelection, FilterCommit, RangeModel, ALL_OPTION_VALUE,
};
use data_table::{ColumnDef, FilterValue, TableAction};
use leptos::ev::MouseEvent;
use leptos::*;

use crate::dom::{bool_token, date_input_value, parse_date_input};
use crate::row::faceted_range;
use crate::table::{use_data_table, DataTableContext};

fn commit(ctx: DataTableContext, column_id: &str, commit: FilterCommit) {
    if let Some(value) = commit.into_update() {
        ctx.dispatch(TableAction::SetColumnFilterValue {
            column_id: column_id.to_string(),
            value,
        });
    }
}

fn committed_value(ctx: DataTableContext, column_id: &str) -> Option<FilterValue> {
    ctx.state
        .with(|state| state.filter_value(column_id).cloned())
}

fn placeholder(column: &ColumnDef) -> String {
    column
        .meta
        .placeholder
        .clone()
        .unwrap_or_else(|| format!("{}...", column.title()))
}

#[component]
/// Free-text filter.
pub fn TextFilter(column: ColumnDef) -> impl IntoView {
    let ctx = use_data_table();
    let column_id = column.id.clone();
    let value = {
        let column_id = column_id.clone();
        move || input_value(committed_value(ctx, &column_id).as_ref())
    };

    view! {
        <input
            class="ui-field"
            type="search"
            placeholder=placeholder(&column)
            aria-label=column.title().to_string()
            prop:value=value
            data-ui-primitive="true"
            data-ui-kind="text-filter"
            on:input=move |ev| commit(ctx, &column_id, commit_text(&event_target_value(&ev)))
        />
    }
}

#[component]
/// Numeric filter with an optional unit suffix.
pub fn NumberFilter(column: ColumnDef) -> impl IntoView {
    let ctx = use_data_table();
    let column_id = column.id.clone();
    let value = {
        let column_id = column_id.clone();
        move || input_value(committed_value(ctx, &column_id).as_ref())
    };
    let unit = column.meta.unit.clone();

    view! {
        <span class="ui-number-filter" data-ui-primitive="true" data-ui-kind="number-filter">
            <input
                class="ui-field"
                type="number"
                inputmode="numeric"
                placeholder=placeholder(&column)
                aria-label=column.title().to_string()
                prop:value=value
                on:input=move |ev| commit(ctx, &column_id, commit_number(&event_target_value(&ev)))
            />
            {unit.map(|unit| view! { <span data-ui-slot="unit">{unit}</span> })}
        </span>
    }
}

#[component]
/// Dual-handle range filter clamped to the column's bounds.
pub fn RangeFilter(column: ColumnDef) -> impl IntoView {
    let ctx = use_data_table();
    let column_id = column.id.clone();
    let model = {
        let column = column.clone();
        Signal::derive(move || {
            let faceted = ctx.rows.with(|rows| faceted_range(rows, &column.id));
            RangeModel::for_column(&column, faceted)
        })
    };
    let current = {
        let column_id = column_id.clone();
        Signal::derive(move || model.get().current(committed_value(ctx, &column_id).as_ref()))
    };
    let on_bound = move |index: usize, raw: String| {
        let Ok(number) = raw.trim().parse::<f64>() else {
            return;
        };
        let (lo, hi) = current.get_untracked();
        let (lo, hi) = if index == 0 { (number, hi) } else { (lo, number) };
        commit(ctx, &column_id, model.get_untracked().commit(lo, hi));
    };
    let on_bound_min = on_bound.clone();
    let title = column.title().to_string();
    let unit = column.meta.unit.clone().unwrap_or_default();

    view! {
        <fieldset class="ui-range-filter" data-ui-primitive="true" data-ui-kind="range-filter">
            <legend>{title.clone()}</legend>
            <input
                class="ui-field"
                type="number"
                aria-label=format!("{title} minimum")
                prop:min=move || model.get().min
                prop:max=move || model.get().max
                prop:value=move || current.get().0
                on:change=move |ev| on_bound_min(0, event_target_value(&ev))
            />
            <input
                class="ui-field"
                type="number"
                aria-label=format!("{title} maximum")
                prop:min=move || model.get().min
                prop:max=move || model.get().max
                prop:value=move || current.get().1
                on:change=move |ev| on_bound(1, event_target_value(&ev))
            />
            <span data-ui-slot="unit">{unit}</span>
        </fieldset>
    }
}

#[component]
/// Date or date-range filter with a pending selection behind an apply step.
pub fn DateFilter(column: ColumnDef, range: bool) -> impl IntoView {
    let ctx = use_data_table();
    let draft = create_rw_signal(DateFilterDraft::new(range));
    let column_id = column.id.clone();
    let title = column.title().to_string();
    let popover_id = format!("date-filter-{}", column.id);
    let popover_ref = popover_id.clone();

    let committed = {
        let column_id = column_id.clone();
        move || committed_value(ctx, &column_id)
    };
    let label = {
        let committed = committed.clone();
        move || draft.with(|draft| draft.label(&title, committed().as_ref()))
    };
    let has_value = {
        let committed = committed.clone();
        move || draft.with(|draft| draft.has_value(committed().as_ref()))
    };
    let toggle = {
        let committed = committed.clone();
        move |_: MouseEvent| {
            draft.update(|draft| {
                if draft.is_open() {
                    draft.close();
                } else {
                    draft.open(committed().as_ref());
                }
            })
        }
    };
    let set_endpoint = move |to: bool, raw: String| {
        let at = parse_date_input(&raw);
        draft.update(|draft| {
            let DateSelection { from, to: until } = draft.pending();
            let next = if to {
                DateSelection::range(from, at)
            } else {
                DateSelection::range(at, until)
            };
            draft.select(next);
        });
    };
    let set_until = set_endpoint.clone();
    let apply = {
        let column_id = column_id.clone();
        move |_: MouseEvent| {
            let mut result = FilterCommit::Ignore;
            draft.update(|draft| result = draft.apply());
            commit(ctx, &column_id, result);
        }
    };
    let clear = move |_: MouseEvent| {
        let mut result = FilterCommit::Ignore;
        draft.update(|draft| result = draft.clear());
        commit(ctx, &column_id, result);
    };

    view! {
        <div class="ui-date-filter" data-ui-primitive="true" data-ui-kind="date-filter">
            <button
                type="button"
                class="ui-button"
                aria-haspopup="dialog"
                aria-controls=popover_ref
                aria-expanded=move || bool_token(draft.with(DateFilterDraft::is_open))
                data-ui-selected=move || bool_token(has_value())
                on:click=toggle
            >
                {label}
            </button>
            <Show when=move || draft.with(DateFilterDraft::is_open)>
                <div id=popover_id.clone() role="dialog" data-ui-slot="popover">
                    <input
                        class="ui-field"
                        type="date"
                        aria-label={if range { "From" } else { "Date" }}
                        prop:value=move || date_input_value(draft.with(|draft| draft.pending().from))
                        on:change=move |ev| set_endpoint(false, event_target_value(&ev))
                    />
                    {range
                        .then(|| {
                            let set_until = set_until.clone();
                            view! {
                                <input
                                    class="ui-field"
                                    type="date"
                                    aria-label="To"
                                    prop:value=move || {
                                        date_input_value(draft.with(|draft| draft.pending().to))
                                    }
                                    on:change=move |ev| set_until(true, event_target_value(&ev))
                                />
                            }
                        })}
                    <div data-ui-slot="popover-actions">
                        <button type="button" class="ui-button" on:click=clear.clone()>
                            "Clear"
                        </button>
                        <button type="button" class="ui-button" on:click=apply.clone()>
                            "Apply"
                        </button>
                    </div>
                </div>
            </Show>
        </div>
    }
}

#[component]
/// Single-option filter; the "All" entry clears it.
pub fn SelectFilter(column: ColumnDef) -> impl IntoView {
    let ctx = use_data_table();
    let column_id = column.id.clone();
    let value = {
        let column_id = column_id.clone();
        move || select_value(committed_value(ctx, &column_id).as_ref())
    };
    let title = column.title().to_string();
    let options = column.meta.options.clone().unwrap_or_default();

    view! {
        <select
            class="ui-field"
            aria-label=title.clone()
            prop:value=value
            data-ui-primitive="true"
            data-ui-kind="select-filter"
            on:change=move |ev| commit(ctx, &column_id, commit_select(&event_target_value(&ev)))
        >
            <option value=ALL_OPTION_VALUE>{format!("All {}", title.to_lowercase())}</option>
            {options
                .into_iter()
                .map(|option| view! { <option value=option.value>{option.label}</option> })
                .collect_view()}
        </select>
    }
}

#[component]
/// Multi-option filter rendered as a checkbox list with optional facet counts.
pub fn MultiSelectFilter(column: ColumnDef) -> impl IntoView {
    let ctx = use_data_table();
    let title = column.title().to_string();
    let options = column.meta.options.clone().unwrap_or_default();
    let column_id = column.id;

    view! {
        <fieldset
            class="ui-multi-select-filter"
            data-ui-primitive="true"
            data-ui-kind="multi-select-filter"
        >
            <legend>{title}</legend>
            {options
                .into_iter()
                .map(|option| {
                    let selected = {
                        let column_id = column_id.clone();
                        let value = option.value.clone();
                        move || is_option_selected(committed_value(ctx, &column_id).as_ref(), &value)
                    };
                    let column_id = column_id.clone();
                    let value = option.value.clone();
                    view! {
                        <label data-ui-slot="option">
                            <input
                                type="checkbox"
                                prop:checked=selected
                                on:change=move |_| {
                                    let current = ctx
                                        .state
                                        .with_untracked(|state| state.filter_value(&column_id).cloned());
                                    commit(ctx, &column_id, toggle_option(current.as_ref(), &value));
                                }
                            />
                            <span>{option.label}</span>
                            {option.count.map(|count| view! { <span data-ui-slot="count">{count}</span> })}
                        </label>
                    }
                })
                .collect_view()}
        </fieldset>
    }
}
