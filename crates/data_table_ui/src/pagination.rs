//! Pagination footer.

use data_table::TableAction;
use leptos::*;

use crate::table::use_data_table;

/// Page sizes offered by the footer.
pub const PAGE_SIZE_OPTIONS: [u32; 5] = [10, 20, 30, 40, 50];

fn page_label(page: u32, page_count: u32) -> String {
    format!("Page {page} of {}", page_count.max(1))
}

fn selection_label(selected: usize, rows: usize) -> String {
    format!("{selected} of {rows} row(s) selected.")
}

/// Page sizes to list, keeping a current size that is not one of the presets.
fn page_size_choices(current: u32) -> Vec<u32> {
    let mut choices = PAGE_SIZE_OPTIONS.to_vec();
    if !choices.contains(&current) {
        choices.push(current);
        choices.sort_unstable();
    }
    choices
}

#[component]
/// Footer with the selection summary, page size picker, and page navigation.
pub fn DataTablePagination() -> impl IntoView {
    let ctx = use_data_table();
    let page = move || ctx.state.with(|state| state.pagination.page);
    let per_page = move || ctx.state.with(|state| state.pagination.per_page);
    let page_count = move || ctx.page_count.get();
    let can_previous = move || data_table::pagination::can_previous_page(page());
    let can_next = move || data_table::pagination::can_next_page(page(), page_count());
    let selected = move || {
        let rows = ctx.rows.get();
        let selected = ctx.state.with(|state| {
            rows.iter()
                .filter(|row| state.is_row_selected(&row.id))
                .count()
        });
        selection_label(selected, rows.len())
    };

    view! {
        <div
            class="ui-data-table-pagination"
            data-ui-primitive="true"
            data-ui-kind="data-table-pagination"
        >
            <div data-ui-slot="selection">{selected}</div>
            <label data-ui-slot="page-size">
                "Rows per page"
                <select
                    class="ui-field"
                    prop:value=move || per_page().to_string()
                    on:change=move |ev| {
                        match event_target_value(&ev).parse::<u32>() {
                            Ok(size) => ctx.dispatch(TableAction::SetPageSize(size)),
                            Err(err) => logging::warn!("invalid page size: {err}"),
                        }
                    }
                >
                    {move || {
                        page_size_choices(per_page())
                            .into_iter()
                            .map(|size| view! { <option value=size.to_string()>{size}</option> })
                            .collect_view()
                    }}
                </select>
            </label>
            <div data-ui-slot="page-label">{move || page_label(page(), page_count())}</div>
            <nav aria-label="Pagination" data-ui-slot="page-controls">
                <button
                    type="button"
                    class="ui-button"
                    aria-label="Go to first page"
                    disabled=move || !can_previous()
                    on:click=move |_| ctx.dispatch(TableAction::SetPageIndex(0))
                >
                    "\u{00ab}"
                </button>
                <button
                    type="button"
                    class="ui-button"
                    aria-label="Go to previous page"
                    disabled=move || !can_previous()
                    on:click=move |_| ctx.previous_page()
                >
                    "\u{2039}"
                </button>
                <button
                    type="button"
                    class="ui-button"
                    aria-label="Go to next page"
                    disabled=move || !can_next()
                    on:click=move |_| ctx.next_page()
                >
                    "\u{203a}"
                </button>
                <button
                    type="button"
                    class="ui-button"
                    aria-label="Go to last page"
                    disabled=move || !can_next()
                    on:click=move |_| {
                        let last = ctx.page_count.get_untracked().saturating_sub(1);
                        ctx.dispatch(TableAction::SetPageIndex(last))
                    }
                >
                    "\u{00bb}"
                </button>
            </nav>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn labels_never_report_zero_pages() {
        assert_eq!(page_label(1, 0), "Page 1 of 1");
        assert_eq!(page_label(3, 10), "Page 3 of 10");
        assert_eq!(selection_label(2, 10), "2 of 10 row(s) selected.");
    }

    #[test]
    fn custom_page_size_is_listed_in_order() {
        assert_eq!(page_size_choices(20), vec![10, 20, 30, 40, 50]);
        assert_eq!(page_size_choices(25), vec![10, 20, 25, 30, 40, 50]);
    }
}
