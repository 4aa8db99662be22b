//! Loading placeholder shown while the first page is fetched.

use leptos::*;

use crate::dom::bool_token;

#[derive(Debug, Clone, PartialEq)]
/// Shape of the loading skeleton.
pub struct SkeletonOptions {
    /// Number of placeholder columns.
    pub column_count: usize,
    /// Number of placeholder rows.
    pub row_count: usize,
    /// Number of placeholder filter buttons in the toolbar row.
    pub filter_count: usize,
    /// Per-column CSS widths; missing entries use `auto`.
    pub cell_widths: Vec<String>,
    /// Render the pagination footer placeholder.
    pub with_pagination: bool,
    /// Render the view-options button placeholder.
    pub with_view_options: bool,
}

impl Default for SkeletonOptions {
    fn default() -> Self {
        Self {
            column_count: 1,
            row_count: 10,
            filter_count: 0,
            cell_widths: vec!["auto".to_string()],
            with_pagination: true,
            with_view_options: true,
        }
    }
}

impl SkeletonOptions {
    /// Default skeleton for a table with `column_count` columns.
    pub fn for_columns(column_count: usize) -> Self {
        Self {
            column_count: column_count.max(1),
            ..Self::default()
        }
    }

    /// Width of one placeholder column; the last configured width repeats.
    pub fn cell_width(&self, index: usize) -> String {
        self.cell_widths
            .get(index)
            .or_else(|| self.cell_widths.last())
            .cloned()
            .unwrap_or_else(|| "auto".to_string())
    }
}

#[component]
/// Placeholder grid matching the table layout.
pub fn DataTableSkeleton(#[prop(optional)] options: SkeletonOptions) -> impl IntoView {
    let columns: Vec<String> = (0..options.column_count.max(1))
        .map(|index| options.cell_width(index))
        .collect();
    let row_count = options.row_count;

    view! {
        <div
            class="ui-data-table-skeleton"
            aria-busy="true"
            data-ui-primitive="true"
            data-ui-kind="data-table-skeleton"
            data-ui-pagination=bool_token(options.with_pagination)
        >
            <div data-ui-slot="toolbar">
                {(0..options.filter_count)
                    .map(|_| view! { <span class="ui-skeleton" data-ui-slot="filter"></span> })
                    .collect_view()}
                {options
                    .with_view_options
                    .then(|| view! { <span class="ui-skeleton" data-ui-slot="view-options"></span> })}
            </div>
            <table class="ui-data-table" data-ui-kind="data-table">
                <thead>
                    <tr>
                        {columns
                            .iter()
                            .map(|width| {
                                view! {
                                    <th style=format!("width: {width}")>
                                        <span class="ui-skeleton"></span>
                                    </th>
                                }
                            })
                            .collect_view()}
                    </tr>
                </thead>
                <tbody>
                    {(0..row_count)
                        .map(|_| {
                            view! {
                                <tr>
                                    {columns
                                        .iter()
                                        .map(|width| {
                                            view! {
                                                <td style=format!("width: {width}")>
                                                    <span class="ui-skeleton"></span>
                                                </td>
                                            }
                                        })
                                        .collect_view()}
                                </tr>
                            }
                        })
                        .collect_view()}
                </tbody>
            </table>
            {options
                .with_pagination
                .then(|| view! { <div class="ui-skeleton" data-ui-slot="pagination"></div> })}
        </div>
    }
}

/// The skeleton covers only the first load; rows already on screen stay visible while loading.
pub(crate) fn shows_skeleton(is_loading: bool, row_count: usize) -> bool {
    is_loading && row_count == 0
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn last_cell_width_repeats() {
        let options = SkeletonOptions {
            column_count: 4,
            cell_widths: vec!["10rem".to_string(), "30rem".to_string()],
            ..SkeletonOptions::default()
        };
        assert_eq!(options.cell_width(0), "10rem");
        assert_eq!(options.cell_width(3), "30rem");
        assert_eq!(SkeletonOptions::for_columns(0).column_count, 1);
    }

    #[test]
    fn skeleton_only_replaces_an_empty_table() {
        assert!(shows_skeleton(true, 0));
        assert!(!shows_skeleton(true, 10));
        assert!(!shows_skeleton(false, 0));
    }
}
