//! Headless models behind the toolbar filter widgets.
//!
//! Each widget reads the committed value from [`TableState`], keeps whatever draft state it
//! needs, and produces a [`FilterCommit`] that the UI turns into
//! [`TableAction::SetColumnFilterValue`](crate::reducer::TableAction::SetColumnFilterValue).

use chrono::DateTime;

use crate::model::{ColumnDef, FilterValue, FilterVariant, RowSelectionState, TableState};

/// Select value meaning "no filter".
pub const ALL_OPTION_VALUE: &str = "__all";
/// Bounds used by range filters without configured or faceted bounds.
pub const DEFAULT_RANGE: (f64, f64) = (0.0, 100.0);
const DATE_LABEL_FORMAT: &str = "%B %-d, %Y";

#[derive(Debug, Clone, PartialEq)]
/// Outcome of a widget interaction.
pub enum FilterCommit {
    /// Store this value.
    Set(FilterValue),
    /// Remove the filter.
    Clear,
    /// Leave the filter untouched.
    Ignore,
}

impl FilterCommit {
    /// Converts the commit into the value of a filter-value action; `None` means no action.
    pub fn into_update(self) -> Option<Option<FilterValue>> {
        match self {
            Self::Set(value) => Some(Some(value)),
            Self::Clear => Some(None),
            Self::Ignore => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Widget rendered for a filterable column.
pub enum FilterControl {
    /// Free text input.
    Text,
    /// Numeric input with optional unit suffix.
    Number,
    /// Dual-handle slider.
    Range,
    /// Calendar popover; `range` selects two dates.
    Date {
        /// Whether a from/to pair is selected.
        range: bool,
    },
    /// Single option picker.
    Select,
    /// Multi option picker.
    MultiSelect,
}

/// Widget for a column, or `None` when the column renders no toolbar filter.
pub fn filter_control(column: &ColumnDef) -> Option<FilterControl> {
    if !column.enable_column_filter {
        return None;
    }
    match column.meta.variant? {
        FilterVariant::Text => Some(FilterControl::Text),
        FilterVariant::Number => Some(FilterControl::Number),
        FilterVariant::Range => Some(FilterControl::Range),
        FilterVariant::Date => Some(FilterControl::Date { range: false }),
        FilterVariant::DateRange => Some(FilterControl::Date { range: true }),
        FilterVariant::Select => Some(FilterControl::Select),
        FilterVariant::MultiSelect => Some(FilterControl::MultiSelect),
        FilterVariant::Boolean => None,
    }
}

/// Whether any column filter is active.
pub fn is_filtered(state: &TableState) -> bool {
    !state.column_filters.is_empty()
}

/// Whether any column is sorted.
pub fn is_sorted(state: &TableState) -> bool {
    !state.sorting.is_empty()
}

/// Whether the toolbar shows its reset button.
pub fn can_reset(state: &TableState) -> bool {
    is_filtered(state) || is_sorted(state)
}

/// Columns listed in the view-options menu.
pub fn hideable_columns(columns: &[ColumnDef]) -> impl Iterator<Item = &ColumnDef> {
    columns.iter().filter(|column| column.enable_hiding)
}

/// Text shown in a text or number input.
pub fn input_value(value: Option<&FilterValue>) -> String {
    value
        .and_then(FilterValue::first)
        .unwrap_or_default()
        .to_string()
}

/// Commits free text; the empty string removes the filter.
pub fn commit_text(input: &str) -> FilterCommit {
    if input.is_empty() {
        FilterCommit::Clear
    } else {
        FilterCommit::Set(FilterValue::Scalar(input.to_string()))
    }
}

/// Commits numeric text. Input that does not parse as a finite number is ignored.
pub fn commit_number(input: &str) -> FilterCommit {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return FilterCommit::Clear;
    }
    match trimmed.parse::<f64>() {
        Ok(number) if number.is_finite() => {
            FilterCommit::Set(FilterValue::Scalar(trimmed.to_string()))
        }
        _ => FilterCommit::Ignore,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Slider bounds for a range filter.
pub struct RangeModel {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl RangeModel {
    /// Bounds from column metadata, then faceted min/max, then [`DEFAULT_RANGE`].
    pub fn for_column(column: &ColumnDef, faceted: Option<(f64, f64)>) -> Self {
        let (a, b) = column.meta.range.or(faceted).unwrap_or(DEFAULT_RANGE);
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Current handle positions; missing or malformed values sit on the bounds.
    pub fn current(&self, value: Option<&FilterValue>) -> (f64, f64) {
        let parse = |item: Option<&str>| item.and_then(|item| item.trim().parse::<f64>().ok());
        let items = value.map(FilterValue::items).unwrap_or_default();
        let lo = parse(items.first().copied()).map_or(self.min, |lo| self.clamp(lo));
        let hi = parse(items.get(1).copied()).map_or(self.max, |hi| self.clamp(hi));
        (lo.min(hi), lo.max(hi))
    }

    /// Commits handle positions. Covering the full bounds removes the filter.
    pub fn commit(&self, lo: f64, hi: f64) -> FilterCommit {
        if lo.is_nan() || hi.is_nan() {
            return FilterCommit::Ignore;
        }
        let (lo, hi) = (self.clamp(lo.min(hi)), self.clamp(lo.max(hi)));
        if lo <= self.min && hi >= self.max {
            return FilterCommit::Clear;
        }
        FilterCommit::Set(FilterValue::list([lo.to_string(), hi.to_string()]))
    }
}

/// Option value shown by a single select: the first item, or [`ALL_OPTION_VALUE`].
pub fn select_value(value: Option<&FilterValue>) -> String {
    value
        .and_then(FilterValue::first)
        .unwrap_or(ALL_OPTION_VALUE)
        .to_string()
}

/// Commits a single-select choice.
pub fn commit_select(choice: &str) -> FilterCommit {
    if choice.is_empty() || choice == ALL_OPTION_VALUE {
        FilterCommit::Clear
    } else {
        FilterCommit::Set(FilterValue::list([choice]))
    }
}

/// Whether a multi-select option is selected.
pub fn is_option_selected(value: Option<&FilterValue>, option: &str) -> bool {
    value.is_some_and(|value| value.items().contains(&option))
}

/// Toggles a multi-select option. Deselecting the last option removes the filter.
pub fn toggle_option(value: Option<&FilterValue>, option: &str) -> FilterCommit {
    let mut items: Vec<String> = value
        .map(|value| value.items().into_iter().map(str::to_string).collect())
        .unwrap_or_default();
    match items.iter().position(|item| item == option) {
        Some(index) => {
            items.remove(index);
        }
        None => items.push(option.to_string()),
    }
    if items.is_empty() {
        FilterCommit::Clear
    } else {
        FilterCommit::Set(FilterValue::List(items))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Selected dates as unix timestamps in milliseconds. Single-date filters only use `from`.
pub struct DateSelection {
    /// Start date, or the single selected date.
    pub from: Option<i64>,
    /// End date of a range.
    pub to: Option<i64>,
}

impl DateSelection {
    /// Selection of a single date.
    pub fn single(at: i64) -> Self {
        Self {
            from: Some(at),
            to: None,
        }
    }

    /// Selection of a date range.
    pub fn range(from: Option<i64>, to: Option<i64>) -> Self {
        Self { from, to }
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Reads a committed filter value.
    pub fn from_value(value: Option<&FilterValue>, range: bool) -> Self {
        let items = value.map(FilterValue::items).unwrap_or_default();
        let from = items.first().and_then(|item| parse_timestamp(item));
        if !range {
            return Self { from, to: None };
        }
        Self {
            from,
            to: items.get(1).and_then(|item| parse_timestamp(item)),
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(|value| value as i64)
    })
}

/// Formats a millisecond timestamp as a long calendar date (UTC).
pub fn format_date(timestamp_ms: i64) -> String {
    DateTime::from_timestamp_millis(timestamp_ms)
        .map(|date| date.format(DATE_LABEL_FORMAT).to_string())
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Popover draft for date and date-range filters.
///
/// The pending selection is separate from the committed value until [`DateFilterDraft::apply`].
pub struct DateFilterDraft {
    range: bool,
    open: bool,
    pending: DateSelection,
}

impl DateFilterDraft {
    /// Closed draft for a single date (`range == false`) or a range.
    pub fn new(range: bool) -> Self {
        Self {
            range,
            open: false,
            pending: DateSelection::default(),
        }
    }

    /// Whether the draft selects a range.
    pub fn is_range(&self) -> bool {
        self.range
    }

    /// Whether the popover is open.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Pending selection.
    pub fn pending(&self) -> DateSelection {
        self.pending
    }

    /// Opens the popover, copying the committed value into the pending selection.
    pub fn open(&mut self, committed: Option<&FilterValue>) {
        self.pending = DateSelection::from_value(committed, self.range);
        self.open = true;
    }

    /// Closes the popover without committing.
    pub fn close(&mut self) {
        self.open = false;
    }

    /// Replaces the pending selection.
    pub fn select(&mut self, selection: DateSelection) {
        self.pending = if self.range {
            selection
        } else {
            DateSelection {
                from: selection.from,
                to: None,
            }
        };
    }

    /// Commits the pending selection and closes.
    ///
    /// A single date commits its timestamp; a range commits `[from, to]`, filling a missing
    /// endpoint from the other one. An empty selection removes the filter.
    pub fn apply(&mut self) -> FilterCommit {
        self.open = false;
        let DateSelection { from, to } = self.pending;
        if !self.range {
            return from.map_or(FilterCommit::Clear, |at| {
                FilterCommit::Set(FilterValue::Scalar(at.to_string()))
            });
        }
        match (from, to) {
            (None, None) => FilterCommit::Clear,
            (from, to) => {
                let from = from.or(to).unwrap_or_default();
                let to = to.unwrap_or(from);
                FilterCommit::Set(FilterValue::list([from.to_string(), to.to_string()]))
            }
        }
    }

    /// Empties the pending selection, commits an empty list, and closes.
    pub fn clear(&mut self) -> FilterCommit {
        self.pending = DateSelection::default();
        self.open = false;
        FilterCommit::Set(FilterValue::List(Vec::new()))
    }

    /// Whether the committed value selects at least one date.
    pub fn has_value(&self, committed: Option<&FilterValue>) -> bool {
        !DateSelection::from_value(committed, self.range).is_empty()
    }

    /// Trigger label: `All <title>`, the formatted date, or `from - to`.
    pub fn label(&self, title: &str, committed: Option<&FilterValue>) -> String {
        let selection = DateSelection::from_value(committed, self.range);
        match (selection.from, selection.to) {
            (None, None) => format!("All {}", title.to_lowercase()),
            (Some(from), Some(to)) if self.range => {
                format!("{} - {}", format_date(from), format_date(to))
            }
            (Some(at), _) | (None, Some(at)) => format_date(at),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Header checkbox state for the rows of the current page.
pub enum PageSelection {
    /// No row on the page is selected.
    None,
    /// Some rows are selected.
    Partial,
    /// Every row on the page is selected.
    All,
}

/// Selection state of the current page.
pub fn page_selection(row_ids: &[String], selection: &RowSelectionState) -> PageSelection {
    let selected = row_ids
        .iter()
        .filter(|id| selection.get(id.as_str()).copied().unwrap_or(false))
        .count();
    match selected {
        0 => PageSelection::None,
        n if n == row_ids.len() => PageSelection::All,
        _ => PageSelection::Partial,
    }
}

/// Selects or deselects every row of the current page, keeping other pages' selection.
pub fn set_page_selected(
    row_ids: &[String],
    selection: &RowSelectionState,
    selected: bool,
) -> RowSelectionState {
    let mut next = selection.clone();
    for id in row_ids {
        if selected {
            next.insert(id.clone(), true);
        } else {
            next.remove(id);
        }
    }
    next
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{ColumnFilter, ColumnSort};

    const NOV_14_2023: i64 = 1_699_920_000_000;
    const NOV_20_2023: i64 = 1_700_438_400_000;

    #[test]
    fn controls_dispatch_by_variant() {
        let text = ColumnDef::new("name", "Name").filter(FilterVariant::Text);
        let range = ColumnDef::new("createdAt", "Created").filter(FilterVariant::DateRange);
        let flag = ColumnDef::new("active", "Active").filter(FilterVariant::Boolean);
        let plain = ColumnDef::new("email", "Email");

        assert_eq!(filter_control(&text), Some(FilterControl::Text));
        assert_eq!(filter_control(&range), Some(FilterControl::Date { range: true }));
        assert_eq!(filter_control(&flag), None);
        assert_eq!(filter_control(&plain), None);
    }

    #[test]
    fn text_and_number_commits() {
        assert_eq!(commit_text(""), FilterCommit::Clear);
        assert_eq!(
            commit_text("jo"),
            FilterCommit::Set(FilterValue::Scalar("jo".into()))
        );
        assert_eq!(commit_number("abc"), FilterCommit::Ignore);
        assert_eq!(commit_number(" "), FilterCommit::Clear);
        assert_eq!(
            commit_number("4.5"),
            FilterCommit::Set(FilterValue::Scalar("4.5".into()))
        );
        assert_eq!(input_value(Some(&FilterValue::list(["7"]))), "7");
        assert_eq!(FilterCommit::Ignore.into_update(), None);
    }

    #[test]
    fn range_clamps_and_clears_on_full_bounds() {
        let column = ColumnDef::new("age", "Age")
            .filter(FilterVariant::Range)
            .range(18.0, 65.0);
        let model = RangeModel::for_column(&column, Some((0.0, 200.0)));

        assert_eq!(model.current(None), (18.0, 65.0));
        assert_eq!(
            model.current(Some(&FilterValue::list(["10", "30"]))),
            (18.0, 30.0)
        );
        assert_eq!(model.commit(0.0, 100.0), FilterCommit::Clear);
        assert_eq!(
            model.commit(40.0, 20.0),
            FilterCommit::Set(FilterValue::list(["20", "40"]))
        );

        let faceted = RangeModel::for_column(&ColumnDef::new("n", "N"), Some((5.0, 1.0)));
        assert_eq!((faceted.min, faceted.max), (1.0, 5.0));
    }

    #[test]
    fn select_uses_all_sentinel() {
        assert_eq!(select_value(None), ALL_OPTION_VALUE);
        assert_eq!(select_value(Some(&FilterValue::list(["admin"]))), "admin");
        assert_eq!(commit_select(ALL_OPTION_VALUE), FilterCommit::Clear);
        assert_eq!(
            commit_select("user"),
            FilterCommit::Set(FilterValue::list(["user"]))
        );
    }

    #[test]
    fn multi_select_toggles_options() {
        let value = FilterValue::list(["admin"]);
        assert!(is_option_selected(Some(&value), "admin"));
        assert_eq!(
            toggle_option(Some(&value), "user"),
            FilterCommit::Set(FilterValue::list(["admin", "user"]))
        );
        assert_eq!(toggle_option(Some(&value), "admin"), FilterCommit::Clear);
    }

    #[test]
    fn date_draft_keeps_pending_until_apply() {
        let committed = FilterValue::Scalar(NOV_14_2023.to_string());
        let mut draft = DateFilterDraft::new(false);
        draft.open(Some(&committed));
        assert!(draft.is_open());
        assert_eq!(draft.pending(), DateSelection::single(NOV_14_2023));

        draft.select(DateSelection::range(Some(NOV_20_2023), Some(NOV_14_2023)));
        assert_eq!(draft.pending().to, None);
        assert_eq!(
            draft.apply(),
            FilterCommit::Set(FilterValue::Scalar(NOV_20_2023.to_string()))
        );
        assert!(!draft.is_open());
    }

    #[test]
    fn date_range_fills_missing_endpoint_and_clear_commits_empty_list() {
        let mut draft = DateFilterDraft::new(true);
        draft.open(None);
        draft.select(DateSelection::range(Some(NOV_14_2023), None));
        assert_eq!(
            draft.apply(),
            FilterCommit::Set(FilterValue::list([
                NOV_14_2023.to_string(),
                NOV_14_2023.to_string()
            ]))
        );

        draft.open(None);
        assert_eq!(draft.clear(), FilterCommit::Set(FilterValue::List(Vec::new())));
        assert!(!draft.is_open());
        assert!(draft.pending().is_empty());
    }

    #[test]
    fn date_labels() {
        let range = DateFilterDraft::new(true);
        assert_eq!(range.label("Created At", None), "All created at");
        let value = FilterValue::list([NOV_14_2023.to_string(), NOV_20_2023.to_string()]);
        assert_eq!(
            range.label("Created At", Some(&value)),
            "November 14, 2023 - November 20, 2023"
        );
        assert!(range.has_value(Some(&value)));

        let single = DateFilterDraft::new(false);
        assert_eq!(
            single.label("Joined", Some(&FilterValue::Scalar(NOV_14_2023.to_string()))),
            "November 14, 2023"
        );
        assert!(!single.has_value(Some(&FilterValue::List(Vec::new()))));
    }

    #[test]
    fn toolbar_flags_follow_state() {
        let mut state = TableState::default();
        assert!(!can_reset(&state));
        state.sorting = vec![ColumnSort::asc("name")];
        assert!(is_sorted(&state) && !is_filtered(&state) && can_reset(&state));
        state.column_filters = vec![ColumnFilter::new("role", FilterValue::list(["admin"]))];
        assert!(is_filtered(&state));
    }

    #[test]
    fn page_selection_tracks_current_rows() {
        let rows: Vec<String> = vec!["1".into(), "2".into()];
        let mut selection = RowSelectionState::new();
        selection.insert("9".into(), true);
        assert_eq!(page_selection(&rows, &selection), PageSelection::None);

        selection.insert("1".into(), true);
        assert_eq!(page_selection(&rows, &selection), PageSelection::Partial);

        let all = set_page_selected(&rows, &selection, true);
        assert_eq!(page_selection(&rows, &all), PageSelection::All);
        let none = set_page_selected(&rows, &all, false);
        assert_eq!(none.len(), 1);
        assert!(none.contains_key("9"));
    }
}
