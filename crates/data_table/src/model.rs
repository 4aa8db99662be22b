//! Table state slices, column descriptors, and the externally observed query snapshot.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Default page size used when neither the URL nor the caller supplies one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// One-based pagination state. Both fields are always at least 1.
pub struct PaginationState {
    /// One-based page number.
    pub page: u32,
    /// Rows per page.
    pub per_page: u32,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PaginationState {
    /// Zero-based page index as consumed by grid engines.
    pub fn page_index(self) -> u32 {
        self.page.saturating_sub(1)
    }

    /// Builds pagination from a zero-based index and a page size.
    pub fn from_index(page_index: u32, page_size: u32) -> Self {
        Self {
            page: page_index.saturating_add(1),
            per_page: page_size.max(1),
        }
    }

    /// Replaces non-positive fields with the matching field of `defaults`.
    pub fn clamped(self, defaults: PaginationState) -> Self {
        Self {
            page: if self.page > 0 { self.page } else { defaults.page },
            per_page: if self.per_page > 0 {
                self.per_page
            } else {
                defaults.per_page
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Single sort entry. Serialized as `{"id": .., "desc": ..}`.
pub struct ColumnSort {
    /// Sorted column id.
    pub id: String,
    /// Whether the column sorts descending.
    pub desc: bool,
}

impl ColumnSort {
    /// Ascending sort on `id`.
    pub fn asc(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            desc: false,
        }
    }

    /// Descending sort on `id`.
    pub fn desc(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            desc: true,
        }
    }
}

/// Ordered sort descriptor.
pub type SortingState = Vec<ColumnSort>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
/// Filter payload: a single scalar or a sequence of values.
///
/// Absence (`null`) is modelled as `Option<FilterValue>::None` at every call site.
pub enum FilterValue {
    /// Free-form single value.
    Scalar(String),
    /// Multi-value payload (option lists, ranges, date pairs).
    List(Vec<String>),
}

impl FilterValue {
    /// Convenience constructor for a list value.
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Returns the value as a slice of items; scalars yield a single item.
    pub fn items(&self) -> Vec<&str> {
        match self {
            Self::Scalar(value) => vec![value.as_str()],
            Self::List(values) => values.iter().map(String::as_str).collect(),
        }
    }

    /// First item of the value, if any.
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Scalar(value) => Some(value.as_str()),
            Self::List(values) => values.first().map(String::as_str),
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(value) => f.write_str(value),
            Self::List(values) => f.write_str(&values.join(", ")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Active filter entry keyed by column id.
pub struct ColumnFilter {
    /// Filtered column id.
    pub id: String,
    /// Filter payload.
    pub value: FilterValue,
}

impl ColumnFilter {
    /// Creates a filter entry.
    pub fn new(id: impl Into<String>, value: FilterValue) -> Self {
        Self {
            id: id.into(),
            value,
        }
    }
}

/// Ordered set of active column filters.
pub type ColumnFiltersState = Vec<ColumnFilter>;
/// Column visibility keyed by column id. Missing ids are visible.
pub type VisibilityState = BTreeMap<String, bool>;
/// Row selection keyed by row id. Missing ids are unselected.
pub type RowSelectionState = BTreeMap<String, bool>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Semantic filter category attached to a column.
pub enum FilterVariant {
    /// Free text input.
    Text,
    /// Numeric input with optional unit.
    Number,
    /// Dual-handle numeric range.
    Range,
    /// Single calendar date.
    Date,
    /// Calendar date range.
    DateRange,
    /// Boolean toggle.
    Boolean,
    /// Single option picker.
    Select,
    /// Multi option picker.
    MultiSelect,
}

impl FilterVariant {
    /// Stable token used in DOM attributes and JSON.
    pub fn token(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Range => "range",
            Self::Date => "date",
            Self::DateRange => "dateRange",
            Self::Boolean => "boolean",
            Self::Select => "select",
            Self::MultiSelect => "multiSelect",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Filter operators understood by the advanced filter model.
pub enum FilterOperator {
    /// Case-insensitive contains.
    #[serde(rename = "iLike")]
    ILike,
    /// Case-insensitive does-not-contain.
    #[serde(rename = "notILike")]
    NotILike,
    /// Equals.
    Eq,
    /// Not equals.
    Ne,
    /// Member of list.
    InArray,
    /// Not member of list.
    NotInArray,
    /// Value is empty.
    IsEmpty,
    /// Value is not empty.
    IsNotEmpty,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Inclusive range.
    IsBetween,
    /// Relative date window.
    IsRelativeToToday,
}

impl FilterOperator {
    /// Operators that take no value.
    pub fn is_nullary(self) -> bool {
        matches!(self, Self::IsEmpty | Self::IsNotEmpty)
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::ILike => "Contains",
            Self::NotILike => "Does not contain",
            Self::Eq => "Is",
            Self::Ne => "Is not",
            Self::InArray => "Has any of",
            Self::NotInArray => "Has none of",
            Self::IsEmpty => "Is empty",
            Self::IsNotEmpty => "Is not empty",
            Self::Lt => "Is less than",
            Self::Lte => "Is less than or equal to",
            Self::Gt => "Is greater than",
            Self::Gte => "Is greater than or equal to",
            Self::IsBetween => "Is between",
            Self::IsRelativeToToday => "Is relative to today",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// How advanced filters combine.
pub enum JoinOperator {
    /// All filters must match.
    #[default]
    And,
    /// Any filter may match.
    Or,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Filter entry used by advanced filter lists.
pub struct ExtendedColumnFilter {
    /// Filtered column id.
    pub id: String,
    /// Filter payload; `None` for nullary operators.
    pub value: Option<FilterValue>,
    /// Variant of the filtered column.
    pub variant: FilterVariant,
    /// Applied operator.
    pub operator: FilterOperator,
    /// Stable id of the filter row.
    pub filter_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Selectable option for select and multi-select filters.
pub struct FilterOption {
    /// Display label.
    pub label: String,
    /// Encoded value.
    pub value: String,
    /// Optional facet count rendered next to the label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

impl FilterOption {
    /// Creates an option without a facet count.
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            count: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Capability descriptor attached to a column.
pub struct ColumnMeta {
    /// Column label shown above its toolbar filter.
    pub label: Option<String>,
    /// Input placeholder.
    pub placeholder: Option<String>,
    /// Filter variant selecting the toolbar adapter.
    pub variant: Option<FilterVariant>,
    /// Options for select variants. Presence switches URL decoding to list mode.
    pub options: Option<Vec<FilterOption>>,
    /// Bounds for range filters.
    pub range: Option<(f64, f64)>,
    /// Unit suffix for numeric filters.
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Column definition consumed by the coordinator and the toolbar.
pub struct ColumnDef {
    /// Column id; also the URL key for its filter.
    pub id: String,
    /// Header text.
    pub header: String,
    /// Whether the column participates in toolbar filtering and URL sync.
    #[serde(default)]
    pub enable_column_filter: bool,
    /// Whether the column header toggles sorting.
    #[serde(default = "default_true")]
    pub enable_sorting: bool,
    /// Whether the column can be hidden from view options.
    #[serde(default = "default_true")]
    pub enable_hiding: bool,
    /// Filter capability metadata.
    #[serde(default)]
    pub meta: ColumnMeta,
}

fn default_true() -> bool {
    true
}

impl ColumnDef {
    /// Creates a sortable, hideable, unfiltered column.
    pub fn new(id: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            header: header.into(),
            enable_column_filter: false,
            enable_sorting: true,
            enable_hiding: true,
            meta: ColumnMeta::default(),
        }
    }

    /// Enables filtering with the given variant.
    pub fn filter(mut self, variant: FilterVariant) -> Self {
        self.enable_column_filter = true;
        self.meta.variant = Some(variant);
        self
    }

    /// Sets select options.
    pub fn options(mut self, options: Vec<FilterOption>) -> Self {
        self.meta.options = Some(options);
        self
    }

    /// Sets the toolbar label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.meta.label = Some(label.into());
        self
    }

    /// Sets range bounds.
    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.meta.range = Some((min, max));
        self
    }

    /// Sets the numeric unit suffix.
    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.meta.unit = Some(unit.into());
        self
    }

    /// Disables header sorting.
    pub fn unsortable(mut self) -> Self {
        self.enable_sorting = false;
        self
    }

    /// Whether URL filter values for this column decode as lists.
    pub fn has_options(&self) -> bool {
        self.meta.options.is_some()
    }

    /// Label used by toolbar widgets, falling back to the column id.
    pub fn title(&self) -> &str {
        self.meta.label.as_deref().unwrap_or(&self.id)
    }
}

/// Returns the set of column ids in `columns`, skipping empty ids.
pub fn column_id_set(columns: &[ColumnDef]) -> BTreeSet<String> {
    columns
        .iter()
        .filter(|column| !column.id.is_empty())
        .map(|column| column.id.clone())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Pagination metadata reported by the server.
pub struct RemotePaginationMeta {
    /// Current page reported by the server.
    pub page: u32,
    /// Page size used by the server.
    pub limit: u32,
    /// Total number of rows across all pages.
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Caller-supplied initial state, used below URL values in priority.
pub struct InitialTableState {
    /// Initial pagination.
    pub pagination: Option<PaginationState>,
    /// Initial sort descriptor.
    pub sorting: Option<SortingState>,
    /// Filters used when the URL carries no filter params.
    pub column_filters: Option<ColumnFiltersState>,
    /// Initial column visibility.
    pub column_visibility: Option<VisibilityState>,
    /// Initial row selection.
    pub row_selection: Option<RowSelectionState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Minimal description of what data the host should fetch.
pub struct QuerySnapshot {
    /// One-based page.
    pub page: u32,
    /// Page size.
    pub per_page: u32,
    /// Sort descriptor.
    pub sorting: SortingState,
    /// Active column filters.
    pub column_filters: ColumnFiltersState,
}

impl QuerySnapshot {
    /// Looks up the filter value for a column.
    pub fn filter_value(&self, column_id: &str) -> Option<&FilterValue> {
        self.column_filters
            .iter()
            .find(|filter| filter.id == column_id)
            .map(|filter| &filter.value)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
/// Canonical table state owned by the coordinator.
pub struct TableState {
    /// Pagination slice, mirrored in the URL.
    pub pagination: PaginationState,
    /// Sort slice, mirrored in the URL.
    pub sorting: SortingState,
    /// Filter slice, mirrored in the URL outside advanced mode.
    pub column_filters: ColumnFiltersState,
    /// Local-only visibility slice.
    pub column_visibility: VisibilityState,
    /// Local-only selection slice.
    pub row_selection: RowSelectionState,
}

impl TableState {
    /// Derives the externally observed query snapshot.
    pub fn snapshot(&self) -> QuerySnapshot {
        QuerySnapshot {
            page: self.pagination.page,
            per_page: self.pagination.per_page,
            sorting: self.sorting.clone(),
            column_filters: self.column_filters.clone(),
        }
    }

    /// Whether a column is currently visible.
    pub fn is_column_visible(&self, column_id: &str) -> bool {
        self.column_visibility
            .get(column_id)
            .copied()
            .unwrap_or(true)
    }

    /// Whether a row is currently selected.
    pub fn is_row_selected(&self, row_id: &str) -> bool {
        self.row_selection.get(row_id).copied().unwrap_or(false)
    }

    /// Current filter value for a column.
    pub fn filter_value(&self, column_id: &str) -> Option<&FilterValue> {
        self.column_filters
            .iter()
            .find(|filter| filter.id == column_id)
            .map(|filter| &filter.value)
    }

    /// Current sort direction for a column: `Some(desc)` when sorted.
    pub fn sort_direction(&self, column_id: &str) -> Option<bool> {
        self.sorting
            .iter()
            .find(|sort| sort.id == column_id)
            .map(|sort| sort.desc)
    }
}

/// New value for a state slice: either a literal or a function of the current value.
pub enum Updater<T> {
    /// Replace the slice with this value.
    Value(T),
    /// Compute the next slice from the current one.
    Func(Box<dyn FnOnce(&T) -> T>),
}

impl<T> Updater<T> {
    /// Wraps an update function.
    pub fn func(f: impl FnOnce(&T) -> T + 'static) -> Self {
        Self::Func(Box::new(f))
    }

    /// Resolves the updater against the current value.
    pub fn resolve(self, current: &T) -> T {
        match self {
            Self::Value(value) => value,
            Self::Func(f) => f(current),
        }
    }
}

impl<T> From<T> for Updater<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Updater<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Func(_) => f.write_str("Func(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn pagination_clamps_zero_fields_to_defaults() {
        let defaults = PaginationState {
            page: 1,
            per_page: 25,
        };
        let clamped = PaginationState {
            page: 0,
            per_page: 0,
        }
        .clamped(defaults);
        assert_eq!(clamped, defaults);
        assert_eq!(PaginationState::from_index(4, 20).page, 5);
        assert_eq!(PaginationState::from_index(4, 20).page_index(), 4);
    }

    #[test]
    fn filter_value_serializes_untagged() {
        let scalar = serde_json::to_string(&FilterValue::Scalar("admin".into())).unwrap();
        let list = serde_json::to_string(&FilterValue::list(["a", "b"])).unwrap();
        assert_eq!(scalar, "\"admin\"");
        assert_eq!(list, "[\"a\",\"b\"]");
    }

    #[test]
    fn snapshot_serializes_with_host_field_names() {
        let state = TableState {
            column_filters: vec![ColumnFilter::new("role", FilterValue::list(["admin"]))],
            ..TableState::default()
        };
        let json = serde_json::to_value(state.snapshot()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "page": 1,
                "perPage": 10,
                "sorting": [],
                "columnFilters": [{"id": "role", "value": ["admin"]}],
            })
        );
    }

    #[test]
    fn updater_resolves_literal_and_function() {
        let literal: Updater<u32> = 7.into();
        assert_eq!(literal.resolve(&1), 7);
        let func = Updater::func(|current: &u32| current + 1);
        assert_eq!(func.resolve(&1), 2);
    }

    #[test]
    fn column_def_deserializes_with_defaults() {
        let column: ColumnDef = serde_json::from_str(
            r#"{"id":"role","header":"Role","enableColumnFilter":true,
                "meta":{"variant":"select","options":[{"label":"Admin","value":"admin"}]}}"#,
        )
        .unwrap();
        assert!(column.enable_sorting);
        assert!(column.has_options());
        assert_eq!(column.meta.variant, Some(FilterVariant::Select));
    }
}
