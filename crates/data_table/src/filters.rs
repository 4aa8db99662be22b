//! Filter value normalization, activity checks, and per-variant operator tables.

use crate::codec::filter_values_eq;
use crate::model::{
    ColumnFilter, ExtendedColumnFilter, FilterOperator, FilterValue, FilterVariant,
};

use FilterOperator::*;

const TEXT_OPERATORS: &[FilterOperator] = &[ILike, NotILike, Eq, Ne, IsEmpty, IsNotEmpty];
const NUMERIC_OPERATORS: &[FilterOperator] =
    &[Eq, Ne, Lt, Lte, Gt, Gte, IsBetween, IsEmpty, IsNotEmpty];
const DATE_OPERATORS: &[FilterOperator] = &[
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    IsBetween,
    IsRelativeToToday,
    IsEmpty,
    IsNotEmpty,
];
const SELECT_OPERATORS: &[FilterOperator] = &[Eq, Ne, IsEmpty, IsNotEmpty];
const MULTI_SELECT_OPERATORS: &[FilterOperator] = &[InArray, NotInArray, IsEmpty, IsNotEmpty];
const BOOLEAN_OPERATORS: &[FilterOperator] = &[Eq, Ne];

/// Canonicalizes a filter value.
///
/// Lists are trimmed item by item with empty items removed and collapse to `None` when nothing
/// remains; the empty scalar becomes `None`; everything else passes through.
pub fn normalize(value: Option<FilterValue>) -> Option<FilterValue> {
    match value? {
        FilterValue::List(items) => {
            let items: Vec<String> = items
                .iter()
                .map(|item| item.trim())
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect();
            (!items.is_empty()).then_some(FilterValue::List(items))
        }
        FilterValue::Scalar(value) if value.is_empty() => None,
        scalar => Some(scalar),
    }
}

/// Whether an advanced filter entry constrains the result set.
pub fn is_active(filter: &ExtendedColumnFilter) -> bool {
    if filter.operator.is_nullary() {
        return true;
    }
    match &filter.value {
        Some(FilterValue::List(items)) => !items.is_empty(),
        Some(FilterValue::Scalar(value)) => !value.is_empty(),
        None => false,
    }
}

/// Keeps only the active entries of an advanced filter list.
pub fn valid_filters(filters: &[ExtendedColumnFilter]) -> Vec<ExtendedColumnFilter> {
    filters.iter().filter(|filter| is_active(filter)).cloned().collect()
}

/// Splits a URL-seeded scalar on runs of characters outside `[A-Za-z0-9]`.
///
/// Values without separators become a one-item list, so seeded filters are always lists.
pub fn split_seed_value(value: &str) -> Vec<String> {
    if value.chars().all(|c| c.is_ascii_alphanumeric()) {
        return vec![value.to_string()];
    }
    value
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Converts a decoded URL value into the list form used for seeded filters.
pub fn seed_value(value: FilterValue) -> Option<FilterValue> {
    match value {
        FilterValue::List(items) => normalize(Some(FilterValue::List(items))),
        FilterValue::Scalar(value) => normalize(Some(FilterValue::List(split_seed_value(&value)))),
    }
}

/// Operators available for a filter variant.
pub fn operators_for(variant: FilterVariant) -> &'static [FilterOperator] {
    match variant {
        FilterVariant::Text => TEXT_OPERATORS,
        FilterVariant::Number | FilterVariant::Range => NUMERIC_OPERATORS,
        FilterVariant::Date | FilterVariant::DateRange => DATE_OPERATORS,
        FilterVariant::Boolean => BOOLEAN_OPERATORS,
        FilterVariant::Select => SELECT_OPERATORS,
        FilterVariant::MultiSelect => MULTI_SELECT_OPERATORS,
    }
}

/// First operator of the variant's table.
pub fn default_operator(variant: FilterVariant) -> FilterOperator {
    operators_for(variant)
        .first()
        .copied()
        .unwrap_or(if variant == FilterVariant::Text { ILike } else { Eq })
}

/// Structural equality of two filter lists: same ids in the same order with equal values.
pub fn filters_structurally_eq(a: &[ColumnFilter], b: &[ColumnFilter]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(left, right)| {
                left.id == right.id && filter_values_eq(Some(&left.value), Some(&right.value))
            })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn extended(operator: FilterOperator, value: Option<FilterValue>) -> ExtendedColumnFilter {
        ExtendedColumnFilter {
            id: "name".to_string(),
            value,
            variant: FilterVariant::Text,
            operator,
            filter_id: "f1".to_string(),
        }
    }

    #[test]
    fn normalize_trims_lists_and_drops_empty_values() {
        assert_eq!(normalize(None), None);
        assert_eq!(normalize(Some(FilterValue::Scalar(String::new()))), None);
        assert_eq!(normalize(Some(FilterValue::list([" ", ""]))), None);
        assert_eq!(
            normalize(Some(FilterValue::list([" admin ", "", "user"]))),
            Some(FilterValue::list(["admin", "user"]))
        );
        assert_eq!(
            normalize(Some(FilterValue::Scalar(" keep ".into()))),
            Some(FilterValue::Scalar(" keep ".into()))
        );
    }

    #[test]
    fn normalize_is_idempotent() {
        let samples = [
            None,
            Some(FilterValue::Scalar(String::new())),
            Some(FilterValue::Scalar("x y".into())),
            Some(FilterValue::list([" a", "", "b "])),
            Some(FilterValue::list(Vec::<String>::new())),
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(once.clone()), once);
        }
    }

    #[test]
    fn activity_honours_nullary_operators() {
        assert!(is_active(&extended(IsEmpty, None)));
        assert!(is_active(&extended(IsNotEmpty, None)));
        assert!(!is_active(&extended(ILike, None)));
        assert!(!is_active(&extended(ILike, Some(FilterValue::Scalar(String::new())))));
        assert!(!is_active(&extended(InArray, Some(FilterValue::list(Vec::<String>::new())))));
        assert!(is_active(&extended(Eq, Some(FilterValue::Scalar("a".into())))));

        let filters = vec![
            extended(IsEmpty, None),
            extended(ILike, None),
            extended(Eq, Some(FilterValue::list(["a"]))),
        ];
        assert_eq!(valid_filters(&filters).len(), 2);
    }

    #[test]
    fn seed_values_split_on_non_alphanumeric_runs() {
        assert_eq!(split_seed_value("admin"), vec!["admin"]);
        assert_eq!(split_seed_value("john doe"), vec!["john", "doe"]);
        assert_eq!(split_seed_value("a, b;;c"), vec!["a", "b", "c"]);
        assert_eq!(
            seed_value(FilterValue::Scalar("1700000000000,1700086400000".into())),
            Some(FilterValue::list(["1700000000000", "1700086400000"]))
        );
        assert_eq!(seed_value(FilterValue::Scalar("--".into())), None);
    }

    #[test]
    fn operator_tables_match_variants() {
        assert_eq!(default_operator(FilterVariant::Text), ILike);
        assert_eq!(default_operator(FilterVariant::MultiSelect), InArray);
        assert_eq!(default_operator(FilterVariant::Range), Eq);
        assert!(operators_for(FilterVariant::DateRange).contains(&IsRelativeToToday));
        assert_eq!(operators_for(FilterVariant::Boolean), &[Eq, Ne]);
    }

    #[test]
    fn structural_equality_checks_order_and_values() {
        let a = vec![
            ColumnFilter::new("role", FilterValue::list(["admin"])),
            ColumnFilter::new("name", FilterValue::Scalar("jo".into())),
        ];
        let mut b = a.clone();
        assert!(filters_structurally_eq(&a, &b));
        b.reverse();
        assert!(!filters_structurally_eq(&a, &b));
    }
}
