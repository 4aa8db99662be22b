//! In-memory users backend for the live table preview.
//!
//! [`fetch_users`] plays the server: it applies the filters, sort, and page of a
//! [`QuerySnapshot`] to a fixed dataset and returns one page with pagination meta.

use std::cmp::Ordering;

use data_table::toolbar::format_date;
use data_table::{
    ColumnDef, ColumnSort, FilterOption, FilterValue, FilterVariant, QuerySnapshot,
    RemotePaginationMeta,
};
use data_table_ui::TableRow;

const DAY_MS: i64 = 86_400_000;
/// 2023-10-01T00:00:00Z
const FIRST_SIGNUP_MS: i64 = 1_696_118_400_000;
const USER_COUNT: u32 = 95;

const FIRST_NAMES: [&str; 10] = [
    "Ada", "Grace", "Alan", "Barbara", "Dennis", "Edsger", "Frances", "Ken", "Linus", "Margaret",
];
const LAST_NAMES: [&str; 7] = [
    "Lovelace", "Hopper", "Turing", "Liskov", "Ritchie", "Dijkstra", "Allen",
];

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: u32,
    pub name: String,
    pub email: String,
    pub role: &'static str,
    pub created_at: i64,
}

impl User {
    fn to_row(&self) -> TableRow {
        TableRow::new(self.id.to_string())
            .cell("name", self.name.clone())
            .cell("email", self.email.clone())
            .cell("role", self.role)
            .cell("createdAt", format_date(self.created_at))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UsersPage {
    pub rows: Vec<TableRow>,
    pub meta: RemotePaginationMeta,
}

/// Columns of the users preview.
pub fn user_columns() -> Vec<ColumnDef> {
    vec![
        ColumnDef::new("name", "Name")
            .filter(FilterVariant::Text)
            .label("Name"),
        ColumnDef::new("email", "Email"),
        ColumnDef::new("role", "Role")
            .filter(FilterVariant::Select)
            .label("Role")
            .options(vec![
                FilterOption::new("Admin", "admin"),
                FilterOption::new("User", "user"),
            ]),
        ColumnDef::new("createdAt", "Created At")
            .filter(FilterVariant::DateRange)
            .label("Created At"),
    ]
}

fn users() -> Vec<User> {
    (0..USER_COUNT)
        .map(|index| {
            let first = FIRST_NAMES[index as usize % FIRST_NAMES.len()];
            let last = LAST_NAMES[index as usize % LAST_NAMES.len()];
            User {
                id: index + 1,
                name: format!("{first} {last}"),
                email: format!(
                    "{}.{}{}@example.com",
                    first.to_lowercase(),
                    last.to_lowercase(),
                    index + 1
                ),
                role: if index % 5 == 0 { "admin" } else { "user" },
                created_at: FIRST_SIGNUP_MS + i64::from(index) * DAY_MS,
            }
        })
        .collect()
}

fn matches_name(user: &User, value: &FilterValue) -> bool {
    let name = user.name.to_lowercase();
    value
        .items()
        .iter()
        .all(|term| name.contains(&term.to_lowercase()))
}

fn matches_role(user: &User, value: &FilterValue) -> bool {
    let roles = value.items();
    roles.is_empty() || roles.contains(&user.role)
}

/// Inclusive day range; a single timestamp selects that day.
fn matches_created_at(user: &User, value: &FilterValue) -> bool {
    let bounds: Vec<i64> = value
        .items()
        .iter()
        .filter_map(|item| item.parse().ok())
        .collect();
    let (from, to) = match bounds.as_slice() {
        [] => return true,
        [at] => (*at, *at),
        [from, to, ..] => (*from.min(to), *from.max(to)),
    };
    user.created_at >= from && user.created_at < to + DAY_MS
}

fn compare(a: &User, b: &User, sort: &ColumnSort) -> Ordering {
    let ordering = match sort.id.as_str() {
        "name" => a.name.cmp(&b.name),
        "email" => a.email.cmp(&b.email),
        "role" => a.role.cmp(b.role),
        "createdAt" => a.created_at.cmp(&b.created_at),
        _ => Ordering::Equal,
    };
    if sort.desc {
        ordering.reverse()
    } else {
        ordering
    }
}

/// Applies a query snapshot to the users dataset.
pub fn fetch_users(query: &QuerySnapshot) -> UsersPage {
    let mut matched: Vec<User> = users()
        .into_iter()
        .filter(|user| {
            query.column_filters.iter().all(|filter| match filter.id.as_str() {
                "name" => matches_name(user, &filter.value),
                "role" => matches_role(user, &filter.value),
                "createdAt" => matches_created_at(user, &filter.value),
                _ => true,
            })
        })
        .collect();

    matched.sort_by(|a, b| {
        query
            .sorting
            .iter()
            .map(|sort| compare(a, b, sort))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| a.id.cmp(&b.id))
    });

    let limit = query.per_page.max(1);
    let page = query.page.max(1);
    let start = u64::from(page - 1).saturating_mul(u64::from(limit));
    let start = usize::try_from(start).unwrap_or(usize::MAX);
    let rows = matched
        .iter()
        .skip(start)
        .take(usize::try_from(limit).unwrap_or(usize::MAX))
        .map(User::to_row)
        .collect();

    UsersPage {
        rows,
        meta: RemotePaginationMeta {
            page,
            limit,
            total: matched.len() as u64,
        },
    }
}

#[cfg(test)]
mod tests {
    use data_table::{page_count_from_pagination, ColumnFilter};
    use pretty_assertions::assert_eq;

    use super::*;

    fn query(page: u32, column_filters: Vec<ColumnFilter>, sorting: Vec<ColumnSort>) -> QuerySnapshot {
        QuerySnapshot {
            page,
            per_page: 10,
            sorting,
            column_filters,
        }
    }

    #[test]
    fn unfiltered_first_page_reports_ten_pages() {
        let result = fetch_users(&query(1, Vec::new(), Vec::new()));
        assert_eq!(result.rows.len(), 10);
        assert_eq!(result.meta.total, 95);
        assert_eq!(page_count_from_pagination(&result.meta), 10);
        assert_eq!(result.rows[0].text("name"), "Ada Lovelace");
    }

    #[test]
    fn last_page_is_partial() {
        let result = fetch_users(&query(10, Vec::new(), Vec::new()));
        assert_eq!(result.rows.len(), 5);
    }

    #[test]
    fn page_far_past_the_end_is_empty() {
        let mut far = query(u32::MAX, Vec::new(), Vec::new());
        far.per_page = 50;
        let result = fetch_users(&far);
        assert!(result.rows.is_empty());
        assert_eq!(result.meta.page, u32::MAX);
        assert_eq!(result.meta.total, 95);
    }

    #[test]
    fn role_filter_keeps_admins_only() {
        let filters = vec![ColumnFilter::new("role", FilterValue::list(["admin"]))];
        let result = fetch_users(&query(1, filters, Vec::new()));
        assert_eq!(result.meta.total, 19);
        assert!(result.rows.iter().all(|row| row.text("role") == "admin"));
    }

    #[test]
    fn name_terms_must_all_match() {
        let filters = vec![ColumnFilter::new("name", FilterValue::list(["grace", "hop"]))];
        let result = fetch_users(&query(1, filters, Vec::new()));
        assert!(result.meta.total > 0);
        assert!(result
            .rows
            .iter()
            .all(|row| row.text("name") == "Grace Hopper"));
    }

    #[test]
    fn created_at_range_is_inclusive_of_both_days() {
        let from = FIRST_SIGNUP_MS + 2 * DAY_MS;
        let to = FIRST_SIGNUP_MS + 4 * DAY_MS;
        let filters = vec![ColumnFilter::new(
            "createdAt",
            FilterValue::list([from.to_string(), to.to_string()]),
        )];
        let result = fetch_users(&query(1, filters, Vec::new()));
        assert_eq!(result.meta.total, 3);
    }

    #[test]
    fn sorting_by_created_at_descending_starts_with_newest() {
        let result = fetch_users(&query(1, Vec::new(), vec![ColumnSort::desc("createdAt")]));
        assert_eq!(result.rows[0].id, "95");
    }
}
