//! Generic list view: search, tri-state sort, grouping by field, pagination
//!
//! Works on any row type implementing [`Listable`]. Movements and grouped
//! movement views implement it so the movements table can be re-sorted after
//! reconciliation.

pub mod pagination;
pub mod sort;

pub use pagination::*;
pub use sort::*;

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::reconciliation::MovementView;
use crate::types::Movement;

/// A cell value as seen by sorting, searching and grouping
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(BigDecimal),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Bool(bool),
}

impl FieldValue {
    pub fn is_temporal(&self) -> bool {
        matches!(self, FieldValue::Date(_) | FieldValue::DateTime(_))
    }

    /// Text used for search matching and group keys
    pub fn display_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            FieldValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            FieldValue::Bool(b) => b.to_string(),
        }
    }

    /// Compare two values; text compares case-insensitively and mixed kinds
    /// fall back to their display text
    pub fn compare(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Text(a), FieldValue::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            (FieldValue::Number(a), FieldValue::Number(b)) => a.cmp(b),
            (FieldValue::Date(a), FieldValue::Date(b)) => a.cmp(b),
            (FieldValue::DateTime(a), FieldValue::DateTime(b)) => a.cmp(b),
            (FieldValue::Date(a), FieldValue::DateTime(b)) => a.cmp(&b.date()),
            (FieldValue::DateTime(a), FieldValue::Date(b)) => a.date().cmp(b),
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a.cmp(b),
            (a, b) => a.display_text().to_lowercase().cmp(&b.display_text().to_lowercase()),
        }
    }
}

/// Row type usable in a [`ListView`]
pub trait Listable {
    /// Value of a named field, `None` when the row has no value for it
    fn field(&self, key: &str) -> Option<FieldValue>;
}

/// Declared column of a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub key: String,
    pub label: String,
    pub sortable: bool,
    pub searchable: bool,
}

impl Column {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            sortable: true,
            searchable: true,
        }
    }

    pub fn not_searchable(mut self) -> Self {
        self.searchable = false;
        self
    }

    pub fn not_sortable(mut self) -> Self {
        self.sortable = false;
        self
    }
}

/// User-driven state of a list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    pub search: String,
    pub sort: SortState,
    /// 1-based page number
    pub page: usize,
    pub group_by: Option<String>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self {
            page: 1,
            ..Self::default()
        }
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn sort(mut self, sort: SortState) -> Self {
        self.sort = sort;
        self
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn group_by(mut self, key: impl Into<String>) -> Self {
        self.group_by = Some(key.into());
        self
    }
}

/// Rows sharing one value of the grouping field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowGroup<T> {
    pub key: String,
    pub header: Option<String>,
    pub rows: Vec<T>,
}

/// Result of applying a query to a list of rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Present when the query groups by a field; buckets the page items
    pub groups: Vec<RowGroup<T>>,
    /// Rows failing the active predicate, shown apart and not paginated
    pub inactive: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub window: Vec<PageItem>,
}

type HeaderFn<T> = Box<dyn Fn(&str, &[T]) -> String + Send + Sync>;
type ActiveFn<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// Reusable, type-agnostic list display logic
pub struct ListView<T> {
    columns: Vec<Column>,
    page_size: usize,
    window_threshold: usize,
    date_fallback: Option<String>,
    group_header: Option<HeaderFn<T>>,
    active: Option<ActiveFn<T>>,
}

impl<T: Listable + Clone> ListView<T> {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            page_size: 10,
            window_threshold: 7,
            date_fallback: None,
            group_header: None,
            active: None,
        }
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn window_threshold(mut self, threshold: usize) -> Self {
        self.window_threshold = threshold;
        self
    }

    /// Field used to break ties when sorting by a date column
    pub fn date_fallback(mut self, key: impl Into<String>) -> Self {
        self.date_fallback = Some(key.into());
        self
    }

    pub fn group_header(mut self, header: impl Fn(&str, &[T]) -> String + Send + Sync + 'static) -> Self {
        self.group_header = Some(Box::new(header));
        self
    }

    /// Predicate separating active rows from inactive ones
    pub fn active_when(mut self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.active = Some(Box::new(predicate));
        self
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Case-insensitive substring match on any searchable column
    pub fn matches(&self, row: &T, search: &str) -> bool {
        let needle = search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.columns
            .iter()
            .filter(|c| c.searchable)
            .filter_map(|c| row.field(&c.key))
            .any(|value| value.display_text().to_lowercase().contains(&needle))
    }

    /// Bucket rows by the text of a field, keeping first-seen order
    pub fn group(&self, rows: &[T], key: &str) -> Vec<RowGroup<T>> {
        let mut groups: Vec<RowGroup<T>> = Vec::new();
        for row in rows {
            let value = row.field(key).map(|v| v.display_text()).unwrap_or_default();
            match groups.iter_mut().find(|g| g.key == value) {
                Some(group) => group.rows.push(row.clone()),
                None => groups.push(RowGroup {
                    key: value,
                    header: None,
                    rows: vec![row.clone()],
                }),
            }
        }

        if let Some(header) = &self.group_header {
            for group in &mut groups {
                group.header = Some(header(&group.key, &group.rows));
            }
        }

        groups
    }

    /// Filter, sort, split active rows, paginate and group
    pub fn apply(&self, rows: Vec<T>, query: &ListQuery) -> Page<T> {
        let mut filtered: Vec<T> = rows
            .into_iter()
            .filter(|row| self.matches(row, &query.search))
            .collect();

        let sortable = query
            .sort
            .column
            .as_deref()
            .is_some_and(|key| self.columns.iter().any(|c| c.key == key && c.sortable));
        if sortable {
            sort_rows(&mut filtered, &query.sort, self.date_fallback.as_deref());
        }

        let (active, inactive): (Vec<T>, Vec<T>) = match &self.active {
            Some(predicate) => filtered.into_iter().partition(|row| predicate(row)),
            None => (filtered, Vec::new()),
        };

        let total_items = active.len();
        let total_pages = total_pages(total_items, self.page_size);
        let page = clamp_page(query.page, total_pages);
        let items = paginate(active, page, self.page_size);

        let groups = match &query.group_by {
            Some(key) => self.group(&items, key),
            None => Vec::new(),
        };

        Page {
            window: page_window(page, total_pages, self.window_threshold),
            items,
            groups,
            inactive,
            page,
            page_size: self.page_size,
            total_items,
            total_pages,
        }
    }
}

/// Standard columns of the movements table
pub fn movement_columns() -> Vec<Column> {
    vec![
        Column::new("movement_date", "Date"),
        Column::new("created_at", "Created").not_searchable(),
        Column::new("type", "Type"),
        Column::new("category", "Category"),
        Column::new("subcategory", "Subcategory"),
        Column::new("description", "Description"),
        Column::new("currency", "Currency"),
        Column::new("wallet", "Wallet"),
        Column::new("amount", "Amount"),
        Column::new("created_by", "Created by").not_sortable(),
    ]
}

impl Listable for Movement {
    fn field(&self, key: &str) -> Option<FieldValue> {
        let text = |s: &str| Some(FieldValue::Text(s.to_string()));
        match key {
            "id" => text(&self.id),
            "movement_date" => Some(FieldValue::Date(self.movement_date)),
            "created_at" => Some(FieldValue::DateTime(self.created_at)),
            "type" => text(&self.movement_type.name),
            "category" => text(&self.category),
            "subcategory" => self.subcategory.as_deref().and_then(text),
            "description" => self.description.as_deref().and_then(text),
            "amount" => Some(FieldValue::Number(self.amount.clone())),
            "currency" => text(&self.currency),
            "wallet" => text(&self.wallet),
            "exchange_rate" => self.exchange_rate.clone().map(FieldValue::Number),
            "organization_id" => text(&self.organization_id),
            "project_id" => self.project_id.as_deref().and_then(text),
            "created_by" => text(&self.created_by),
            "is_favorite" => Some(FieldValue::Bool(self.is_favorite)),
            _ => None,
        }
    }
}

impl Listable for MovementView {
    fn field(&self, key: &str) -> Option<FieldValue> {
        let text = |s: String| Some(FieldValue::Text(s));
        match (self, key) {
            (MovementView::Single(m), _) => m.field(key),
            (_, "id") => text(self.id().to_string()),
            (_, "movement_date") => Some(FieldValue::Date(self.movement_date())),
            (_, "created_at") => Some(FieldValue::DateTime(self.created_at())),
            (_, "is_favorite") => Some(FieldValue::Bool(self.is_favorite())),
            (MovementView::Conversion(_), "type") => text("Conversion".to_string()),
            (MovementView::Transfer(_), "type") => text("Transfer".to_string()),
            (MovementView::Conversion(g), "amount") => Some(FieldValue::Number(g.from_amount.clone())),
            (MovementView::Transfer(g), "amount") => Some(FieldValue::Number(g.amount.clone())),
            (MovementView::Conversion(g), "currency") => {
                text(format!("{} -> {}", g.from_currency, g.to_currency))
            }
            (MovementView::Transfer(g), "currency") => text(g.currency.clone()),
            (MovementView::Conversion(g), "wallet") => {
                text(format!("{} -> {}", g.from_wallet, g.to_wallet))
            }
            (MovementView::Transfer(g), "wallet") => {
                text(format!("{} -> {}", g.from_wallet, g.to_wallet))
            }
            _ => self.representative().and_then(|m| m.field(key)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciliation::group_movements;
    use crate::types::fixtures::*;

    fn ids<T: Listable>(rows: &[T]) -> Vec<String> {
        rows.iter()
            .filter_map(|r| r.field("id").map(|v| v.display_text()))
            .collect()
    }

    fn sample() -> Vec<Movement> {
        let mut rows = vec![
            movement("1", "Ingreso", "100", "USD"),
            movement("2", "Egreso", "-40", "ARS"),
            movement("3", "Ingreso", "75", "EUR"),
        ];
        rows[0].description = Some("Pago cliente Norte".to_string());
        rows[1].description = Some("Cemento".to_string());
        rows[2].description = Some("Anticipo obra norte".to_string());
        rows[1].category = "Materiales".to_string();
        rows
    }

    #[test]
    fn test_search_is_case_insensitive_across_columns() {
        let view = ListView::new(movement_columns());
        let page = view.apply(sample(), &ListQuery::new().search("NORTE"));
        assert_eq!(ids(&page.items), vec!["1", "3"]);

        let page = view.apply(sample(), &ListQuery::new().search("materiales"));
        assert_eq!(ids(&page.items), vec!["2"]);

        let page = view.apply(sample(), &ListQuery::new().search("   "));
        assert_eq!(page.total_items, 3);
    }

    #[test]
    fn test_sort_by_amount() {
        let view = ListView::new(movement_columns());
        let query = ListQuery::new().sort(SortState::by("amount", SortDirection::Descending));
        let page = view.apply(sample(), &query);
        assert_eq!(ids(&page.items), vec!["1", "3", "2"]);
    }

    #[test]
    fn test_unsortable_column_is_ignored() {
        let view = ListView::new(movement_columns());
        let query = ListQuery::new().sort(SortState::by("created_by", SortDirection::Descending));
        let page = view.apply(sample(), &query);
        assert_eq!(ids(&page.items), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_pages_and_out_of_range_page() {
        let rows: Vec<Movement> = (0..25)
            .map(|i| movement(&format!("{:02}", i), "Ingreso", "1", "USD"))
            .collect();
        let view = ListView::new(movement_columns()).page_size(10);

        let page = view.apply(rows.clone(), &ListQuery::new().page(3));
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 5);

        let page = view.apply(rows, &ListQuery::new().page(99));
        assert_eq!(page.page, 3);
        assert_eq!(page.window, vec![PageItem::Page(1), PageItem::Page(2), PageItem::Page(3)]);
    }

    #[test]
    fn test_group_by_field_with_header() {
        let view = ListView::new(movement_columns())
            .group_header(|key, rows: &[Movement]| format!("{} ({})", key, rows.len()));
        let page = view.apply(sample(), &ListQuery::new().group_by("type"));

        assert_eq!(page.groups.len(), 2);
        assert_eq!(page.groups[0].key, "Ingreso");
        assert_eq!(page.groups[0].header.as_deref(), Some("Ingreso (2)"));
        assert_eq!(ids(&page.groups[1].rows), vec!["2"]);
    }

    #[test]
    fn test_inactive_rows_are_separated() {
        let mut rows = sample();
        rows[1].is_favorite = true;
        let view = ListView::new(movement_columns()).active_when(|m: &Movement| !m.is_favorite);
        let page = view.apply(rows, &ListQuery::new());

        assert_eq!(ids(&page.items), vec!["1", "3"]);
        assert_eq!(ids(&page.inactive), vec!["2"]);
        assert_eq!(page.total_items, 2);
    }

    #[test]
    fn test_grouped_views_resort_by_date() {
        let mut lone = movement("solo", "Ingreso", "5", "USD");
        lone.movement_date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let rows = vec![
            lone,
            conversion_leg("1", "Egreso", "-100", "USD", "g1"),
            conversion_leg("2", "Ingreso", "1850", "ARS", "g1"),
        ];

        let views = group_movements(&rows);
        assert_eq!(views[0].id(), "g1");

        let view = ListView::new(movement_columns()).date_fallback("created_at");
        let query = ListQuery::new().sort(SortState::by("movement_date", SortDirection::Descending));
        let page = view.apply(views, &query);
        assert_eq!(ids(&page.items), vec!["solo", "g1"]);

        let page = view.apply(page.items, &ListQuery::new().search("usd -> ars"));
        assert_eq!(ids(&page.items), vec!["g1"]);
    }
}
