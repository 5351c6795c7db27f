//! Client-side table model: quick filter, click-to-sort and pagination over the
//! rows a view already holds.

use serde::{Deserialize, Serialize};

use crate::views::{CellValue, Column};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub page_size_options: Vec<usize>,
    pub default_page_size: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self::families()
    }
}

impl GridConfig {
    pub fn families() -> Self {
        Self {
            page_size_options: vec![5, 10, 25],
            default_page_size: 5,
        }
    }

    pub fn members() -> Self {
        Self {
            page_size_options: vec![5, 10],
            default_page_size: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortModel {
    pub field: &'static str,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridState {
    config: GridConfig,
    sort: Option<SortModel>,
    quick_filter: String,
    page: usize,
    page_size: usize,
}

/// One rendered page.
#[derive(Debug)]
pub struct GridPage<'a, R> {
    pub rows: Vec<&'a R>,
    pub page: usize,
    pub page_count: usize,
    /// Rows left after filtering, across all pages.
    pub total: usize,
}

impl GridState {
    pub fn new(config: GridConfig) -> Self {
        let page_size = config.default_page_size.max(1);
        Self {
            config,
            sort: None,
            quick_filter: String::new(),
            page: 0,
            page_size,
        }
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn sort(&self) -> Option<SortModel> {
        self.sort
    }

    pub fn quick_filter(&self) -> &str {
        &self.quick_filter
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Cycle a column through ascending, descending and unsorted. Clicking a
    /// different column starts it at ascending.
    pub fn toggle_sort(&mut self, field: &'static str) {
        self.sort = match self.sort {
            Some(SortModel { field: f, direction: SortDirection::Ascending }) if f == field => {
                Some(SortModel { field, direction: SortDirection::Descending })
            }
            Some(SortModel { field: f, direction: SortDirection::Descending }) if f == field => None,
            _ => Some(SortModel { field, direction: SortDirection::Ascending }),
        };
    }

    pub fn set_quick_filter(&mut self, text: impl Into<String>) {
        self.quick_filter = text.into();
        self.page = 0;
    }

    /// Ignored unless `size` is one of the configured options.
    pub fn set_page_size(&mut self, size: usize) {
        if self.config.page_size_options.contains(&size) {
            self.page_size = size;
            self.page = 0;
        }
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page;
    }

    fn matches<R>(&self, columns: &[Column<R>], row: &R) -> bool {
        let cells: Vec<String> = columns
            .iter()
            .map(|c| (c.value)(row).display().to_lowercase())
            .collect();
        self.quick_filter
            .split_whitespace()
            .map(str::to_lowercase)
            .all(|term| cells.iter().any(|cell| cell.contains(&term)))
    }

    /// Filter, sort and slice `rows`. Clamps the page index when the row count
    /// has shrunk below it.
    pub fn view<'a, R>(&mut self, columns: &[Column<R>], rows: &'a [R]) -> GridPage<'a, R> {
        let mut visible: Vec<&R> = rows.iter().filter(|r| self.matches(columns, r)).collect();

        let sort_column = self
            .sort
            .and_then(|s| columns.iter().find(|c| c.field == s.field).map(|c| (c, s.direction)));
        if let Some((column, direction)) = sort_column {
            let key = |r: &R| -> CellValue { (column.value)(r) };
            // Empty cells sit at the end in either direction.
            visible.sort_by(|a, b| {
                let (a, b) = (key(*a), key(*b));
                match (&a, &b, direction) {
                    (CellValue::Empty, _, _) | (_, CellValue::Empty, _) => a.compare(&b),
                    (_, _, SortDirection::Ascending) => a.compare(&b),
                    (_, _, SortDirection::Descending) => b.compare(&a),
                }
            });
        }

        let total = visible.len();
        let page_count = total.div_ceil(self.page_size).max(1);
        self.page = self.page.min(page_count - 1);
        let rows = visible
            .into_iter()
            .skip(self.page * self.page_size)
            .take(self.page_size)
            .collect();
        GridPage {
            rows,
            page: self.page,
            page_count,
            total,
        }
    }
}
