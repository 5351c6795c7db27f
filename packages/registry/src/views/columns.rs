//! Column definitions for the families and members tables.
//!
//! Each column pairs a field name and header with a pure value getter. Getters are
//! total: missing data becomes [`CellValue::Empty`], never an error.

use std::cmp::Ordering;

use backend::{Family, Member};
use chrono::NaiveDate;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CellValue {
    Number(i64),
    Text(String),
    Date(NaiveDate),
    Empty,
}

impl CellValue {
    fn text(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(s) if !s.is_empty() => CellValue::Text(s.to_string()),
            _ => CellValue::Empty,
        }
    }

    fn date(value: Option<NaiveDate>) -> Self {
        value.map(CellValue::Date).unwrap_or(CellValue::Empty)
    }

    pub fn display(&self) -> String {
        match self {
            CellValue::Number(n) => n.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            CellValue::Empty => String::new(),
        }
    }

    /// Ascending order with empty cells last. Text compares case-insensitively.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (CellValue::Empty, CellValue::Empty) => Ordering::Equal,
            (CellValue::Empty, _) => Ordering::Greater,
            (_, CellValue::Empty) => Ordering::Less,
            (CellValue::Number(a), CellValue::Number(b)) => a.cmp(b),
            (CellValue::Date(a), CellValue::Date(b)) => a.cmp(b),
            (CellValue::Text(a), CellValue::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            (a, b) => a.display().cmp(&b.display()),
        }
    }
}

pub struct Column<R> {
    pub field: &'static str,
    pub header: &'static str,
    pub value: fn(&R) -> CellValue,
}

impl<R> Clone for Column<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for Column<R> {}

/// Columns are identified by field and header; the getter is not compared.
impl<R> PartialEq for Column<R> {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field && self.header == other.header
    }
}

impl<R> std::fmt::Debug for Column<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("field", &self.field)
            .field("header", &self.header)
            .finish()
    }
}

pub fn family_columns() -> Vec<Column<Family>> {
    vec![
        Column {
            field: "id",
            header: "ID",
            value: |f: &Family| CellValue::Number(f.id),
        },
        Column {
            field: "family_name",
            header: "Family Name",
            value: |f: &Family| CellValue::text(Some(&f.family_name)),
        },
        Column {
            field: "parish",
            header: "Parish",
            value: |f: &Family| CellValue::text(f.parish.as_deref()),
        },
        Column {
            field: "province",
            header: "Province",
            value: |f: &Family| CellValue::text(f.province.as_deref()),
        },
        Column {
            field: "jummuiya",
            header: "Jumuiya",
            value: |f: &Family| CellValue::text(f.jummuiya.as_deref()),
        },
    ]
}

pub fn member_columns() -> Vec<Column<Member>> {
    vec![
        Column {
            field: "full_name",
            header: "Name",
            value: |m: &Member| CellValue::text(Some(&m.full_name())),
        },
        Column {
            field: "relation",
            header: "Relation",
            value: |m: &Member| CellValue::text(m.relation.as_deref()),
        },
        Column {
            field: "date_of_birth",
            header: "Birthday",
            value: |m: &Member| CellValue::date(m.date_of_birth),
        },
        Column {
            field: "baptism_date",
            header: "Baptism Day",
            value: |m: &Member| CellValue::date(m.baptism_date),
        },
        Column {
            field: "marriage_date",
            header: "Marriage Day",
            value: |m: &Member| CellValue::date(m.marriage_date),
        },
        Column {
            field: "spouse",
            header: "Spouse",
            value: |m: &Member| CellValue::text(m.spouse.as_deref()),
        },
    ]
}

/// Chip labels for the family header, skipping empty fields.
pub fn family_chips(family: &Family) -> Vec<String> {
    [
        ("Parish", &family.parish),
        ("Province", &family.province),
        ("Jumuiya", &family.jummuiya),
    ]
    .into_iter()
    .filter_map(|(label, value)| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| format!("{label}: {v}"))
    })
    .collect()
}
