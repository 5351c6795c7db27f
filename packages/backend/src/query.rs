//! # Query builder
//!
//! [`Query`] is a plain description of a read: a table, a column projection, a
//! list of equality filters combined by AND, and a list of orderings applied left
//! to right. [`QueryBuilder`] binds a query to a [`Backend`] and executes it,
//! decoding rows into typed records.
//!
//! ```ignore
//! let members: Vec<Member> = backend
//!     .from(Table::Members)
//!     .with_columns("*")
//!     .where_equals("family_id", 7)
//!     .order_by("date_of_birth", Direction::Ascending)
//!     .fetch_many()
//!     .await?;
//! ```
//!
//! `fetch_one` is lenient: zero or several matching rows resolve to `Ok(None)`.
//! Only transport and decode failures are errors.
//!
//! [`Query::apply`] evaluates a query against in-memory rows and is used by
//! [`crate::MemoryBackend`]. Ordering follows the usual SQL convention: nulls sort
//! last when ascending and first when descending.

use std::cmp::Ordering;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::FetchError;
use crate::facade::Backend;
use crate::models::{Row, Table};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

/// Description of a read against one table.
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    pub table: Table,
    pub columns: String,
    pub filters: Vec<Filter>,
    pub order: Vec<Order>,
}

impl Query {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            columns: "*".to_string(),
            filters: Vec::new(),
            order: Vec::new(),
        }
    }

    /// Column names requested, or `None` for all columns.
    pub fn column_list(&self) -> Option<Vec<&str>> {
        let cols: Vec<&str> = self
            .columns
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect();
        if cols.is_empty() || cols.contains(&"*") {
            None
        } else {
            Some(cols)
        }
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.filters
            .iter()
            .all(|f| row.get(&f.column).is_some_and(|v| values_equal(v, &f.value)))
    }

    /// Evaluate against in-memory rows: filter, order, then project.
    pub fn apply<'a>(&self, rows: impl IntoIterator<Item = &'a Row>) -> Vec<Row> {
        let mut selected: Vec<&Row> = rows.into_iter().filter(|r| self.matches(r)).collect();
        if !self.order.is_empty() {
            selected.sort_by(|a, b| self.compare_rows(a, b));
        }
        let columns = self.column_list();
        selected
            .into_iter()
            .map(|row| match &columns {
                None => row.clone(),
                Some(cols) => row
                    .iter()
                    .filter(|(k, _)| cols.contains(&k.as_str()))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            })
            .collect()
    }

    fn compare_rows(&self, a: &Row, b: &Row) -> Ordering {
        for order in &self.order {
            let left = a.get(&order.column).unwrap_or(&Value::Null);
            let right = b.get(&order.column).unwrap_or(&Value::Null);
            let ord = compare_values(left, right);
            let ord = match order.direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        // Filters built from URL parameters arrive as strings.
        (Value::Number(a), Value::String(b)) | (Value::String(b), Value::Number(a)) => {
            a.to_string() == *b
        }
        _ => left == right,
    }
}

/// Total order over JSON scalars with null greater than everything.
fn compare_values(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => left.to_string().cmp(&right.to_string()),
    }
}

/// A [`Query`] bound to a backend, ready to execute.
pub struct QueryBuilder<'a, B: Backend> {
    backend: &'a B,
    query: Query,
}

impl<'a, B: Backend> QueryBuilder<'a, B> {
    pub fn new(backend: &'a B, table: Table) -> Self {
        Self {
            backend,
            query: Query::new(table),
        }
    }

    /// Comma-separated column list, `*` for all.
    pub fn with_columns(mut self, columns: &str) -> Self {
        self.query.columns = columns.to_string();
        self
    }

    pub fn where_equals(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.query.filters.push(Filter {
            column: column.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, column: &str, direction: Direction) -> Self {
        self.query.order.push(Order {
            column: column.to_string(),
            direction,
        });
        self
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Fetch every matching row. An empty result is not an error.
    pub async fn fetch_many<T: DeserializeOwned>(self) -> Result<Vec<T>, FetchError> {
        let table = self.query.table;
        let rows = self.backend.select(&self.query).await?;
        rows.into_iter().map(|row| decode(table, row)).collect()
    }

    /// Fetch exactly one row, or `None` when zero or several rows match.
    pub async fn fetch_one<T: DeserializeOwned>(self) -> Result<Option<T>, FetchError> {
        let table = self.query.table;
        let mut rows = self.backend.select(&self.query).await?;
        if rows.len() != 1 {
            tracing::debug!(%table, matched = rows.len(), "single-row fetch did not match one row");
            return Ok(None);
        }
        match rows.pop() {
            Some(row) => decode(table, row).map(Some),
            None => Ok(None),
        }
    }
}

fn decode<T: DeserializeOwned>(table: Table, row: Row) -> Result<T, FetchError> {
    serde_json::from_value(Value::Object(row)).map_err(|e| FetchError::Decode {
        table: table.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(values: Vec<Value>) -> Vec<Row> {
        values
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn filters_compose_with_and() {
        let data = rows(vec![
            json!({"id": 1, "family_id": 7, "relation": "Son"}),
            json!({"id": 2, "family_id": 7, "relation": "Daughter"}),
            json!({"id": 3, "family_id": 8, "relation": "Son"}),
        ]);
        let mut query = Query::new(Table::Members);
        query.filters.push(Filter {
            column: "family_id".into(),
            value: json!(7),
        });
        query.filters.push(Filter {
            column: "relation".into(),
            value: json!("Son"),
        });
        let out = query.apply(&data);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["id"], json!(1));
    }

    #[test]
    fn string_filter_matches_numeric_column() {
        let data = rows(vec![json!({"id": 7}), json!({"id": 8})]);
        let mut query = Query::new(Table::Families);
        query.filters.push(Filter {
            column: "id".into(),
            value: json!("7"),
        });
        assert_eq!(query.apply(&data).len(), 1);
    }

    #[test]
    fn ordering_puts_nulls_last_when_ascending() {
        let data = rows(vec![
            json!({"id": 1, "date_of_birth": "2010-01-01"}),
            json!({"id": 2, "date_of_birth": null}),
            json!({"id": 3, "date_of_birth": "1999-12-31"}),
        ]);
        let mut query = Query::new(Table::Members);
        query.order.push(Order {
            column: "date_of_birth".into(),
            direction: Direction::Ascending,
        });
        let ids: Vec<_> = query.apply(&data).iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(3), json!(1), json!(2)]);

        query.order[0].direction = Direction::Descending;
        let ids: Vec<_> = query.apply(&data).iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(2), json!(1), json!(3)]);
    }

    #[test]
    fn projection_keeps_named_columns() {
        let data = rows(vec![json!({"id": "u", "email": "e", "role": "admin", "extra": 1})]);
        let mut query = Query::new(Table::Profiles);
        query.columns = "id, email, role".into();
        let out = query.apply(&data);
        assert_eq!(out[0].len(), 3);
        assert!(!out[0].contains_key("extra"));
    }
}
