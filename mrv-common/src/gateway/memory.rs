//! In-process table gateway
//!
//! Same filter/order/pagination semantics as the REST gateway, over tables
//! held in memory. Used by tests and local demos; failures can be injected
//! per table or per (table, field, value) predicate.

use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{validate_identifier, GatewayError, Row, TableGateway, TableQuery};

#[derive(Debug, Clone)]
struct InjectedFailure {
    table: String,
    predicate: Option<(String, Value)>,
    message: String,
}

/// Table gateway over in-memory rows
#[derive(Debug, Default)]
pub struct MemoryGateway {
    tables: HashMap<String, Vec<Row>>,
    failures: Vec<InjectedFailure>,
    calls: Mutex<Vec<(String, TableQuery)>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a table; non-object values are ignored
    pub fn with_table(mut self, table: &str, rows: Vec<Value>) -> Self {
        let rows = rows
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(row) => Some(row),
                _ => None,
            })
            .collect();
        self.tables.insert(table.to_string(), rows);
        self
    }

    /// Fail every fetch against `table`
    pub fn fail_table(mut self, table: &str, message: &str) -> Self {
        self.failures.push(InjectedFailure {
            table: table.to_string(),
            predicate: None,
            message: message.to_string(),
        });
        self
    }

    /// Fail fetches against `table` whose filters include `field = value`
    pub fn fail_when(mut self, table: &str, field: &str, value: impl Into<Value>, message: &str) -> Self {
        self.failures.push(InjectedFailure {
            table: table.to_string(),
            predicate: Some((field.to_string(), value.into())),
            message: message.to_string(),
        });
        self
    }

    /// Every (table, query) fetched so far, in call order
    pub fn calls(&self) -> Vec<(String, TableQuery)> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn injected_failure(&self, table: &str, query: &TableQuery) -> Option<GatewayError> {
        self.failures
            .iter()
            .find(|f| {
                f.table == table
                    && match &f.predicate {
                        None => true,
                        Some((field, value)) => query.filters.get(field) == Some(value),
                    }
            })
            .map(|f| GatewayError::Backend {
                status: 500,
                message: f.message.clone(),
            })
    }
}

#[async_trait]
impl TableGateway for MemoryGateway {
    async fn fetch(&self, table: &str, query: &TableQuery) -> Result<Vec<Row>, GatewayError> {
        validate_identifier(table)?;
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((table.to_string(), query.clone()));
        }

        if let Some(error) = self.injected_failure(table, query) {
            return Err(error);
        }

        let rows = self.tables.get(table).ok_or_else(|| GatewayError::Backend {
            status: 404,
            message: format!("relation \"{}\" does not exist", table),
        })?;

        let mut matched: Vec<&Row> = rows
            .iter()
            .filter(|row| {
                query.filters.iter().all(|(field, expected)| {
                    let actual = row.get(field).unwrap_or(&Value::Null);
                    actual == expected
                })
            })
            .collect();

        if let Some((field, order)) = &query.order_by {
            // Stable sort; nulls last in either direction
            matched.sort_by(|a, b| {
                let left = a.get(field).unwrap_or(&Value::Null);
                let right = b.get(field).unwrap_or(&Value::Null);
                match (left.is_null(), right.is_null()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    (false, false) => {
                        let ord = compare_values(left, right);
                        if order.is_ascending() {
                            ord
                        } else {
                            ord.reverse()
                        }
                    }
                }
            });
        }

        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);
        let columns: Option<Vec<&str>> = query
            .select
            .as_deref()
            .filter(|s| s.trim() != "*")
            .map(|s| s.split(',').map(str::trim).collect());

        Ok(matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|row| match &columns {
                None => row.clone(),
                Some(columns) => columns
                    .iter()
                    .filter_map(|c| row.get(*c).map(|v| (c.to_string(), v.clone())))
                    .collect(),
            })
            .collect())
    }
}

fn compare_values(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .unwrap_or(0.0)
            .partial_cmp(&b.as_f64().unwrap_or(0.0))
            .unwrap_or(Ordering::Equal),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (a, b) => a.to_string().cmp(&b.to_string()),
    }
}
