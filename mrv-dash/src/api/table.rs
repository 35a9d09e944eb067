//! Generic table view with pagination, sorting and equality filters
//!
//! `GET /api/table/:name?page=2&sort=created_at&order=desc&movie_id=m1`
//! Any query parameter other than `page`, `sort` and `order` is an equality
//! filter on that column.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use mrv_common::gateway::{table_columns, validate_identifier, SortOrder, TableQuery};
use mrv_common::Row;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use super::ApiError;
use crate::pagination::{calculate_pagination, TABLE_PAGE_SIZE};
use crate::AppState;

/// Table data response
#[derive(Debug, Serialize)]
pub struct TableDataResponse {
    pub table_name: String,
    pub total_rows: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub filters: BTreeMap<String, String>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// GET /api/table/:name
pub async fn get_table_data(
    State(state): State<AppState>,
    Path(table_name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<TableDataResponse>, ApiError> {
    validate_identifier(&table_name)?;

    let mut requested_page = 1;
    let mut order = SortOrder::Ascending;
    let mut sort = None;
    let mut filters = BTreeMap::new();

    for (key, value) in params {
        match key.as_str() {
            "page" => {
                requested_page = value
                    .parse()
                    .map_err(|_| ApiError::BadRequest(format!("Invalid page: {}", value)))?;
            }
            "order" => order = SortOrder::parse(&value),
            "sort" => {
                validate_identifier(&value)?;
                sort = Some(value);
            }
            _ => {
                validate_identifier(&key)?;
                filters.insert(key, value);
            }
        }
    }

    let mut query = TableQuery::new();
    for (field, value) in &filters {
        query = query.eq(field.as_str(), value.as_str());
    }
    if let Some(column) = &sort {
        query = query.order_by(column.as_str(), order);
    }

    let rows = state.gateway.fetch(&table_name, &query).await?;

    let columns = match rows.first() {
        Some(first) => first.keys().cloned().collect(),
        None => table_columns(state.gateway.as_ref(), &table_name).await,
    };

    if let Some(column) = &sort {
        if !rows.is_empty() && !columns.contains(column) {
            return Err(ApiError::BadRequest(format!("Invalid column: {}", column)));
        }
    }

    let pagination = calculate_pagination(rows.len(), requested_page, TABLE_PAGE_SIZE);
    let page_rows = pagination
        .slice(&rows)
        .iter()
        .map(|row| row_values(row, &columns))
        .collect();

    Ok(Json(TableDataResponse {
        table_name,
        total_rows: rows.len(),
        page: pagination.page,
        page_size: pagination.page_size,
        total_pages: pagination.total_pages,
        filters,
        columns,
        rows: page_rows,
    }))
}

fn row_values(row: &Row, columns: &[String]) -> Vec<Value> {
    columns
        .iter()
        .map(|c| row.get(c).cloned().unwrap_or(Value::Null))
        .collect()
}
