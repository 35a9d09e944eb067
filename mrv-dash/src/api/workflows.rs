//! Workflow execution history and lineage endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use mrv_common::models::WorkflowKind;
use serde::Serialize;

use super::ApiError;
use crate::history::{execution_history, ExecutionSummary};
use crate::lineage::{Lineage, LineageResolver};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ExecutionHistoryResponse {
    pub kind: WorkflowKind,
    /// Records produced across all listed executions
    pub total: usize,
    pub executions: Vec<ExecutionSummary>,
}

fn parse_kind(raw: &str) -> Result<WorkflowKind, ApiError> {
    raw.parse().map_err(ApiError::BadRequest)
}

/// GET /api/workflows/:kind/executions
pub async fn list_executions(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<ExecutionHistoryResponse>, ApiError> {
    let kind = parse_kind(&kind)?;
    let executions = execution_history(state.gateway.as_ref(), &state.workflows, kind).await?;

    Ok(Json(ExecutionHistoryResponse {
        kind,
        total: executions.last().map_or(0, |e| e.total),
        executions,
    }))
}

/// GET /api/workflows/:kind/executions/:exec_id/items
///
/// Everything the execution produced, following sub-executions for reviews.
pub async fn execution_items(
    State(state): State<AppState>,
    Path((kind, exec_id)): Path<(String, String)>,
) -> Result<Json<Lineage>, ApiError> {
    let kind = parse_kind(&kind)?;
    let resolver = LineageResolver::new(state.gateway.as_ref(), &state.workflows);
    Ok(Json(resolver.resolve(&exec_id, kind).await?))
}
