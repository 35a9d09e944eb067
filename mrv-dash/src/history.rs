//! Workflow execution history
//!
//! One entry per top-level execution that produced something, oldest first,
//! with the records it produced and the running total up to that point.

use mrv_common::config::WorkflowIds;
use mrv_common::gateway::{GatewayError, TableGateway, TableQuery};
use mrv_common::models::{
    decode_rows, parse_timestamp, Batch, WorkflowKind, TABLE_WORKFLOW_EXECUTIONS,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::lineage::LineageResolver;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionSummary {
    pub exec_id: String,
    /// YYYY-MM-DD, empty when the execution has no usable timestamp
    pub run_date: String,
    /// Records produced by this execution
    pub delta: usize,
    /// Records produced by this and every earlier execution
    pub total: usize,
}

/// Top-level executions of `kind`, oldest first
pub async fn parent_executions(
    gateway: &dyn TableGateway,
    workflows: &WorkflowIds,
    kind: WorkflowKind,
) -> Result<Vec<Batch>, GatewayError> {
    let workflow_id = match kind {
        WorkflowKind::Movies => workflows.movies_workflow_id.as_str(),
        WorkflowKind::Reviews => workflows.reviews_workflow_id.as_str(),
    };

    let mut query = TableQuery::new()
        .select("exec_id,workflow_id,timestamp,parent_exec_id")
        .eq("workflow_id", workflow_id);
    if kind == WorkflowKind::Reviews {
        query = query.eq("parent_exec_id", serde_json::Value::Null);
    }

    let rows = gateway.fetch(TABLE_WORKFLOW_EXECUTIONS, &query).await?;
    let mut batches: Vec<Batch> = decode_rows(TABLE_WORKFLOW_EXECUTIONS, rows);
    batches.retain(Batch::is_parent);
    batches.sort_by_key(|b| b.timestamp.as_deref().and_then(parse_timestamp));
    Ok(batches)
}

/// Execution history for `kind`
///
/// Executions that produced nothing are left out. An execution whose records
/// cannot be counted is skipped rather than failing the history.
pub async fn execution_history(
    gateway: &dyn TableGateway,
    workflows: &WorkflowIds,
    kind: WorkflowKind,
) -> Result<Vec<ExecutionSummary>, GatewayError> {
    let batches = parent_executions(gateway, workflows, kind).await?;
    let resolver = LineageResolver::new(gateway, workflows);

    let mut counts = Vec::with_capacity(batches.len());
    for batch in &batches {
        match resolver.count(&batch.exec_id, kind).await {
            Ok(count) => counts.push((batch, count.total)),
            Err(e) => {
                warn!(parent_id = %batch.exec_id, kind = %kind, error = %e, "Skipping execution whose records could not be counted");
            }
        }
    }

    let history = accumulate(counts);
    debug!(kind = %kind, count = history.len(), "Built execution history");
    Ok(history)
}

fn accumulate<'a>(counts: impl IntoIterator<Item = (&'a Batch, usize)>) -> Vec<ExecutionSummary> {
    let mut running = 0;
    counts
        .into_iter()
        .filter(|(_, delta)| *delta > 0)
        .map(|(batch, delta)| {
            running += delta;
            ExecutionSummary {
                exec_id: batch.exec_id.clone(),
                run_date: batch.run_date(),
                delta,
                total: running,
            }
        })
        .collect()
}
