//! Workflow lineage resolution
//!
//! A lineage is a top-level workflow execution plus the sub-executions it
//! spawned. Movies executions produce movies directly. Reviews executions
//! spawn sub-executions, and reviews point at those children, never at the
//! parent.
//!
//! Child discovery always completes before any child is read. Child reads are
//! independent and run concurrently; results keep discovery order. A failed
//! discovery aborts the resolution, while a failed child read counts as zero
//! and is reported on that child.

use futures::future::join_all;
use mrv_common::config::WorkflowIds;
use mrv_common::gateway::{GatewayError, Row, TableGateway, TableQuery};
use mrv_common::models::{
    decode_rows, Movie, Review, WorkflowKind, TABLE_MOVIES, TABLE_REVIEWS,
    TABLE_WORKFLOW_EXECUTIONS,
};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Records produced by one child execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildContribution {
    pub batch_id: String,
    pub count: usize,
    /// Set when this child's records could not be fetched
    pub error: Option<String>,
}

/// Records produced across a lineage
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "records", rename_all = "lowercase")]
pub enum LineageItems {
    Movies(Vec<Movie>),
    Reviews(Vec<Review>),
}

impl LineageItems {
    pub fn len(&self) -> usize {
        match self {
            LineageItems::Movies(items) => items.len(),
            LineageItems::Reviews(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolved lineage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lineage {
    pub parent_id: String,
    pub kind: WorkflowKind,
    /// Empty for movies lineages
    pub children: Vec<ChildContribution>,
    /// Sum of child counts (or the direct count for movies); counts rows as
    /// stored, matching `LineageCount::total`
    pub total: usize,
    pub items: LineageItems,
}

/// Counts only, for execution history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineageCount {
    pub parent_id: String,
    pub children: Vec<ChildContribution>,
    pub total: usize,
}

/// Rows read for one part of a lineage
struct Portion {
    /// None for the parent's own records (movies)
    child_id: Option<String>,
    rows: Result<Vec<Row>, GatewayError>,
}

/// Walks parent → child execution links through the table gateway
pub struct LineageResolver<'a> {
    gateway: &'a dyn TableGateway,
    workflows: &'a WorkflowIds,
}

impl<'a> LineageResolver<'a> {
    pub fn new(gateway: &'a dyn TableGateway, workflows: &'a WorkflowIds) -> Self {
        Self { gateway, workflows }
    }

    /// Sub-executions spawned by `parent_id`, in backend order
    pub async fn child_batches(&self, parent_id: &str) -> Result<Vec<String>, GatewayError> {
        let query = TableQuery::new()
            .select("exec_id")
            .eq("workflow_id", self.workflows.reviews_sub_workflow_id.as_str())
            .eq("parent_exec_id", parent_id);

        let rows = self.gateway.fetch(TABLE_WORKFLOW_EXECUTIONS, &query).await?;
        let children: Vec<String> = rows
            .iter()
            .filter_map(|row| match row.get("exec_id") {
                Some(serde_json::Value::String(id)) => Some(id.clone()),
                Some(serde_json::Value::Number(n)) => Some(n.to_string()),
                _ => None,
            })
            .collect();

        debug!(parent_id = %parent_id, children = children.len(), "Discovered child executions");
        Ok(children)
    }

    /// Every record produced by the lineage rooted at `parent_id`
    pub async fn resolve(&self, parent_id: &str, kind: WorkflowKind) -> Result<Lineage, GatewayError> {
        let portions = self.gather(parent_id, kind, None).await?;

        let mut children = Vec::new();
        let mut movies = Vec::new();
        let mut reviews = Vec::new();
        let mut total = 0;

        for portion in portions {
            let count = portion.rows.map(|rows| {
                let count = rows.len();
                match kind {
                    WorkflowKind::Movies => movies.extend(decode_rows::<Movie>(TABLE_MOVIES, rows)),
                    WorkflowKind::Reviews => reviews.extend(decode_rows::<Review>(TABLE_REVIEWS, rows)),
                }
                count
            });
            total += count.as_ref().copied().unwrap_or(0);
            if let Some(child_id) = portion.child_id {
                children.push(contribution(child_id, count));
            }
        }

        let items = match kind {
            WorkflowKind::Movies => LineageItems::Movies(movies),
            WorkflowKind::Reviews => LineageItems::Reviews(reviews),
        };

        info!(parent_id = %parent_id, kind = %kind, total, "Resolved lineage");
        Ok(Lineage {
            parent_id: parent_id.to_string(),
            kind,
            children,
            total,
            items,
        })
    }

    /// Number of records produced by the lineage, fetching identifiers only
    pub async fn count(&self, parent_id: &str, kind: WorkflowKind) -> Result<LineageCount, GatewayError> {
        let id_column = match kind {
            WorkflowKind::Movies => "ems_id",
            WorkflowKind::Reviews => "review_id",
        };
        let portions = self.gather(parent_id, kind, Some(id_column)).await?;

        let mut children = Vec::new();
        let mut total = 0;
        for portion in portions {
            let count = portion.rows.map(|rows| rows.len());
            total += count.as_ref().copied().unwrap_or(0);
            if let Some(child_id) = portion.child_id {
                children.push(contribution(child_id, count));
            }
        }

        Ok(LineageCount {
            parent_id: parent_id.to_string(),
            children,
            total,
        })
    }

    async fn gather(
        &self,
        parent_id: &str,
        kind: WorkflowKind,
        select: Option<&str>,
    ) -> Result<Vec<Portion>, GatewayError> {
        match kind {
            WorkflowKind::Movies => {
                let rows = self.produced_by(kind.item_table(), parent_id, select).await?;
                Ok(vec![Portion {
                    child_id: None,
                    rows: Ok(rows),
                }])
            }
            WorkflowKind::Reviews => {
                let children = self.child_batches(parent_id).await?;
                if children.is_empty() {
                    info!(parent_id = %parent_id, "No child executions found for reviews lineage");
                    return Ok(Vec::new());
                }

                let reads = children
                    .iter()
                    .map(|child| self.produced_by(kind.item_table(), child, select));
                let results = join_all(reads).await;

                Ok(children
                    .into_iter()
                    .zip(results)
                    .map(|(child_id, rows)| {
                        if let Err(e) = &rows {
                            warn!(
                                parent_id = %parent_id,
                                child_id = %child_id,
                                error = %e,
                                "Failed to fetch reviews for child execution; counting as zero"
                            );
                        }
                        Portion {
                            child_id: Some(child_id),
                            rows,
                        }
                    })
                    .collect())
            }
        }
    }

    async fn produced_by(
        &self,
        table: &str,
        exec_id: &str,
        select: Option<&str>,
    ) -> Result<Vec<Row>, GatewayError> {
        let mut query = TableQuery::new().eq("workflow_exec_id", exec_id);
        if let Some(columns) = select {
            query = query.select(columns);
        }
        self.gateway.fetch(table, &query).await
    }
}

fn contribution(batch_id: String, count: Result<usize, GatewayError>) -> ChildContribution {
    match count {
        Ok(count) => ChildContribution {
            batch_id,
            count,
            error: None,
        },
        Err(e) => ChildContribution {
            batch_id,
            count: 0,
            error: Some(e.to_string()),
        },
    }
}
