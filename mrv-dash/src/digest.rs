//! Per-movie digest documents and topic breakdowns
//!
//! Digest documents are stored as `{movie_id}/{stage_prefix}...{extension}`.
//! The newest matching object is the latest version.

use mrv_common::config::DigestNaming;
use mrv_common::gateway::{GatewayError, TableGateway, TableQuery};
use mrv_common::models::{decode_rows, Digest, Topic, TABLE_DIGESTS};
use mrv_common::storage::{ObjectStore, StorageError, StoredObject};
use mrv_common::{Error, Result};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Document content with the version it was read from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigestDocument {
    pub version: String,
    pub content: String,
}

/// One topic of the breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicSummary {
    pub topic: Topic,
    pub label: &'static str,
    pub summary: String,
}

pub struct DigestReader<'a> {
    store: &'a dyn ObjectStore,
    naming: &'a DigestNaming,
}

impl<'a> DigestReader<'a> {
    pub fn new(store: &'a dyn ObjectStore, naming: &'a DigestNaming) -> Self {
        Self { store, naming }
    }

    /// Digest versions for a movie, newest first (ties by name, descending)
    pub async fn versions(&self, movie_id: &str) -> Result<Vec<StoredObject>> {
        validate_segment(movie_id)?;
        let mut versions: Vec<StoredObject> = self
            .store
            .list(movie_id)
            .await?
            .into_iter()
            .filter(|o| self.is_digest(&o.name))
            .collect();

        versions.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.name.cmp(&a.name))
        });

        debug!(movie_id = %movie_id, count = versions.len(), "Listed digest versions");
        Ok(versions)
    }

    /// Content of one version
    pub async fn content(&self, movie_id: &str, version: &str) -> Result<DigestDocument> {
        validate_segment(movie_id)?;
        validate_segment(version)?;
        if !self.is_digest(version) {
            return Err(Error::InvalidInput(format!("Not a digest document: {}", version)));
        }

        let path = format!("{}/{}", movie_id, version);
        let content = self.store.download_text(&path).await.map_err(|e| match e {
            StorageError::NotFound(path) => Error::NotFound(format!("Digest {}", path)),
            other => Error::Storage(other),
        })?;

        Ok(DigestDocument {
            version: version.to_string(),
            content,
        })
    }

    /// Newest version's content, None when the movie has no digest
    pub async fn latest(&self, movie_id: &str) -> Result<Option<DigestDocument>> {
        match self.versions(movie_id).await?.into_iter().next() {
            Some(newest) => self.content(movie_id, &newest.name).await.map(Some),
            None => Ok(None),
        }
    }

    fn is_digest(&self, name: &str) -> bool {
        name.starts_with(&self.naming.stage_prefix) && name.ends_with(&self.naming.extension)
    }
}

/// Folder and file names are single path segments
fn validate_segment(segment: &str) -> Result<()> {
    if segment.is_empty() || segment.contains('/') || segment.contains('\\') || segment == ".." {
        return Err(Error::InvalidInput(format!("Invalid path segment: {}", segment)));
    }
    Ok(())
}

/// Arrange digest rows in topic display order
///
/// Unknown topics are dropped; if a topic appears more than once the last
/// row wins.
pub fn arrange_breakdown(digests: Vec<Digest>) -> Vec<TopicSummary> {
    let mut by_topic: HashMap<Topic, String> = HashMap::new();
    for digest in digests {
        if let Some(topic) = Topic::from_key(&digest.topic) {
            by_topic.insert(topic, digest.summary);
        }
    }

    Topic::ALL
        .into_iter()
        .filter_map(|topic| {
            by_topic.remove(&topic).map(|summary| TopicSummary {
                topic,
                label: topic.label(),
                summary,
            })
        })
        .collect()
}

/// Topic breakdown for a movie from the digests table
pub async fn fetch_breakdown(
    gateway: &dyn TableGateway,
    movie_id: &str,
) -> std::result::Result<Vec<TopicSummary>, GatewayError> {
    let query = TableQuery::new().eq("movie_id", movie_id);
    let rows = gateway.fetch(TABLE_DIGESTS, &query).await?;
    Ok(arrange_breakdown(decode_rows(TABLE_DIGESTS, rows)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use mrv_common::storage::MemoryObjectStore;

    fn at(day: u32) -> Option<chrono::DateTime<Utc>> {
        Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).single()
    }

    fn store() -> MemoryObjectStore {
        MemoryObjectStore::new()
            .with_object("m1/stage5.v1.md", "first", at(1))
            .with_object("m1/stage5.v2.md", "second", at(3))
            .with_object("m1/stage5.v3.md", "tie", at(3))
            .with_object("m1/stage4.v9.md", "older stage", at(9))
            .with_object("m1/stage5.v4.json", "wrong extension", at(9))
    }

    #[tokio::test]
    async fn test_versions_filtered_and_newest_first() {
        let store = store();
        let naming = DigestNaming::default();
        let reader = DigestReader::new(&store, &naming);

        let names: Vec<String> = reader
            .versions("m1")
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.name)
            .collect();
        assert_eq!(names, vec!["stage5.v3.md", "stage5.v2.md", "stage5.v1.md"]);
    }

    #[tokio::test]
    async fn test_latest_reads_newest() {
        let store = store();
        let naming = DigestNaming::default();
        let reader = DigestReader::new(&store, &naming);

        let latest = reader.latest("m1").await.unwrap().unwrap();
        assert_eq!(latest.version, "stage5.v3.md");
        assert_eq!(latest.content, "tie");
        assert_eq!(reader.latest("m2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_content_rejects_other_files() {
        let store = store();
        let naming = DigestNaming::default();
        let reader = DigestReader::new(&store, &naming);

        assert!(matches!(
            reader.content("m1", "stage4.v9.md").await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            reader.content("..", "stage5.v1.md").await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            reader.content("m1", "stage5.missing.md").await,
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_breakdown_in_topic_order() {
        let row = |topic: &str, summary: &str| Digest {
            movie_id: "m1".to_string(),
            topic: topic.to_string(),
            summary: summary.to_string(),
        };
        let breakdown = arrange_breakdown(vec![
            row("overall_impression", "good"),
            row("trivia", "ignored"),
            row("direction", "tight"),
            row("direction", "tighter"),
        ]);

        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].topic, Topic::Direction);
        assert_eq!(breakdown[0].summary, "tighter");
        assert_eq!(breakdown[1].label, "Overall Impression");
    }
}
