//! In-process object store for tests

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};

use super::{ObjectStore, StorageError, StoredObject};

#[derive(Debug, Clone)]
struct MemoryObject {
    content: String,
    created_at: Option<DateTime<Utc>>,
}

/// Object store over in-memory documents keyed by path
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: BTreeMap<String, MemoryObject>,
    failing: HashSet<String>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(
        mut self,
        path: &str,
        content: &str,
        created_at: Option<DateTime<Utc>>,
    ) -> Self {
        self.objects.insert(
            path.to_string(),
            MemoryObject {
                content: content.to_string(),
                created_at,
            },
        );
        self
    }

    /// Fail listing of `folder` and downloads of any path under it
    pub fn fail_folder(mut self, folder: &str) -> Self {
        self.failing.insert(folder.trim_end_matches('/').to_string());
        self
    }

    fn check(&self, folder: &str) -> Result<(), StorageError> {
        if self.failing.contains(folder) {
            Err(StorageError::Backend {
                status: 500,
                message: format!("storage unavailable for {}", folder),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn list(&self, folder: &str) -> Result<Vec<StoredObject>, StorageError> {
        let folder = folder.trim_end_matches('/');
        self.check(folder)?;
        let prefix = format!("{}/", folder);

        Ok(self
            .objects
            .iter()
            .filter_map(|(path, object)| {
                let name = path.strip_prefix(&prefix)?;
                if name.contains('/') {
                    return None;
                }
                Some(StoredObject {
                    name: name.to_string(),
                    created_at: object.created_at,
                })
            })
            .collect())
    }

    async fn download_text(&self, path: &str) -> Result<String, StorageError> {
        if let Some((folder, _)) = path.rsplit_once('/') {
            self.check(folder)?;
        }
        self.objects
            .get(path)
            .map(|o| o.content.clone())
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_only_direct_children() {
        let store = MemoryObjectStore::new()
            .with_object("m1/stage5.a.md", "a", None)
            .with_object("m1/nested/stage5.b.md", "b", None)
            .with_object("m2/stage5.c.md", "c", None);

        let listed = store.list("m1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "stage5.a.md");
    }

    #[tokio::test]
    async fn test_download_missing_object() {
        let store = MemoryObjectStore::new();
        let result = store.download_text("m1/none.md").await;
        assert_eq!(result, Err(StorageError::NotFound("m1/none.md".to_string())));
    }
}
