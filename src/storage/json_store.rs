//! Whole-collection JSON document store
//!
//! Each collection is one JSON document holding an array of records.
//! Every save rewrites the complete document; there is no partial or
//! streaming access. Reads fail open: a missing or corrupt document is
//! reported as an empty collection so the application stays usable,
//! while write failures always propagate.

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Store for whole-collection JSON documents under one root directory
#[derive(Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    /// Create a store rooted at the given data directory.
    /// The directory is created lazily on first save.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Load a collection, returning an empty list when the document is
    /// missing, unreadable, or unparsable.
    pub async fn load<T: DeserializeOwned>(&self, collection: &str) -> Vec<T> {
        let path = self.collection_path(collection);

        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Vec::new();
            }
            Err(err) => {
                tracing::warn!("Failed to read {:?}, treating as empty: {}", path, err);
                return Vec::new();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!("Corrupt collection {:?}, treating as empty: {}", path, err);
                Vec::new()
            }
        }
    }

    /// Save a collection, overwriting any prior content.
    ///
    /// The document is written to a temp file and renamed into place so a
    /// crash mid-write never leaves a truncated collection behind.
    pub async fn save<T: Serialize>(&self, collection: &str, records: &[T]) -> Result<()> {
        fs::create_dir_all(&self.root).await?;

        let path = self.collection_path(collection);
        let json = serde_json::to_vec_pretty(records)?;

        let temp_path = path.with_extension("json.tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&json).await?;
        file.sync_all().await?;

        fs::rename(&temp_path, &path).await?;

        tracing::debug!(
            "Saved collection {} ({} records, {} bytes)",
            collection,
            records.len(),
            json.len()
        );

        Ok(())
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{}.json", collection))
    }

    /// Store root directory
    pub fn root(&self) -> &Path {
        &self.root
    }
}
