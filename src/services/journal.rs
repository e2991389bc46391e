//! Journal service
//!
//! Append-only journal entries, one JSON file each, laid out as
//! `Journal/YYYY/MM/Week_NN/entry_YYYY-MM-DD_HH-MM-SS.json` where the
//! week folder is the day-of-month divided into sevenths. Entries are
//! never updated or deleted; unreadable files are skipped on listing.

use std::path::{Path, PathBuf};

use chrono::{Datelike, Duration, NaiveDateTime};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::data::JournalEntry;
use crate::error::Result;

/// Service for append-only journal entries
#[derive(Clone)]
pub struct JournalService {
    root: PathBuf,
}

impl JournalService {
    /// Create a journal rooted at the given directory.
    /// Folders are created lazily when the first entry is written.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Write a new entry timestamped `at`
    pub async fn add_entry(
        &self,
        content: String,
        duration_seconds: u64,
        continued: bool,
        at: NaiveDateTime,
    ) -> Result<JournalEntry> {
        let path = self.entry_path(at);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let entry = JournalEntry {
            id: path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            content,
            date: at,
            duration_seconds,
            continued,
            created_at: at,
        };

        // Write to temp then rename so a crash never leaves a torn entry.
        let json = serde_json::to_vec_pretty(&entry)?;
        let temp_path = path.with_extension("json.tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&json).await?;
        file.sync_all().await?;
        fs::rename(&temp_path, &path).await?;

        tracing::info!("Saved journal entry: {}", entry.id);
        Ok(entry)
    }

    /// Entries from the last `days` days, newest first
    pub async fn recent_entries(&self, days: i64, now: NaiveDateTime) -> Result<Vec<JournalEntry>> {
        let cutoff = now - Duration::days(days);
        let mut entries = self.all_entries().await?;
        entries.retain(|e| e.date >= cutoff);
        Ok(entries)
    }

    /// All entries, newest first
    pub async fn all_entries(&self) -> Result<Vec<JournalEntry>> {
        let mut entries = Vec::new();
        self.scan_directory(&self.root, &mut entries).await?;
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(entries)
    }

    fn entry_path(&self, at: NaiveDateTime) -> PathBuf {
        let week = (at.day() - 1) / 7 + 1;
        self.root
            .join(format!("{:04}", at.year()))
            .join(format!("{:02}", at.month()))
            .join(format!("Week_{:02}", week))
            .join(format!("entry_{}.json", at.format("%Y-%m-%d_%H-%M-%S")))
    }

    fn scan_directory<'a>(
        &'a self,
        dir: &'a Path,
        entries: &'a mut Vec<JournalEntry>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            if !dir.exists() {
                return Ok(());
            }

            let mut dir_entries = fs::read_dir(dir).await?;

            while let Some(dir_entry) = dir_entries.next_entry().await? {
                let path = dir_entry.path();

                if path.is_dir() {
                    self.scan_directory(&path, entries).await?;
                } else if is_entry_file(&path) {
                    match fs::read(&path).await {
                        Ok(bytes) => match serde_json::from_slice(&bytes) {
                            Ok(entry) => entries.push(entry),
                            Err(err) => {
                                tracing::warn!("Skipping corrupt journal entry {:?}: {}", path, err)
                            }
                        },
                        Err(err) => {
                            tracing::warn!("Skipping unreadable journal entry {:?}: {}", path, err)
                        }
                    }
                }
            }

            Ok(())
        })
    }
}

fn is_entry_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("entry_"))
}
