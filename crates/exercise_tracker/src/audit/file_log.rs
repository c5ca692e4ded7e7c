use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Datelike;
use tokio::fs::{self as async_fs, OpenOptions};
use tokio::io::AsyncWriteExt;
use walkdir::WalkDir;

use super::AuditEvent;
use crate::storage::AUDIT_LOG_DIR;

fn audit_file_for(data_dir: &Path, event: &AuditEvent) -> PathBuf {
    let date = event.timestamp.date_naive();
    data_dir
        .join(AUDIT_LOG_DIR)
        .join(format!("{:04}/{:02}", date.year(), date.month()))
        .join(format!("{:02}.jsonl", date.day()))
}

pub async fn append_audit_event(data_dir: &Path, event: &AuditEvent) -> anyhow::Result<()> {
    let log_path = audit_file_for(data_dir, event);
    if let Some(parent) = log_path.parent() {
        async_fs::create_dir_all(parent).await?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .await
        .with_context(|| format!("opening audit log {:?}", log_path))?;
    let serialized = serde_json::to_string(event)?;
    file.write_all(serialized.as_bytes()).await?;
    file.write_all(b"\n").await?;
    file.flush().await?;
    Ok(())
}

/// Most recent audit events first, at most `limit` of them.
pub async fn read_audit_events(data_dir: &Path, limit: usize) -> anyhow::Result<Vec<AuditEvent>> {
    let log_root = data_dir.join(AUDIT_LOG_DIR);
    if limit == 0 || !log_root.exists() {
        return Ok(Vec::new());
    }

    let mut files: Vec<PathBuf> = WalkDir::new(&log_root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files.reverse();

    let mut results = Vec::new();
    for file in files {
        let content = async_fs::read_to_string(&file)
            .await
            .with_context(|| format!("reading audit log {:?}", file))?;
        for line in content.lines().rev() {
            if line.trim().is_empty() {
                continue;
            }
            let event: AuditEvent = serde_json::from_str(line)
                .with_context(|| format!("parsing audit entry in {:?}", file))?;
            results.push(event);
            if results.len() >= limit {
                return Ok(results);
            }
        }
    }

    Ok(results)
}
