use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;

use crate::records::{ExerciseRecord, User, UserId};

mod jsonl;
mod memory;

pub use jsonl::FileStore;
pub use memory::MemoryStore;

pub const USERS_FILE: &str = "users.jsonl";
pub const EXERCISES_FILE: &str = "exercises.jsonl";
pub const AUDIT_LOG_DIR: &str = "logs/audit";

const REQUIRED_DIRS: &[&str] = &[AUDIT_LOG_DIR];

pub fn ensure_data_layout(data_dir: &Path) -> anyhow::Result<()> {
    for dir in REQUIRED_DIRS {
        let path = data_dir.join(dir);
        fs::create_dir_all(&path).with_context(|| format!("creating dir {:?}", path))?;
    }
    Ok(())
}

pub fn load_yaml<T: DeserializeOwned>(path: PathBuf) -> anyhow::Result<T> {
    let content = fs::read_to_string(&path).with_context(|| format!("reading yaml {:?}", path))?;
    let parsed =
        serde_yaml::from_str(&content).with_context(|| format!("parsing yaml {:?}", path))?;
    Ok(parsed)
}

/// Persistence for users and their exercises.
///
/// Reads return records in insertion order. Implementations own their own
/// consistency; callers never retry.
#[async_trait]
pub trait ExerciseStore: Send + Sync {
    async fn find_user_by_id(&self, id: UserId) -> anyhow::Result<Option<User>>;

    async fn list_users(&self) -> anyhow::Result<Vec<User>>;

    async fn insert_user(&self, user: User) -> anyhow::Result<()>;

    async fn find_exercises_by_user(&self, user_id: UserId)
    -> anyhow::Result<Vec<ExerciseRecord>>;

    async fn insert_exercise(&self, record: ExerciseRecord) -> anyhow::Result<()>;

    /// Exercises dated within `[from, to]`, inclusive. Stores able to push the
    /// window into their query should override this.
    async fn find_exercises_between(
        &self,
        user_id: UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<Vec<ExerciseRecord>> {
        let mut records = self.find_exercises_by_user(user_id).await?;
        records.retain(|record| from <= record.date && record.date <= to);
        Ok(records)
    }
}
