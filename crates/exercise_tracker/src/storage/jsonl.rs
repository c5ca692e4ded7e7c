use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::fs::{self as async_fs, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use super::{EXERCISES_FILE, ExerciseStore, USERS_FILE};
use crate::records::{ExerciseRecord, User, UserId};

/// Append-only JSON-lines store rooted at the data directory.
///
/// Every read scans the whole file, so insertion order is file order.
#[derive(Debug)]
pub struct FileStore {
    users_path: PathBuf,
    exercises_path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("creating data dir {:?}", data_dir))?;
        Ok(Self {
            users_path: data_dir.join(USERS_FILE),
            exercises_path: data_dir.join(EXERCISES_FILE),
            write_lock: Mutex::new(()),
        })
    }

    async fn append<T: Serialize>(&self, path: &Path, value: &T) -> anyhow::Result<()> {
        let mut line = serde_json::to_string(value)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .with_context(|| format!("opening {:?} for append", path))?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

async fn read_lines<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let content = match async_fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err).with_context(|| format!("reading {:?}", path)),
    };

    let mut records = Vec::new();
    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(line)
            .with_context(|| format!("parsing line {} of {:?}", index + 1, path))?;
        records.push(record);
    }
    Ok(records)
}

#[async_trait]
impl ExerciseStore for FileStore {
    async fn find_user_by_id(&self, id: UserId) -> anyhow::Result<Option<User>> {
        let users: Vec<User> = read_lines(&self.users_path).await?;
        Ok(users.into_iter().find(|user| user.id == id))
    }

    async fn list_users(&self) -> anyhow::Result<Vec<User>> {
        read_lines(&self.users_path).await
    }

    async fn insert_user(&self, user: User) -> anyhow::Result<()> {
        self.append(&self.users_path, &user).await?;
        debug!(user_id = %user.id, "user persisted");
        Ok(())
    }

    async fn find_exercises_by_user(
        &self,
        user_id: UserId,
    ) -> anyhow::Result<Vec<ExerciseRecord>> {
        let records: Vec<ExerciseRecord> = read_lines(&self.exercises_path).await?;
        Ok(records
            .into_iter()
            .filter(|record| record.user_id == user_id)
            .collect())
    }

    async fn insert_exercise(&self, record: ExerciseRecord) -> anyhow::Result<()> {
        self.append(&self.exercises_path, &record).await?;
        debug!(user_id = %record.user_id, exercise_id = %record.id, "exercise persisted");
        Ok(())
    }
}
