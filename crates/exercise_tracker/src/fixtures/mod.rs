use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::info;

use crate::{
    query::parse_calendar_date,
    records::{ExerciseRecord, User, UserId},
    storage::{self, ExerciseStore, FileStore},
};

const CORE_SEED_FILE: &str = "tests/fixtures/core/seed.yml";

/// Users and exercises to load into a store, as written in a seed YAML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub users: Vec<SeedUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedUser {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub exercises: Vec<SeedExercise>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedExercise {
    pub description: String,
    pub duration: u64,
    /// Any calendar shape the log query accepts.
    pub date: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users_added: usize,
    pub users_skipped: usize,
    pub exercises_added: usize,
}

/// Return the on-disk location of the bundled core seed file.
pub fn core_seed_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(CORE_SEED_FILE)
}

pub fn load_seed(path: PathBuf) -> Result<SeedFile> {
    storage::load_yaml(path)
}

/// Write `seed` into `store`.
///
/// The whole seed is validated before anything is written, so a bad date or a
/// repeated id leaves the store untouched. Users already present are skipped
/// along with their exercises, which makes reseeding the same root a no-op.
pub async fn seed_store(store: &dyn ExerciseStore, seed: &SeedFile) -> Result<SeedReport> {
    let planned = validate_seed(seed)?;

    let mut report = SeedReport::default();
    for (owner, records) in planned {
        if store.find_user_by_id(owner.id).await?.is_some() {
            report.users_skipped += 1;
            continue;
        }
        store.insert_user(owner).await?;
        report.users_added += 1;
        for record in records {
            store.insert_exercise(record).await?;
            report.exercises_added += 1;
        }
    }

    info!(
        users_added = report.users_added,
        users_skipped = report.users_skipped,
        exercises_added = report.exercises_added,
        "seed applied"
    );
    Ok(report)
}

fn validate_seed(seed: &SeedFile) -> Result<Vec<(User, Vec<ExerciseRecord>)>> {
    let mut seen = HashSet::new();
    let mut planned = Vec::with_capacity(seed.users.len());

    for entry in &seed.users {
        if !seen.insert(entry.id) {
            bail!("seed lists user {} more than once", entry.id);
        }
        let username = entry.username.trim();
        if username.is_empty() {
            bail!("seed user {} has a blank username", entry.id);
        }

        let owner = User {
            id: entry.id,
            username: username.to_string(),
        };
        let records = entry
            .exercises
            .iter()
            .map(|exercise| -> Result<ExerciseRecord> {
                let date = parse_calendar_date(&exercise.date).with_context(|| {
                    format!(
                        "seed exercise {:?} for {} has an unreadable date {:?}",
                        exercise.description, owner.username, exercise.date
                    )
                })?;
                Ok(ExerciseRecord::new(
                    &owner,
                    exercise.description.trim(),
                    exercise.duration,
                    date,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        planned.push((owner, records));
    }

    Ok(planned)
}

/// Seed the data tree under `target_root` from the seed file at `seed_path`.
pub async fn seed_root(target_root: &Path, seed_path: PathBuf) -> Result<SeedReport> {
    let seed = load_seed(seed_path)?;
    let data_dir = target_root.join("data");
    storage::ensure_data_layout(&data_dir)?;
    let store = FileStore::open(&data_dir)?;
    seed_store(&store, &seed).await
}

/// Seed `target_root` with the bundled core fixture: two users, one of them
/// with three dated exercises, enough to drive every log query mode.
pub async fn install_core_fixture(target_root: &Path) -> Result<PathBuf> {
    seed_root(target_root, core_seed_path())
        .await
        .with_context(|| format!("installing core fixture into {:?}", target_root))?;
    Ok(target_root.to_path_buf())
}
