use std::path::{Path, PathBuf};

use anyhow::Result;

pub async fn install_core_fixture(root: &Path) -> Result<PathBuf> {
    exercise_tracker::fixtures::install_core_fixture(root).await
}
