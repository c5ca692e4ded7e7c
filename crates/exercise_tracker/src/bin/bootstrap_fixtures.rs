use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use exercise_tracker::{config, fixtures};
use tracing::info;

/// `bootstrap_fixtures [target_root] [seed.yml]`
///
/// Seeds `target_root/data` through the file store. Without a seed path the
/// bundled core fixture is used.
#[tokio::main]
async fn main() -> Result<()> {
    config::init_tracing();

    let mut args = env::args().skip(1);
    let target = match args.next() {
        Some(path) => PathBuf::from(path),
        None => env::current_dir().context("resolving current directory")?,
    };
    let seed_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(fixtures::core_seed_path);

    let report = fixtures::seed_root(&target, seed_path.clone()).await?;
    info!(
        root = %target.display(),
        seed = %seed_path.display(),
        users_added = report.users_added,
        users_skipped = report.users_skipped,
        exercises_added = report.exercises_added,
        "fixture data ready; point EXERCISE_APP_ROOT here before starting the server"
    );
    Ok(())
}
