use crate::ingest::clean::REQUIRED_COLUMNS;
use anyhow::{bail, Context};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

fn is_csv(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn has_required_columns(path: &Path) -> bool {
    let Ok(mut rdr) = csv::Reader::from_path(path) else {
        return false;
    };
    match rdr.headers() {
        Ok(headers) => REQUIRED_COLUMNS
            .iter()
            .all(|name| headers.iter().any(|h| h.trim() == *name)),
        Err(err) => {
            debug!("skipping {}: {}", path.display(), err);
            false
        }
    }
}

/// Picks the input table in `dir`: the first CSV (by name) whose header has
/// every required column, else the first CSV so its own errors surface.
pub fn discover_input(dir: &Path) -> anyhow::Result<PathBuf> {
    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("listing {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| is_csv(path))
        .collect();
    candidates.sort();

    if let Some(found) = candidates.iter().find(|path| has_required_columns(path)) {
        return Ok(found.clone());
    }
    match candidates.into_iter().next() {
        Some(first) => {
            warn!(
                "no CSV in {} has all required columns; falling back to {}",
                dir.display(),
                first.display()
            );
            Ok(first)
        }
        None => bail!("no CSV file found in {}", dir.display()),
    }
}
