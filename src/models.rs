use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Resolve a model file: use the local path when present, otherwise fetch the
/// file from the given Hub repo into the local cache.
pub fn resolve_model(local_path: &str, hub_repo: &str) -> Result<PathBuf> {
    let path = Path::new(local_path);
    if path.exists() {
        return Ok(path.to_path_buf());
    }

    let filename = path
        .file_name()
        .and_then(|f| f.to_str())
        .context("model path has no file name")?;

    tracing::info!("model {} not found locally, fetching from {}", local_path, hub_repo);
    let api = hf_hub::api::sync::Api::new()?;
    let fetched = api
        .model(hub_repo.to_string())
        .get(filename)
        .with_context(|| format!("failed to fetch {} from {}", filename, hub_repo))?;

    Ok(fetched)
}
