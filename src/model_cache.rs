//! On-disk cache for ONNX models fetched from Hugging Face.
//!
//! Files land in `~/.cache/support-bot/models/<model>/<path in repo>`.
//! After the first download the tract backends run fully offline.

use anyhow::Result;
use std::path::{Path, PathBuf};

fn cache_dir() -> Result<PathBuf> {
    let base = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let dir = PathBuf::from(base)
        .join(".cache")
        .join("support-bot")
        .join("models");
    std::fs::create_dir_all(&dir).map_err(|e| anyhow::anyhow!("Create cache dir: {}", e))?;
    Ok(dir)
}

fn download_to_cache(repo: &str, path: &str, cache_path: &Path) -> Result<()> {
    if cache_path.exists() {
        return Ok(());
    }
    let url = format!(
        "https://huggingface.co/{}/resolve/main/{}",
        repo,
        path.replace(' ', "%20")
    );
    tracing::info!(%url, "downloading model file");
    let resp = reqwest::blocking::get(&url)
        .map_err(|e| anyhow::anyhow!("Download {}: {}", url, e))?
        .error_for_status()
        .map_err(|e| anyhow::anyhow!("Download {}: {}", url, e))?;
    let bytes = resp
        .bytes()
        .map_err(|e| anyhow::anyhow!("Read body: {}", e))?;
    if let Some(parent) = cache_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| anyhow::anyhow!("Create cache parent: {}", e))?;
    }
    std::fs::write(cache_path, &bytes).map_err(|e| anyhow::anyhow!("Write cache: {}", e))?;
    Ok(())
}

/// Ensure the ONNX graph and tokenizer of `repo` are cached under
/// `model_name`; return `(onnx path, tokenizer path)`.
///
/// Blocking; call from `spawn_blocking`.
pub fn ensure_cached(
    model_name: &str,
    repo: &str,
    onnx_rel: &str,
    tokenizer_rel: &str,
) -> Result<(PathBuf, PathBuf)> {
    let model_dir = cache_dir()?.join(model_name);
    let onnx_path = model_dir.join(onnx_rel);
    let tokenizer_path = model_dir.join(tokenizer_rel);
    download_to_cache(repo, onnx_rel, &onnx_path)?;
    download_to_cache(repo, tokenizer_rel, &tokenizer_path)?;
    Ok((onnx_path, tokenizer_path))
}
