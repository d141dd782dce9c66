// Memory system utility functions
use std::path::{Path, PathBuf};

use anyhow::{Error, Result};
use log::warn;

/// Estimate the token count of a text. A rough approximation of four
/// characters per token, good enough for threshold decisions.
pub fn estimate_token_count(text: &str) -> usize {
    text.chars().count() / 4
}

/// Ensure a directory exists
pub async fn ensure_dir_exists(dir_path: &Path) -> Result<()> {
    if !dir_path.exists() {
        tokio::fs::create_dir_all(dir_path).await.map_err(|e| {
            warn!("Failed to create directory '{}': {}", dir_path.display(), e);
            Error::from(e)
        })?;
    }
    Ok(())
}

/// Write a file atomically: write to a temp path, then rename over the target
pub async fn atomic_write_file(file_path: &Path, content: &str) -> Result<()> {
    let temp_path = file_path.with_extension("tmp");

    if let Some(parent) = file_path.parent() {
        ensure_dir_exists(parent).await?;
    }

    tokio::fs::write(&temp_path, content).await?;
    tokio::fs::rename(&temp_path, file_path).await.map_err(|e| {
        warn!(
            "Failed to rename temporary file to '{}': {}",
            file_path.display(),
            e
        );
        Error::from(e)
    })?;

    Ok(())
}

/// Current timestamp in ISO 8601 format
pub fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Path of a session's storage file inside the data directory
pub fn session_file_path(data_dir: &Path, session_id: &str, suffix: &str) -> PathBuf {
    data_dir.join(format!("{}_{}", session_id, suffix))
}

/// Get an environment variable with a fallback default
pub fn get_env_var(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Data directory for persisted memory, overridable via MEMORY_DATA_DIR
pub fn get_data_dir_from_env() -> PathBuf {
    PathBuf::from(get_env_var("MEMORY_DATA_DIR", "./data/memory"))
}

/// How many recent messages to load, overridable via MEMORY_RECENT_MESSAGES_COUNT
pub fn get_recent_messages_count_from_env() -> usize {
    get_env_var("MEMORY_RECENT_MESSAGES_COUNT", "10")
        .parse()
        .unwrap_or(10)
}

/// Summary threshold in estimated tokens, overridable via MEMORY_SUMMARY_THRESHOLD
pub fn get_summary_threshold_from_env() -> usize {
    get_env_var("MEMORY_SUMMARY_THRESHOLD", "3500")
        .parse()
        .unwrap_or(3500)
}

/// Generate a random session ID
pub fn generate_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
