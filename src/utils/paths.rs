//! Cross-Platform Path Utilities
//!
//! Resolves the SuperLearn data directory (~/.superlearn/) and the files
//! inside it.

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

/// Get the user's home directory
pub fn home_dir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| AppError::config("Could not determine home directory"))
}

/// Get the SuperLearn directory (~/.superlearn/)
pub fn superlearn_dir() -> AppResult<PathBuf> {
    Ok(home_dir()?.join(".superlearn"))
}

/// Get the config file path (~/.superlearn/config.json)
pub fn config_path() -> AppResult<PathBuf> {
    Ok(superlearn_dir()?.join("config.json"))
}

/// Get the database file path inside `data_dir`
pub fn database_path_in(data_dir: &Path) -> PathBuf {
    data_dir.join("data.db")
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
