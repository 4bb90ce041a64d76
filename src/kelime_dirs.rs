//! Centralized application directory paths for Kelime.
//!
//! Uses the [`dirs`] crate for platform-appropriate directory resolution.
//!
//! | Purpose | macOS | Linux |
//! |---------|-------|-------|
//! | App data | `~/Library/Application Support/kelime/` | `~/.local/share/kelime/` |
//! | Config | `~/Library/Application Support/kelime/` | `~/.config/kelime/` |
//!
//! # Environment Overrides
//!
//! - `KELIME_DATA_DIR`: overrides [`data_dir`]
//! - `KELIME_CONFIG_DIR`: overrides [`config_dir`]

use std::path::PathBuf;

/// Application data root directory (vocabulary store, logs).
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("KELIME_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join("kelime"))
        .unwrap_or_else(|| PathBuf::from("/tmp/kelime-data"))
}

/// Application config directory (`config.toml`).
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("KELIME_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("kelime"))
        .unwrap_or_else(|| PathBuf::from("/tmp/kelime-config"))
}

/// Main config file path (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Vocabulary store file path (`data_dir()/vocabulary.json`).
#[must_use]
pub fn vocabulary_file() -> PathBuf {
    data_dir().join("vocabulary.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_file_ends_with_config_toml() {
        assert!(config_file().to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn vocabulary_file_lives_under_data_dir() {
        let file = vocabulary_file();
        assert!(file.starts_with(data_dir()));
        assert_eq!(
            file.file_name().and_then(|n| n.to_str()),
            Some("vocabulary.json")
        );
    }
}
