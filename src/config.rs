use crate::error::{Result, ResultExt as _};
use crate::pipeline::SplitConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    /// Seed for the stratified split; identical input and seed give identical partitions
    pub seed: u64,
    /// Share of rows assigned to the training partition
    pub train_fraction: f64,
    /// Share of the non-training remainder assigned to tuning (the rest is test)
    pub tune_fraction_of_remainder: f64,
    /// Where partitions are written by the CLI
    pub output_dir: PathBuf,
    /// Optional directory for rotating log files
    pub log_dir: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        let split = SplitConfig::default();
        Self {
            seed: split.seed,
            train_fraction: split.train_fraction,
            tune_fraction_of_remainder: split.tune_fraction,
            output_dir: PathBuf::from("processed"),
            log_dir: None,
        }
    }
}

impl AppSettings {
    pub fn split_config(&self) -> SplitConfig {
        SplitConfig {
            seed: self.seed,
            train_fraction: self.train_fraction,
            tune_fraction: self.tune_fraction_of_remainder,
        }
    }
}

/// Default settings location: `<config dir>/strata/settings.json`.
pub fn get_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("strata").join("settings.json"))
}

/// Load settings from `path`, or from the default location when `None`.
///
/// An explicit path must exist and parse. A missing default file falls back
/// to [`AppSettings::default`].
pub fn load_settings(path: Option<&Path>) -> Result<AppSettings> {
    if let Some(path) = path {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Loaded settings");
        return Ok(serde_json::from_str(&content)?);
    }

    if let Some(default_path) = get_settings_path()
        && default_path.exists()
    {
        let content = std::fs::read_to_string(&default_path)?;
        tracing::debug!(path = %default_path.display(), "Loaded settings");
        return Ok(serde_json::from_str(&content)?);
    }

    tracing::info!("No settings file found, using defaults");
    Ok(AppSettings::default())
}

pub fn save_settings(settings: &AppSettings, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_split_defaults() {
        let settings = AppSettings::default();
        assert_eq!(settings.split_config(), SplitConfig::default());
        assert_eq!(settings.seed, 42);
    }

    #[test]
    fn test_partial_settings_fill_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "seed": 7 }"#)?;

        let settings = load_settings(Some(&path))?;
        assert_eq!(settings.seed, 7);
        assert!((settings.train_fraction - 0.6).abs() < f64::EPSILON);
        assert_eq!(settings.output_dir, PathBuf::from("processed"));
        Ok(())
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("settings.json");
        let settings = AppSettings {
            seed: 99,
            log_dir: Some(PathBuf::from("logs")),
            ..AppSettings::default()
        };

        save_settings(&settings, &path)?;
        assert_eq!(load_settings(Some(&path))?, settings);
        Ok(())
    }

    #[test]
    fn test_explicit_missing_path_errors() {
        let result = load_settings(Some(Path::new("/definitely/not/here.json")));
        assert!(result.is_err());
    }
}
