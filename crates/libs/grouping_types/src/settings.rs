use config::{Config, File as ConfigFile};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),
}

/// As deserialized straight from `config/settings.yaml` plus `APP__`-prefixed
/// environment overrides, before any normalization.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSettings {
    pub database: RawDatabaseSettings,
    pub logging: RawLoggingSettings,
    pub recognition: RawRecognitionSettings,
    pub constants: RawConstants,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawDatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawLoggingSettings {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRecognitionSettings {
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawConstants {
    pub similarity_threshold: f32,
    pub max_matches: usize,
    pub head_timeout_ms: u64,
    pub bounding_box_tolerance: f32,
    pub test_user_id: String,
    pub recognition_collection_prefix: String,
    pub find_groups_batch_size: usize,
}

/// Runtime configuration, normalized from `RawSettings`. Kept separate from
/// the raw deserialize-only shape so config parsing stays distinct from the
/// invariants the rest of the crate relies on.
#[derive(Debug, Clone)]
pub struct GroupingSettings {
    pub database_url: String,
    pub database_max_connections: u32,
    pub database_min_connections: u32,
    pub logging_level: String,
    pub recognition_base_url: String,
    pub similarity_threshold: f32,
    pub max_matches: usize,
    pub head_timeout_ms: u64,
    pub bounding_box_tolerance: f32,
    pub test_user_id: String,
    pub recognition_collection_prefix: String,
    pub find_groups_batch_size: usize,
}

impl From<RawSettings> for GroupingSettings {
    fn from(raw: RawSettings) -> Self {
        Self {
            database_url: raw.database.url,
            database_max_connections: raw.database.max_connections,
            database_min_connections: raw.database.min_connections,
            logging_level: raw.logging.level,
            recognition_base_url: raw.recognition.base_url,
            similarity_threshold: raw.constants.similarity_threshold,
            max_matches: raw.constants.max_matches,
            head_timeout_ms: raw.constants.head_timeout_ms,
            bounding_box_tolerance: raw.constants.bounding_box_tolerance,
            test_user_id: raw.constants.test_user_id,
            recognition_collection_prefix: raw.constants.recognition_collection_prefix,
            find_groups_batch_size: raw.constants.find_groups_batch_size,
        }
    }
}

/// Loads settings from a specific YAML file, optionally layering `.env` and
/// `APP__`-prefixed environment variables on top.
pub fn load_settings_from_path(
    path: &Path,
    include_env: bool,
) -> Result<GroupingSettings, SettingsError> {
    if include_env {
        dotenv::from_path(".env").ok();
    }

    let mut builder = Config::builder().add_source(ConfigFile::from(path));
    if include_env {
        builder = builder.add_source(
            config::Environment::with_prefix("APP")
                .separator("__")
                .try_parsing(true),
        );
    }

    let raw: RawSettings = builder.build()?.try_deserialize()?;
    Ok(raw.into())
}

/// Loads settings from the conventional `config/settings.yaml` location.
pub fn load_settings() -> Result<GroupingSettings, SettingsError> {
    load_settings_from_path(Path::new("config/settings.yaml"), true)
}
