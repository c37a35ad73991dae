use crate::error::RelevanceError;
use serde::{Deserialize, Serialize};
use std::{
    fs::{read_to_string, write},
    path::PathBuf,
};

/// File extension (without the dot) marking a document as a container graph.
pub const DEFAULT_CONTAINER_EXTENSION: &str = "canvas";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelevanceConfig {
    pub container_extension: String,
    /// Opaque host setting. Persisted, never interpreted.
    pub setting: String,
    /// Populate `urls` connectors from document bodies.
    pub extract_urls: bool,
    /// Drop engine results whose query focus no longer matches the store focus.
    pub gate_stale_results: bool,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        RelevanceConfig {
            container_extension: DEFAULT_CONTAINER_EXTENSION.to_string(),
            setting: "default".to_string(),
            extract_urls: false,
            gate_stale_results: false,
        }
    }
}

impl RelevanceConfig {
    pub fn is_container_path(&self, path: &str) -> bool {
        is_container_path(path, &self.container_extension)
    }
}

/// True when `path` ends in `.{extension}`. A bare `.{extension}` file name counts.
pub fn is_container_path(path: &str, extension: &str) -> bool {
    path.strip_suffix(extension)
        .is_some_and(|rest| rest.ends_with('.'))
}

pub trait ConfigProvider: Send + Sync {
    fn get_config(&self) -> Result<RelevanceConfig, RelevanceError>;
    fn set_config(&self, config: &RelevanceConfig) -> Result<(), RelevanceError>;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TomlConfigProvider {
    path: PathBuf,
}

impl TomlConfigProvider {
    pub fn new(path: PathBuf) -> Self {
        TomlConfigProvider { path }
    }
}

impl ConfigProvider for TomlConfigProvider {
    fn get_config(&self) -> Result<RelevanceConfig, RelevanceError> {
        tracing::debug!("Attempting to read config from: {:?}", &self.path);
        if !self.path.exists() {
            tracing::debug!("Config file not found, using defaults.");
            return Ok(RelevanceConfig::default());
        }
        let content = read_to_string(&self.path)?;
        Ok(toml::from_str(&content)?)
    }

    fn set_config(&self, config: &RelevanceConfig) -> Result<(), RelevanceError> {
        tracing::debug!("Attempting to write config to: {:?}", &self.path);
        let toml_string = toml::to_string(config)?;
        write(&self.path, toml_string)?;
        Ok(())
    }
}
