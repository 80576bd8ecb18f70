//! Run-level configuration
//!
//! A [`CommandConfig`] describes one generation run: where providers and
//! templates live, where artifacts go and the settings shared by every
//! artifact. It can be written as YAML, TOML or JSON.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::artifact::ArtifactConfig;
use super::node::{NodeType, SurgeConfig};
use super::remote_snippet::RemoteSnippetConfig;
use crate::error::{Error, Result};

pub fn default_output() -> PathBuf {
    PathBuf::from("dist")
}

pub fn default_provider_dir() -> PathBuf {
    PathBuf::from("provider")
}

pub fn default_template_dir() -> PathBuf {
    PathBuf::from("template")
}

/// Access settings of the gateway serving generated artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewayConfig {
    /// Appended as `access_token` to every download url when set
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandConfig {
    pub artifacts: Vec<ArtifactConfig>,
    /// Prefix of download urls, usually ends with `/`
    #[serde(default)]
    pub url_base: String,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default = "default_provider_dir")]
    pub provider_dir: PathBuf,
    #[serde(default = "default_template_dir")]
    pub template_dir: PathBuf,
    /// External binaries per protocol, nodes of these types get a local port
    #[serde(default)]
    pub bin_path: BTreeMap<NodeType, String>,
    #[serde(default)]
    pub surge_config: SurgeConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub remote_snippets: Vec<RemoteSnippetConfig>,
    /// Defaults for every artifact's `customParams`
    #[serde(default)]
    pub custom_params: HashMap<String, serde_json::Value>,
}

impl Default for CommandConfig {
    fn default() -> Self {
        CommandConfig {
            artifacts: Vec::new(),
            url_base: String::new(),
            output: default_output(),
            provider_dir: default_provider_dir(),
            template_dir: default_template_dir(),
            bin_path: BTreeMap::new(),
            surge_config: SurgeConfig::default(),
            gateway: GatewayConfig::default(),
            remote_snippets: Vec::new(),
            custom_params: HashMap::new(),
        }
    }
}

/// Serialization format of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
    Json,
}

impl ConfigFormat {
    /// Guess the format from a file extension, defaulting to YAML.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("toml") => ConfigFormat::Toml,
            Some("json") => ConfigFormat::Json,
            _ => ConfigFormat::Yaml,
        }
    }

    /// Deserialize `content` written in this format.
    pub fn parse<T: serde::de::DeserializeOwned>(
        self,
        content: &str,
    ) -> std::result::Result<T, String> {
        match self {
            ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

impl CommandConfig {
    pub fn load_from_content(content: &str, format: ConfigFormat) -> Result<Self> {
        format
            .parse(content)
            .map_err(|e| Error::Configuration(format!("Invalid configuration: {}", e)))
    }

    /// Load a configuration file and resolve its relative directories
    /// against the file's own directory.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut config = Self::load_from_content(&content, ConfigFormat::from_path(path))?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    pub fn resolve_paths(&mut self, base: &Path) {
        for dir in [
            &mut self.output,
            &mut self.provider_dir,
            &mut self.template_dir,
        ] {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }

    /// Reject artifacts missing `name`, `template` or `provider`, and
    /// artifact names that would land outside the output directory.
    pub fn validate(&self) -> Result<()> {
        for (index, artifact) in self.artifacts.iter().enumerate() {
            let missing = artifact.missing_fields();
            if !missing.is_empty() {
                let label = if artifact.name.is_empty() {
                    format!("#{}", index)
                } else {
                    artifact.name.clone()
                };
                return Err(Error::Configuration(format!(
                    "Artifact {} is missing required field(s): {}",
                    label,
                    missing.join(", ")
                )));
            }
            if !artifact.has_relative_name() {
                return Err(Error::Configuration(format!(
                    "Artifact name {} must be a relative path inside the output directory",
                    artifact.name
                )));
            }
        }
        Ok(())
    }

    /// Global custom params overlaid with the artifact's own.
    pub fn custom_params_for(
        &self,
        artifact: &ArtifactConfig,
    ) -> HashMap<String, serde_json::Value> {
        let mut params = self.custom_params.clone();
        if let Some(own) = &artifact.custom_params {
            params.extend(own.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        params
    }
}
