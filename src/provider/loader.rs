//! Provider resolution
//!
//! Providers are resolved by name. Instances registered on the loader win;
//! otherwise `<provider_dir>/<name>.{yaml,yml,toml,json}` is read and its
//! `type` selects the factory that builds the provider.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use log::debug;

use super::clash::ClashProviderFactory;
use super::custom::CustomProviderFactory;
use super::Provider;
use crate::error::{Error, Result};
use crate::models::ConfigFormat;

/// Extensions tried, in order, when resolving a provider file.
pub const PROVIDER_EXTENSIONS: [&str; 4] = ["yaml", "yml", "toml", "json"];

/// Builds providers of one `type` from their file contents.
pub trait ProviderFactory: Send + Sync {
    /// Value of the `type` field this factory handles.
    fn provider_type(&self) -> &'static str;

    fn create(&self, config: serde_json::Value) -> anyhow::Result<Arc<dyn Provider>>;
}

/// A resolved provider together with where it came from.
#[derive(Clone)]
pub struct LoadedProvider {
    pub name: String,
    /// Provider file, or a `<registered:name>` marker for registered providers
    pub path: PathBuf,
    pub provider: Arc<dyn Provider>,
}

impl std::fmt::Debug for LoadedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedProvider")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish()
    }
}

pub struct ProviderLoader {
    provider_dir: PathBuf,
    factories: HashMap<&'static str, Box<dyn ProviderFactory>>,
    registered: HashMap<String, Arc<dyn Provider>>,
}

impl ProviderLoader {
    /// A loader with the built-in `custom` and `clash` provider types.
    pub fn new(provider_dir: impl Into<PathBuf>) -> Self {
        let mut loader = ProviderLoader {
            provider_dir: provider_dir.into(),
            factories: HashMap::new(),
            registered: HashMap::new(),
        };
        loader.register_factory(Box::new(CustomProviderFactory));
        loader.register_factory(Box::new(ClashProviderFactory));
        loader
    }

    pub fn register_factory(&mut self, factory: Box<dyn ProviderFactory>) {
        self.factories.insert(factory.provider_type(), factory);
    }

    /// Register a provider instance under `name`, shadowing any file of the
    /// same name.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.registered.insert(name.into(), provider);
    }

    /// Path of the provider file for `name`, if one exists.
    pub fn resolve_path(&self, name: &str) -> Option<PathBuf> {
        PROVIDER_EXTENSIONS
            .iter()
            .map(|ext| self.provider_dir.join(format!("{}.{}", name, ext)))
            .find(|path| path.is_file())
    }

    /// Resolve and build the provider called `name`.
    pub async fn load(&self, name: &str) -> Result<LoadedProvider> {
        if let Some(provider) = self.registered.get(name) {
            return Ok(LoadedProvider {
                name: name.to_string(),
                path: PathBuf::from(format!("<registered:{}>", name)),
                provider: Arc::clone(provider),
            });
        }

        let path = self.resolve_path(name).ok_or_else(|| Error::ProviderNotFound {
            name: name.to_string(),
            dir: self.provider_dir.clone(),
        })?;
        debug!("Loading provider {} from {}", name, path.display());

        let execution_error = |message: String| Error::ProviderExecution {
            path: path.clone(),
            message,
        };

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| execution_error(e.to_string()))?;
        let config: serde_json::Value = ConfigFormat::from_path(&path)
            .parse(&content)
            .map_err(execution_error)?;
        let provider_type = config
            .get("type")
            .and_then(|value| value.as_str())
            .ok_or_else(|| execution_error("missing provider type".to_string()))?;
        let factory = self
            .factories
            .get(provider_type)
            .ok_or_else(|| execution_error(format!("unknown provider type {}", provider_type)))?;
        let provider = factory
            .create(config.clone())
            .map_err(|e| execution_error(format!("{:#}", e)))?;

        Ok(LoadedProvider {
            name: name.to_string(),
            path,
            provider,
        })
    }

    /// Names of every provider this loader can resolve: registered ones plus
    /// the files found in the provider directory.
    pub fn discover(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.registered.keys().cloned().collect();
        if self.provider_dir.is_dir() {
            let entries = std::fs::read_dir(&self.provider_dir)
                .map_err(|e| Error::io(&self.provider_dir, e))?;
            for entry in entries {
                let path = entry.map_err(|e| Error::io(&self.provider_dir, e))?.path();
                let is_provider = path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| PROVIDER_EXTENSIONS.contains(&ext));
                let stem = path.file_stem().and_then(|s| s.to_str());
                if let (true, Some(stem)) = (is_provider, stem) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        names.dedup();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NodeConfig;
    use async_trait::async_trait;

    struct StaticProvider;

    #[async_trait]
    impl Provider for StaticProvider {
        async fn get_node_list(&self) -> anyhow::Result<Vec<NodeConfig>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_missing_provider() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ProviderLoader::new(dir.path());
        match loader.load("nope").await {
            Err(Error::ProviderNotFound { name, .. }) => assert_eq!(name, "nope"),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_load_errors_embed_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("odd.yaml"), "type: magic\n").unwrap();
        std::fs::write(dir.path().join("broken.toml"), "type = \"custom\"\n").unwrap();
        let loader = ProviderLoader::new(dir.path());

        let err = loader.load("odd").await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("odd.yaml"), "{}", message);
        assert!(message.contains("unknown provider type magic"), "{}", message);

        let err = loader.load("broken").await.unwrap_err();
        assert!(matches!(err, Error::ProviderExecution { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[tokio::test]
    async fn test_registered_provider_wins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("demo.yaml"), "type: magic\n").unwrap();
        let mut loader = ProviderLoader::new(dir.path());
        loader.register("demo", Arc::new(StaticProvider));
        let loaded = loader.load("demo").await.unwrap();
        assert_eq!(loaded.path, PathBuf::from("<registered:demo>"));
    }

    #[test]
    fn test_discover() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.yaml"), "").unwrap();
        std::fs::write(dir.path().join("a.json"), "").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        let mut loader = ProviderLoader::new(dir.path());
        loader.register("z", Arc::new(StaticProvider));
        assert_eq!(loader.discover().unwrap(), vec!["a", "b", "z"]);
    }
}
