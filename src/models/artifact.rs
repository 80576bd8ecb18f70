use std::collections::HashMap;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use super::proxy_group_config::ProxyGroupModifier;

/// One generated output file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArtifactConfig {
    /// Output file name, also used for the download url
    pub name: String,
    /// Template name, without the `.tpl` extension
    pub template: String,
    /// First provider, its filters govern the whole artifact
    pub provider: String,
    /// Providers merged after `provider`, in order
    pub combine_providers: Vec<String>,
    pub custom_params: Option<HashMap<String, serde_json::Value>>,
    pub proxy_group_modifier: Option<ProxyGroupModifier>,
}

impl ArtifactConfig {
    /// `provider` followed by `combineProviders`.
    pub fn provider_names(&self) -> Vec<&str> {
        std::iter::once(self.provider.as_str())
            .chain(self.combine_providers.iter().map(String::as_str))
            .collect()
    }

    /// Names of required fields left empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.template.trim().is_empty() {
            missing.push("template");
        }
        if self.provider.trim().is_empty() {
            missing.push("provider");
        }
        missing
    }

    /// Whether `name` stays inside the directory it is joined onto.
    pub fn has_relative_name(&self) -> bool {
        let mut components = Path::new(&self.name)
            .components()
            .filter(|component| *component != Component::CurDir)
            .peekable();
        components.peek().is_some()
            && components.all(|component| matches!(component, Component::Normal(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_order() {
        let artifact = ArtifactConfig {
            name: "surge.conf".to_string(),
            template: "surge".to_string(),
            provider: "a".to_string(),
            combine_providers: vec!["b".to_string(), "c".to_string()],
            ..Default::default()
        };
        assert_eq!(artifact.provider_names(), vec!["a", "b", "c"]);
        assert!(artifact.missing_fields().is_empty());
    }

    #[test]
    fn test_missing_fields() {
        let artifact = ArtifactConfig {
            name: "clash.yaml".to_string(),
            ..Default::default()
        };
        assert_eq!(artifact.missing_fields(), vec!["template", "provider"]);
    }

    #[test]
    fn test_relative_name() {
        let named = |name: &str| ArtifactConfig {
            name: name.to_string(),
            ..Default::default()
        };
        assert!(named("Surge.conf").has_relative_name());
        assert!(named("./surge/Surge.conf").has_relative_name());
        assert!(!named("../Surge.conf").has_relative_name());
        assert!(!named("/etc/Surge.conf").has_relative_name());
        assert!(!named(".").has_relative_name());
    }
}
