//! Provider whose nodes are written inline in the provider file.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use super::{NodeFilter, Provider, ProviderCapabilities, ProviderFactory, ProviderFileConfig};
use crate::filter::NodeNameFilter;
use crate::models::NodeConfig;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomProviderConfig {
    #[serde(flatten)]
    common: ProviderFileConfig,
    node_list: Vec<NodeConfig>,
}

#[derive(Debug)]
pub struct CustomProvider {
    nodes: Vec<NodeConfig>,
    capabilities: ProviderCapabilities,
}

impl CustomProvider {
    pub fn from_value(config: serde_json::Value) -> anyhow::Result<Self> {
        let config: CustomProviderConfig = serde_json::from_value(config)?;
        Ok(CustomProvider {
            capabilities: ProviderCapabilities::from_config(&config.common)?,
            nodes: config.node_list,
        })
    }
}

#[async_trait]
impl Provider for CustomProvider {
    async fn get_node_list(&self) -> anyhow::Result<Vec<NodeConfig>> {
        Ok(self.nodes.clone())
    }

    fn node_filter(&self) -> Option<NodeFilter> {
        self.capabilities.node_filter()
    }

    fn add_flag(&self) -> bool {
        self.capabilities.add_flag()
    }

    fn netflix_filter(&self) -> Option<NodeNameFilter> {
        self.capabilities.netflix_filter()
    }

    fn youtube_premium_filter(&self) -> Option<NodeNameFilter> {
        self.capabilities.youtube_premium_filter()
    }

    fn custom_filters(&self) -> Option<HashMap<String, NodeNameFilter>> {
        self.capabilities.custom_filters()
    }

    fn next_port(&self) -> Option<u16> {
        self.capabilities.next_port()
    }
}

pub struct CustomProviderFactory;

impl ProviderFactory for CustomProviderFactory {
    fn provider_type(&self) -> &'static str {
        "custom"
    }

    fn create(&self, config: serde_json::Value) -> anyhow::Result<Arc<dyn Provider>> {
        Ok(Arc::new(CustomProvider::from_value(config)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_custom_provider() {
        let config = serde_json::json!({
            "type": "custom",
            "addFlag": true,
            "nodeList": [
                {
                    "type": "shadowsocks",
                    "nodeName": "HK 01",
                    "hostname": "hk.example.com",
                    "port": 8388,
                    "method": "aes-128-gcm",
                    "password": "password"
                },
                {
                    "type": "http",
                    "nodeName": "US 01",
                    "hostname": "us.example.com",
                    "port": 8080,
                    "enable": false
                }
            ]
        });
        let provider = CustomProviderFactory.create(config).unwrap();
        let nodes = provider.get_node_list().await.unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].node_name, "HK 01");
        assert!(!nodes[1].enable);
        assert!(provider.add_flag());
        assert!(provider.node_filter().is_none());
        assert!(provider.next_port().is_none());
    }

    #[test]
    fn test_missing_node_list() {
        let config = serde_json::json!({ "type": "custom" });
        assert!(CustomProviderFactory.create(config).is_err());
    }
}
