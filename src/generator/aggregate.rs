//! Node aggregation
//!
//! Drives the providers of one artifact strictly in order, decorates their
//! nodes and keeps the valid ones. The filters of the first provider govern
//! the whole artifact.

use std::collections::BTreeMap;

use log::{debug, info};

use crate::error::{Error, Result};
use crate::filter::{
    default_netflix_filter, default_youtube_premium_filter, prepend_flag, ResolvedFilters,
};
use crate::models::{NodeConfig, NodeType, SimpleNodeConfig, SurgeConfig};
use crate::provider::{LoadedProvider, ProviderLoader};

/// Run-level settings applied to every node.
#[derive(Debug, Clone, Copy)]
pub struct NodeDecoration<'a> {
    pub bin_path: &'a BTreeMap<NodeType, String>,
    pub surge_config: &'a SurgeConfig,
}

/// Aggregated nodes of one artifact.
///
/// `node_name_list[i]` is always the projection of `node_list[i]`.
#[derive(Debug, Clone)]
pub struct NodeAggregate {
    pub node_list: Vec<NodeConfig>,
    pub node_name_list: Vec<SimpleNodeConfig>,
    pub filters: ResolvedFilters,
}

/// Load every provider in `provider_names` and merge their nodes.
pub async fn get_node_list(
    loader: &ProviderLoader,
    provider_names: &[&str],
    decoration: NodeDecoration<'_>,
) -> Result<NodeAggregate> {
    let mut node_list = Vec::new();
    let mut node_name_list = Vec::new();
    let mut filters: Option<ResolvedFilters> = None;

    for name in provider_names {
        let loaded = loader.load(name).await?;
        let nodes = loaded
            .provider
            .get_node_list()
            .await
            .map_err(|e| Error::ProviderExecution {
                path: loaded.path.clone(),
                message: format!("{:#}", e),
            })?;
        debug!("Provider {} returned {} node(s)", loaded.name, nodes.len());

        // Later providers never replace filters fixed by the first one.
        filters.get_or_insert_with(|| resolve_filters(&loaded));

        let before = node_list.len();
        for node in decorate_nodes(&loaded, nodes, decoration) {
            node_name_list.push(node.project());
            node_list.push(node);
        }
        info!(
            "Provider {}: {} valid node(s)",
            loaded.name,
            node_list.len() - before
        );
    }

    Ok(NodeAggregate {
        node_list,
        node_name_list,
        filters: filters.unwrap_or_default(),
    })
}

fn resolve_filters(loaded: &LoadedProvider) -> ResolvedFilters {
    let provider = &loaded.provider;
    ResolvedFilters {
        netflix_filter: provider
            .netflix_filter()
            .unwrap_or_else(default_netflix_filter),
        youtube_premium_filter: provider
            .youtube_premium_filter()
            .unwrap_or_else(default_youtube_premium_filter),
        custom_filters: provider.custom_filters().unwrap_or_default(),
    }
}

/// Decorate `nodes` and return the valid ones, in order.
///
/// Validity is judged on the node as returned by the provider. Decoration
/// (binary path, local port, surge config, flag) happens for every node, so
/// invalid nodes still consume a local port.
fn decorate_nodes(
    loaded: &LoadedProvider,
    nodes: Vec<NodeConfig>,
    decoration: NodeDecoration<'_>,
) -> Vec<NodeConfig> {
    let provider = &loaded.provider;
    let node_filter = provider.node_filter();
    let add_flag = provider.add_flag();

    nodes
        .into_iter()
        .filter_map(|mut node| {
            let is_valid = node_filter.as_ref().map_or(true, |filter| filter(&node));

            if let Some(bin_path) = decoration.bin_path.get(&node.node_type()) {
                node.bin_path = Some(bin_path.clone());
                node.local_port = provider.next_port();
            }
            node.surge_config = Some(decoration.surge_config.clone());
            if add_flag {
                node.node_name = prepend_flag(&node.node_name);
            }

            is_valid.then_some(node)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::NodeNameFilter;
    use crate::models::{HttpNode, NodeProtocol, ShadowsocksrNode};
    use crate::provider::{NodeFilter, Provider};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU16, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct TestProvider {
        nodes: Vec<NodeConfig>,
        reject: Option<&'static str>,
        add_flag: bool,
        netflix: Option<NodeNameFilter>,
        ports: Option<AtomicU16>,
    }

    #[async_trait]
    impl Provider for TestProvider {
        async fn get_node_list(&self) -> anyhow::Result<Vec<NodeConfig>> {
            Ok(self.nodes.clone())
        }

        fn node_filter(&self) -> Option<NodeFilter> {
            self.reject.map(|word| {
                Arc::new(move |node: &NodeConfig| !node.node_name.contains(word)) as NodeFilter
            })
        }

        fn add_flag(&self) -> bool {
            self.add_flag
        }

        fn netflix_filter(&self) -> Option<NodeNameFilter> {
            self.netflix.clone()
        }

        fn custom_filters(&self) -> Option<HashMap<String, NodeNameFilter>> {
            None
        }

        fn next_port(&self) -> Option<u16> {
            self.ports.as_ref().map(|p| p.fetch_add(1, Ordering::Relaxed))
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl Provider for FailingProvider {
        async fn get_node_list(&self) -> anyhow::Result<Vec<NodeConfig>> {
            anyhow::bail!("subscription expired")
        }
    }

    fn http(name: &str) -> NodeConfig {
        NodeConfig::new(name, NodeProtocol::Http(HttpNode::default()))
    }

    fn ssr(name: &str) -> NodeConfig {
        NodeConfig::new(name, NodeProtocol::Shadowsocksr(ShadowsocksrNode::default()))
    }

    fn decoration<'a>(
        bin_path: &'a BTreeMap<NodeType, String>,
        surge_config: &'a SurgeConfig,
    ) -> NodeDecoration<'a> {
        NodeDecoration {
            bin_path,
            surge_config,
        }
    }

    #[tokio::test]
    async fn test_order_and_validity() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = ProviderLoader::new(dir.path());
        loader.register(
            "a",
            Arc::new(TestProvider {
                nodes: vec![http("A1"), http("A2 bad"), http("A3")],
                reject: Some("bad"),
                ..Default::default()
            }),
        );
        loader.register(
            "b",
            Arc::new(TestProvider {
                nodes: vec![http("B1")],
                ..Default::default()
            }),
        );
        let bin_path = BTreeMap::new();
        let surge = SurgeConfig::default();
        let aggregate = get_node_list(&loader, &["a", "b"], decoration(&bin_path, &surge))
            .await
            .unwrap();

        let names: Vec<_> = aggregate.node_list.iter().map(|n| n.node_name.as_str()).collect();
        assert_eq!(names, vec!["A1", "A3", "B1"]);
        assert_eq!(aggregate.node_list.len(), aggregate.node_name_list.len());
        for (node, simple) in aggregate.node_list.iter().zip(&aggregate.node_name_list) {
            assert_eq!(&node.project(), simple);
            assert_eq!(node.surge_config, Some(SurgeConfig::default()));
        }
    }

    #[tokio::test]
    async fn test_first_provider_filters_win() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = ProviderLoader::new(dir.path());
        loader.register(
            "a",
            Arc::new(TestProvider {
                netflix: Some(NodeNameFilter::keywords(["from-a"], true)),
                ..Default::default()
            }),
        );
        loader.register(
            "b",
            Arc::new(TestProvider {
                netflix: Some(NodeNameFilter::keywords(["from-b"], true)),
                ..Default::default()
            }),
        );
        let bin_path = BTreeMap::new();
        let surge = SurgeConfig::default();
        let aggregate = get_node_list(&loader, &["a", "b"], decoration(&bin_path, &surge))
            .await
            .unwrap();
        assert!(aggregate.filters.netflix_filter.matches("from-a"));
        assert!(!aggregate.filters.netflix_filter.matches("from-b"));
    }

    #[tokio::test]
    async fn test_first_provider_without_filter_locks_default() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = ProviderLoader::new(dir.path());
        loader.register("a", Arc::new(TestProvider::default()));
        loader.register(
            "b",
            Arc::new(TestProvider {
                netflix: Some(NodeNameFilter::keywords(["from-b"], true)),
                ..Default::default()
            }),
        );
        let bin_path = BTreeMap::new();
        let surge = SurgeConfig::default();
        let aggregate = get_node_list(&loader, &["a", "b"], decoration(&bin_path, &surge))
            .await
            .unwrap();
        assert!(!aggregate.filters.netflix_filter.matches("from-b"));
        assert!(aggregate.filters.netflix_filter.matches("HK Netflix"));
    }

    #[tokio::test]
    async fn test_bin_path_and_flag() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = ProviderLoader::new(dir.path());
        loader.register(
            "a",
            Arc::new(TestProvider {
                nodes: vec![ssr("HK bad"), ssr("HK 01"), http("US 01")],
                reject: Some("bad"),
                add_flag: true,
                ports: Some(AtomicU16::new(61000)),
                ..Default::default()
            }),
        );
        let mut bin_path = BTreeMap::new();
        bin_path.insert(NodeType::Shadowsocksr, "/usr/bin/ssr-local".to_string());
        let surge = SurgeConfig::default();
        let aggregate = get_node_list(&loader, &["a"], decoration(&bin_path, &surge))
            .await
            .unwrap();

        assert_eq!(aggregate.node_list.len(), 2);
        let hk = &aggregate.node_list[0];
        assert_eq!(hk.node_name, "🇭🇰 HK 01");
        assert_eq!(hk.bin_path.as_deref(), Some("/usr/bin/ssr-local"));
        // the invalid node consumed 61000
        assert_eq!(hk.local_port, Some(61001));

        let us = &aggregate.node_list[1];
        assert_eq!(us.node_name, "🇺🇸 US 01");
        assert!(us.bin_path.is_none());
        assert!(us.local_port.is_none());
        assert_eq!(aggregate.node_name_list[1].node_name, "🇺🇸 US 01");
    }

    #[tokio::test]
    async fn test_provider_failure_embeds_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = ProviderLoader::new(dir.path());
        loader.register("broken", Arc::new(FailingProvider));
        let bin_path = BTreeMap::new();
        let surge = SurgeConfig::default();
        let err = get_node_list(&loader, &["broken"], decoration(&bin_path, &surge))
            .await
            .unwrap_err();
        match err {
            Error::ProviderExecution { path, message } => {
                assert_eq!(path, std::path::PathBuf::from("<registered:broken>"));
                assert_eq!(message, "subscription expired");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
