//! Node providers
//!
//! A provider is a pluggable source of nodes. Providers are either registered
//! directly on a [`ProviderLoader`] or described by a file in the provider
//! directory whose `type` selects one of the built-in implementations.

pub mod clash;
pub mod custom;
pub mod loader;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use serde::Deserialize;

use crate::filter::{FilterSpec, NodeNameFilter};
use crate::models::NodeConfig;

pub use loader::{LoadedProvider, ProviderFactory, ProviderLoader};

/// Validity predicate over a whole node.
pub type NodeFilter = std::sync::Arc<dyn Fn(&NodeConfig) -> bool + Send + Sync>;

/// Capabilities a provider exposes to the aggregator.
///
/// Only [`Provider::get_node_list`] is required, every other capability has
/// a neutral default.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn get_node_list(&self) -> anyhow::Result<Vec<NodeConfig>>;

    /// Nodes rejected by this filter are dropped from the artifact.
    fn node_filter(&self) -> Option<NodeFilter> {
        None
    }

    /// Prefix node names with a region flag.
    fn add_flag(&self) -> bool {
        false
    }

    fn netflix_filter(&self) -> Option<NodeNameFilter> {
        None
    }

    fn youtube_premium_filter(&self) -> Option<NodeNameFilter> {
        None
    }

    fn custom_filters(&self) -> Option<HashMap<String, NodeNameFilter>> {
        None
    }

    /// Hands out local ports for nodes served by external binaries.
    fn next_port(&self) -> Option<u16> {
        None
    }
}

/// Fields shared by every provider file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderFileConfig {
    #[serde(rename = "type")]
    pub provider_type: String,
    #[serde(default)]
    pub add_flag: bool,
    pub start_port: Option<u16>,
    pub node_filter: Option<FilterSpec>,
    pub netflix_filter: Option<FilterSpec>,
    pub youtube_premium_filter: Option<FilterSpec>,
    #[serde(default)]
    pub custom_filters: HashMap<String, FilterSpec>,
}

/// Capabilities built from a [`ProviderFileConfig`], shared by the built-in
/// provider types.
#[derive(Debug)]
pub struct ProviderCapabilities {
    add_flag: bool,
    node_filter: Option<NodeNameFilter>,
    netflix_filter: Option<NodeNameFilter>,
    youtube_premium_filter: Option<NodeNameFilter>,
    custom_filters: Option<HashMap<String, NodeNameFilter>>,
    next_port: Option<AtomicU32>,
}

impl ProviderCapabilities {
    pub fn from_config(config: &ProviderFileConfig) -> anyhow::Result<Self> {
        let build = |spec: &Option<FilterSpec>| -> anyhow::Result<Option<NodeNameFilter>> {
            Ok(match spec {
                Some(spec) => Some(spec.build()?),
                None => None,
            })
        };
        let custom_filters = if config.custom_filters.is_empty() {
            None
        } else {
            let mut filters = HashMap::new();
            for (name, spec) in &config.custom_filters {
                let filter = spec
                    .build()
                    .map_err(|e| anyhow::anyhow!("Invalid custom filter {}: {}", name, e))?;
                filters.insert(name.clone(), filter);
            }
            Some(filters)
        };
        Ok(ProviderCapabilities {
            add_flag: config.add_flag,
            node_filter: build(&config.node_filter)?,
            netflix_filter: build(&config.netflix_filter)?,
            youtube_premium_filter: build(&config.youtube_premium_filter)?,
            custom_filters,
            next_port: config.start_port.map(|port| AtomicU32::new(port as u32)),
        })
    }

    pub fn node_filter(&self) -> Option<NodeFilter> {
        self.node_filter.clone().map(|filter| {
            std::sync::Arc::new(move |node: &NodeConfig| filter.matches(&node.node_name))
                as NodeFilter
        })
    }

    pub fn add_flag(&self) -> bool {
        self.add_flag
    }

    pub fn netflix_filter(&self) -> Option<NodeNameFilter> {
        self.netflix_filter.clone()
    }

    pub fn youtube_premium_filter(&self) -> Option<NodeNameFilter> {
        self.youtube_premium_filter.clone()
    }

    pub fn custom_filters(&self) -> Option<HashMap<String, NodeNameFilter>> {
        self.custom_filters.clone()
    }

    /// Current port, then advances the counter. `None` once ports run out.
    pub fn next_port(&self) -> Option<u16> {
        let counter = self.next_port.as_ref()?;
        u16::try_from(counter.fetch_add(1, Ordering::Relaxed)).ok()
    }
}
