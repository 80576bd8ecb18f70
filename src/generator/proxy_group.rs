//! Proxy group generation
//!
//! Expands a declarative proxy group modifier into the concrete Clash
//! `Proxy` / `Proxy Group` structure.

use serde::Serialize;

use super::formats::{get_clash_node_names, get_clash_nodes};
use crate::error::{Error, Result};
use crate::filter::FilterSet;
use crate::models::{NodeConfig, ProxyGroupConfig, ProxyGroupModifier, ProxyGroupType};

pub const DEFAULT_TEST_URL: &str = "http://www.gstatic.com/generate_204";
pub const DEFAULT_TEST_INTERVAL: u32 = 1200;

/// A concrete group as Clash expects it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClashProxyGroup {
    pub name: String,
    #[serde(rename = "type")]
    pub group_type: ProxyGroupType,
    pub proxies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClashProxyConfig {
    #[serde(rename = "Proxy")]
    pub proxy: Vec<serde_json::Value>,
    #[serde(rename = "Proxy Group")]
    pub proxy_group: Vec<ClashProxyGroup>,
}

/// Generates the members of one group.
///
/// Literal `proxies` come first, then the nodes accepted by `filter`. A rule
/// with neither takes every node.
pub fn group_generate(
    rule: &ProxyGroupConfig,
    nodes: &[NodeConfig],
    filters: &FilterSet,
) -> Result<Vec<String>> {
    match &rule.filter {
        Some(filter_name) => {
            let filter = filters.get(filter_name).ok_or_else(|| {
                Error::Configuration(format!(
                    "Proxy group {} uses unknown filter {}",
                    rule.name, filter_name
                ))
            })?;
            let mut proxies = rule.proxies.clone();
            proxies.extend(get_clash_node_names(nodes, Some(filter)));
            Ok(proxies)
        }
        None if !rule.proxies.is_empty() => Ok(rule.proxies.clone()),
        None => Ok(get_clash_node_names(nodes, None)),
    }
}

pub fn normalize_clash_proxy_group(
    nodes: &[NodeConfig],
    filters: &FilterSet,
    modifier: &ProxyGroupModifier,
) -> Result<ClashProxyConfig> {
    let proxy_group = modifier
        .iter()
        .map(|rule| {
            let proxies = group_generate(rule, nodes, filters)?;
            let tested = rule.group_type.is_tested();
            Ok(ClashProxyGroup {
                name: rule.name.clone(),
                group_type: rule.group_type,
                proxies,
                url: tested.then(|| {
                    rule.url
                        .clone()
                        .unwrap_or_else(|| DEFAULT_TEST_URL.to_string())
                }),
                interval: tested.then(|| rule.interval.unwrap_or(DEFAULT_TEST_INTERVAL)),
                tolerance: rule.tolerance.filter(|_| rule.group_type == ProxyGroupType::URLTest),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ClashProxyConfig {
        proxy: get_clash_nodes(nodes, None),
        proxy_group,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{NodeNameFilter, ResolvedFilters};
    use crate::models::{HttpNode, NodeProtocol};

    fn nodes() -> Vec<NodeConfig> {
        ["🇭🇰 HK 01", "🇺🇸 US 01", "🇭🇰 HK IPLC"]
            .iter()
            .map(|name| NodeConfig::new(*name, NodeProtocol::Http(HttpNode::default())))
            .collect()
    }

    #[test]
    fn test_normalize() {
        let mut resolved = ResolvedFilters::default();
        resolved
            .custom_filters
            .insert("iplc".to_string(), NodeNameFilter::keywords(["IPLC"], true));
        let filters = FilterSet::new(&resolved);
        let modifier = vec![
            ProxyGroupConfig::new("Proxy", ProxyGroupType::Select).with_proxies(["Auto", "DIRECT"]),
            ProxyGroupConfig::new("Auto", ProxyGroupType::URLTest),
            ProxyGroupConfig::new("HK", ProxyGroupType::Select)
                .with_filter("hkFilter")
                .with_proxies(["DIRECT"]),
            ProxyGroupConfig::new("IPLC", ProxyGroupType::Fallback).with_filter("iplc"),
        ];
        let config = normalize_clash_proxy_group(&nodes(), &filters, &modifier).unwrap();

        assert_eq!(config.proxy.len(), 3);
        let groups = &config.proxy_group;
        assert_eq!(groups[0].proxies, vec!["Auto", "DIRECT"]);
        assert!(groups[0].url.is_none());
        assert_eq!(groups[1].proxies.len(), 3);
        assert_eq!(groups[1].url.as_deref(), Some(DEFAULT_TEST_URL));
        assert_eq!(groups[1].interval, Some(DEFAULT_TEST_INTERVAL));
        assert_eq!(groups[2].proxies, vec!["DIRECT", "🇭🇰 HK 01", "🇭🇰 HK IPLC"]);
        assert_eq!(groups[3].proxies, vec!["🇭🇰 HK IPLC"]);

        let value = serde_json::to_value(&config).unwrap();
        assert!(value.get("Proxy").is_some());
        assert_eq!(value["Proxy Group"][1]["type"], "url-test");
    }

    #[test]
    fn test_unknown_filter() {
        let modifier = vec![ProxyGroupConfig::new("X", ProxyGroupType::Select).with_filter("nope")];
        let err = normalize_clash_proxy_group(&nodes(), &FilterSet::default(), &modifier)
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
