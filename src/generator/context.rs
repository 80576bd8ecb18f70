//! Rendering context
//!
//! [`ArtifactContext`] is the complete set of values a template can see.
//! Data fields are serialized into the template context; filters and the
//! download url builder are capabilities the renderer exposes through the
//! helper functions.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;
use url::form_urlencoded;

use super::aggregate::NodeAggregate;
use super::proxy_group::{normalize_clash_proxy_group, ClashProxyConfig};
use crate::error::Result;
use crate::filter::{region_filters, FilterSet, NETFLIX_FILTER, YOUTUBE_PREMIUM_FILTER};
use crate::models::{
    index_snippets, ArtifactConfig, CommandConfig, NodeConfig, RemoteSnippet, SimpleNodeConfig,
};

/// Builds download urls of generated artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadUrl {
    pub url_base: String,
    pub access_token: Option<String>,
}

impl DownloadUrl {
    pub fn from_config(config: &CommandConfig) -> Self {
        DownloadUrl {
            url_base: config.url_base.clone(),
            access_token: config.gateway.access_token.clone(),
        }
    }

    /// Url of the artifact called `artifact_name`.
    ///
    /// The encoded name is appended to the path of `url_base`, with a `/`
    /// inserted when the path lacks one. A query on `url_base` is kept and
    /// the gateway's access token, if any, is added to it.
    pub fn get(&self, artifact_name: &str) -> String {
        let (path, query) = match self.url_base.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (self.url_base.as_str(), None),
        };

        let mut url = path.to_string();
        if !url.is_empty() && !url.ends_with('/') {
            url.push('/');
        }
        url.push_str(&urlencoding::encode(artifact_name));

        let mut query = query.unwrap_or_default().to_string();
        if let Some(token) = &self.access_token {
            form_urlencoded::Serializer::for_suffix(&mut query, 0)
                .append_pair("access_token", token);
        }
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        url
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactContext {
    pub artifact_name: String,
    pub url_base: String,
    pub download_url: String,
    pub nodes: Vec<NodeConfig>,
    pub node_list: Vec<NodeConfig>,
    pub names: Vec<SimpleNodeConfig>,
    pub remote_snippets: HashMap<String, Arc<str>>,
    pub custom_params: HashMap<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clash_proxy_config: Option<ClashProxyConfig>,
    /// Custom filter names, each bound to itself
    pub custom_filters: BTreeMap<String, String>,
    /// Region and service filter names, each bound to itself
    #[serde(flatten)]
    pub builtin_filters: BTreeMap<String, String>,

    #[serde(skip)]
    pub filters: FilterSet,
    #[serde(skip)]
    pub download: DownloadUrl,
}

impl ArtifactContext {
    /// Assemble the context of `artifact` from its aggregated nodes.
    pub fn build(
        artifact: &ArtifactConfig,
        config: &CommandConfig,
        aggregate: NodeAggregate,
        remote_snippets: &[RemoteSnippet],
    ) -> Result<Self> {
        let NodeAggregate {
            node_list,
            node_name_list,
            filters: resolved,
        } = aggregate;
        let filters = FilterSet::new(&resolved);

        let clash_proxy_config = match &artifact.proxy_group_modifier {
            Some(modifier) => Some(normalize_clash_proxy_group(&node_list, &filters, modifier)?),
            None => None,
        };

        let builtin_filters = region_filters()
            .into_iter()
            .map(|(name, _)| name)
            .chain([NETFLIX_FILTER, YOUTUBE_PREMIUM_FILTER])
            .map(|name| (name.to_string(), name.to_string()))
            .collect();
        let custom_filters = resolved
            .custom_filters
            .keys()
            .map(|name| (name.clone(), name.clone()))
            .collect();

        let download = DownloadUrl::from_config(config);
        Ok(ArtifactContext {
            artifact_name: artifact.name.clone(),
            url_base: config.url_base.clone(),
            download_url: download.get(&artifact.name),
            nodes: node_list.clone(),
            node_list,
            names: node_name_list,
            remote_snippets: index_snippets(remote_snippets),
            custom_params: config.custom_params_for(artifact),
            clash_proxy_config,
            custom_filters,
            builtin_filters,
            filters,
            download,
        })
    }
}
