//! Provider reading the `proxies` of a Clash configuration.
//!
//! The configuration is fetched from `url`, or read from disk when `url` is
//! not an http(s) link. Proxies of unsupported types are skipped.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;

use super::{NodeFilter, Provider, ProviderCapabilities, ProviderFactory, ProviderFileConfig};
use crate::filter::NodeNameFilter;
use crate::models::{
    HttpNode, NodeConfig, NodeProtocol, ShadowsocksNode, ShadowsocksrNode, SnellNode, TrojanNode,
    VmessNetwork, VmessNode,
};
use crate::utils::http::{is_link, web_get_async};

/// Ports are written either as numbers or as strings in the wild.
fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    struct PortVisitor;

    impl<'de> Visitor<'de> for PortVisitor {
        type Value = u16;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a port as number or string")
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u16::try_from(value).map_err(|_| E::custom(format!("port out of range: {}", value)))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u16::try_from(value).map_err(|_| E::custom(format!("port out of range: {}", value)))
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            value
                .trim()
                .parse::<u16>()
                .map_err(|_| E::custom(format!("invalid port: {}", value)))
        }
    }

    deserializer.deserialize_any(PortVisitor)
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PluginOpts {
    mode: Option<String>,
    host: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WsOpts {
    path: Option<String>,
    #[serde(default)]
    headers: HashMap<String, String>,
}

/// A single entry of a Clash `proxies` list.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum ClashProxy {
    #[serde(rename = "ss", rename_all = "kebab-case")]
    Shadowsocks {
        name: String,
        server: String,
        #[serde(deserialize_with = "deserialize_port")]
        port: u16,
        cipher: String,
        password: String,
        #[serde(default)]
        udp: bool,
        plugin: Option<String>,
        plugin_opts: Option<PluginOpts>,
    },
    #[serde(rename = "ssr", rename_all = "kebab-case")]
    ShadowsocksR {
        name: String,
        server: String,
        #[serde(deserialize_with = "deserialize_port")]
        port: u16,
        cipher: String,
        password: String,
        protocol: String,
        #[serde(default, alias = "protocolparam")]
        protocol_param: String,
        obfs: String,
        #[serde(default, alias = "obfsparam")]
        obfs_param: String,
    },
    #[serde(rename = "vmess", rename_all = "kebab-case")]
    Vmess {
        name: String,
        server: String,
        #[serde(deserialize_with = "deserialize_port")]
        port: u16,
        uuid: String,
        #[serde(default, rename = "alterId")]
        alter_id: u16,
        cipher: Option<String>,
        #[serde(default)]
        udp: bool,
        #[serde(default)]
        tls: bool,
        servername: Option<String>,
        #[serde(default)]
        skip_cert_verify: bool,
        network: Option<String>,
        ws_path: Option<String>,
        #[serde(default)]
        ws_headers: HashMap<String, String>,
        ws_opts: Option<WsOpts>,
    },
    #[serde(rename = "trojan", rename_all = "kebab-case")]
    Trojan {
        name: String,
        server: String,
        #[serde(deserialize_with = "deserialize_port")]
        port: u16,
        password: String,
        sni: Option<String>,
        #[serde(default)]
        udp: bool,
        #[serde(default)]
        skip_cert_verify: bool,
    },
    #[serde(rename = "http", rename_all = "kebab-case")]
    Http {
        name: String,
        server: String,
        #[serde(deserialize_with = "deserialize_port")]
        port: u16,
        username: Option<String>,
        password: Option<String>,
        #[serde(default)]
        tls: bool,
        #[serde(default)]
        skip_cert_verify: bool,
    },
    #[serde(rename = "snell", rename_all = "kebab-case")]
    Snell {
        name: String,
        server: String,
        #[serde(deserialize_with = "deserialize_port")]
        port: u16,
        psk: String,
        version: Option<u8>,
        obfs_opts: Option<PluginOpts>,
    },
    #[serde(other)]
    Unsupported,
}

impl ClashProxy {
    fn into_node(self) -> Option<NodeConfig> {
        let (name, protocol) = match self {
            ClashProxy::Shadowsocks {
                name,
                server,
                port,
                cipher,
                password,
                udp,
                plugin,
                plugin_opts,
            } => {
                let (obfs, obfs_host) = match (plugin.as_deref(), plugin_opts) {
                    (Some("obfs"), Some(opts)) => (opts.mode, opts.host),
                    (Some(other), _) => {
                        warn!("Skipping shadowsocks node {} with plugin {}", name, other);
                        return None;
                    }
                    _ => (None, None),
                };
                let node = ShadowsocksNode {
                    hostname: server,
                    port,
                    method: cipher,
                    password,
                    obfs,
                    obfs_host,
                    udp_relay: udp,
                    tfo: false,
                };
                (name, NodeProtocol::Shadowsocks(node))
            }
            ClashProxy::ShadowsocksR {
                name,
                server,
                port,
                cipher,
                password,
                protocol,
                protocol_param,
                obfs,
                obfs_param,
            } => {
                let node = ShadowsocksrNode {
                    hostname: server,
                    port,
                    method: cipher,
                    password,
                    protocol,
                    protoparam: protocol_param,
                    obfs,
                    obfsparam: obfs_param,
                };
                (name, NodeProtocol::Shadowsocksr(node))
            }
            ClashProxy::Vmess {
                name,
                server,
                port,
                uuid,
                alter_id,
                cipher,
                udp,
                tls,
                servername,
                skip_cert_verify,
                network,
                ws_path,
                ws_headers,
                ws_opts,
            } => {
                let network = match network.as_deref() {
                    None | Some("tcp") => VmessNetwork::Tcp,
                    Some("ws") => VmessNetwork::Ws,
                    Some("h2") => VmessNetwork::H2,
                    Some("grpc") => VmessNetwork::Grpc,
                    Some(other) => {
                        warn!("Skipping vmess node {} with network {}", name, other);
                        return None;
                    }
                };
                let (path, headers) = match ws_opts {
                    Some(opts) => (opts.path, opts.headers),
                    None => (ws_path, ws_headers),
                };
                let host = headers
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case("host"))
                    .map(|(_, value)| value.clone());
                let node = VmessNode {
                    hostname: server,
                    port,
                    uuid,
                    alter_id,
                    method: cipher.unwrap_or_else(|| "auto".to_string()),
                    network,
                    path,
                    host,
                    tls,
                    sni: servername,
                    skip_cert_verify,
                    udp_relay: udp,
                };
                (name, NodeProtocol::Vmess(node))
            }
            ClashProxy::Trojan {
                name,
                server,
                port,
                password,
                sni,
                udp,
                skip_cert_verify,
            } => {
                let node = TrojanNode {
                    hostname: server,
                    port,
                    password,
                    sni,
                    skip_cert_verify,
                    udp_relay: udp,
                };
                (name, NodeProtocol::Trojan(node))
            }
            ClashProxy::Http {
                name,
                server,
                port,
                username,
                password,
                tls,
                skip_cert_verify,
            } => {
                let node = HttpNode {
                    hostname: server,
                    port,
                    username,
                    password,
                    skip_cert_verify,
                };
                if tls {
                    (name, NodeProtocol::Https(node))
                } else {
                    (name, NodeProtocol::Http(node))
                }
            }
            ClashProxy::Snell {
                name,
                server,
                port,
                psk,
                version,
                obfs_opts,
            } => {
                let (obfs, obfs_host) =
                    obfs_opts.map_or((None, None), |opts| (opts.mode, opts.host));
                let node = SnellNode {
                    hostname: server,
                    port,
                    psk,
                    obfs,
                    obfs_host,
                    version,
                };
                (name, NodeProtocol::Snell(node))
            }
            ClashProxy::Unsupported => return None,
        };
        Some(NodeConfig::new(name, protocol))
    }
}

#[derive(Debug, Default, Deserialize)]
struct ClashSubscription {
    #[serde(default, alias = "Proxy")]
    proxies: Vec<serde_yaml::Value>,
}

/// Converts the `proxies` of a Clash configuration into nodes.
pub fn parse_clash_config(content: &str) -> anyhow::Result<Vec<NodeConfig>> {
    let subscription: ClashSubscription = serde_yaml::from_str(content)?;
    let mut nodes = Vec::with_capacity(subscription.proxies.len());
    for entry in subscription.proxies {
        match serde_yaml::from_value::<ClashProxy>(entry) {
            Ok(proxy) => {
                if let Some(node) = proxy.into_node() {
                    nodes.push(node);
                }
            }
            Err(e) => warn!("Skipping malformed clash proxy: {}", e),
        }
    }
    Ok(nodes)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClashProviderConfig {
    #[serde(flatten)]
    common: ProviderFileConfig,
    url: String,
}

#[derive(Debug)]
pub struct ClashProvider {
    url: String,
    capabilities: ProviderCapabilities,
}

impl ClashProvider {
    pub fn from_value(config: serde_json::Value) -> anyhow::Result<Self> {
        let config: ClashProviderConfig = serde_json::from_value(config)?;
        if config.url.trim().is_empty() {
            anyhow::bail!("clash provider requires a non-empty url");
        }
        Ok(ClashProvider {
            capabilities: ProviderCapabilities::from_config(&config.common)?,
            url: config.url,
        })
    }
}

#[async_trait]
impl Provider for ClashProvider {
    async fn get_node_list(&self) -> anyhow::Result<Vec<NodeConfig>> {
        let content = if is_link(&self.url) {
            debug!("Fetching clash subscription {}", self.url);
            web_get_async(&self.url, None)
                .await
                .map_err(|e| anyhow::anyhow!("{}: {}", self.url, e))?
        } else {
            tokio::fs::read_to_string(&self.url)
                .await
                .map_err(|e| anyhow::anyhow!("{}: {}", self.url, e))?
        };
        parse_clash_config(&content)
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

pub struct ClashProviderFactory;

impl ProviderFactory for ClashProviderFactory {
    fn provider_type(&self) -> &'static str {
        "clash"
    }

    fn create(&self, config: serde_json::Value) -> anyhow::Result<Arc<dyn Provider>> {
        Ok(Arc::new(ClashProvider::from_value(config)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NodeType;

    #[test]
    fn test_parse_clash_config() {
        let yaml = r#"
proxies:
  - type: ss
    name: "HK 01"
    server: hk.example.com
    port: 8388
    cipher: aes-256-gcm
    password: password
    udp: true
    plugin: obfs
    plugin-opts:
      mode: tls
      host: bing.com
  - type: vmess
    name: "JP 01"
    server: jp.example.com
    port: "443"
    uuid: b831381d-6324-4d53-ad4f-8cda48b30811
    alterId: 0
    network: ws
    ws-opts:
      path: /ray
      headers:
        Host: cdn.example.com
    tls: true
    servername: cdn.example.com
  - type: http
    name: "US 01"
    server: us.example.com
    port: 443
    tls: true
  - type: hysteria2
    name: "Unsupported"
    server: example.com
    port: 443
  - type: trojan
    name: "Broken"
"#;
        let nodes = parse_clash_config(yaml).unwrap();
        assert_eq!(nodes.len(), 3);

        match &nodes[0].protocol {
            NodeProtocol::Shadowsocks(ss) => {
                assert_eq!(ss.obfs.as_deref(), Some("tls"));
                assert_eq!(ss.obfs_host.as_deref(), Some("bing.com"));
                assert!(ss.udp_relay);
            }
            other => panic!("unexpected protocol {:?}", other),
        }
        match &nodes[1].protocol {
            NodeProtocol::Vmess(vmess) => {
                assert_eq!(vmess.port, 443);
                assert_eq!(vmess.network, VmessNetwork::Ws);
                assert_eq!(vmess.path.as_deref(), Some("/ray"));
                assert_eq!(vmess.host.as_deref(), Some("cdn.example.com"));
                assert_eq!(vmess.sni.as_deref(), Some("cdn.example.com"));
            }
            other => panic!("unexpected protocol {:?}", other),
        }
        assert_eq!(nodes[2].node_type(), NodeType::Https);
    }

    #[tokio::test]
    async fn test_clash_provider_reads_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub.yaml");
        std::fs::write(
            &path,
            "proxies:\n  - {type: trojan, name: SG 01, server: sg.example.com, port: 443, password: pw}\n",
        )
        .unwrap();
        let provider = ClashProviderFactory
            .create(serde_json::json!({ "type": "clash", "url": path.to_str().unwrap() }))
            .unwrap();
        let nodes = provider.get_node_list().await.unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].node_name, "SG 01");
    }

    #[test]
    fn test_clash_provider_requires_url() {
        let result = ClashProviderFactory.create(serde_json::json!({ "type": "clash", "url": "" }));
        assert!(result.is_err());
    }
}
