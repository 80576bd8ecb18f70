//! Node model definitions
//!
//! A node is a single proxy endpoint. Protocol specific fields live in
//! [`NodeProtocol`], a tagged union keyed by the `type` field, while the
//! fields shared by every protocol (and the ones stamped on during
//! aggregation) sit on [`NodeConfig`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Discriminant of a node's protocol.
///
/// This is the key used by the run-level `binPath` overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Shadowsocks,
    Shadowsocksr,
    Vmess,
    Trojan,
    Http,
    Https,
    Snell,
}

impl NodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Shadowsocks => "shadowsocks",
            NodeType::Shadowsocksr => "shadowsocksr",
            NodeType::Vmess => "vmess",
            NodeType::Trojan => "trojan",
            NodeType::Http => "http",
            NodeType::Https => "https",
            NodeType::Snell => "snell",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Surge specific switches stamped onto every node from the run configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SurgeConfig {
    /// Let Surge resolve hostnames itself instead of the external binary.
    pub resolve_hostname: bool,
    #[serde(rename = "vmessAEAD")]
    pub vmess_aead: bool,
}

fn default_enable() -> bool {
    true
}

/// A proxy node produced by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfig {
    pub node_name: String,
    #[serde(default = "default_enable")]
    pub enable: bool,

    /// Path to an external binary serving this node locally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin_path: Option<String>,
    /// Local port the external binary listens on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surge_config: Option<SurgeConfig>,

    #[serde(flatten)]
    pub protocol: NodeProtocol,
}

/// Protocol specific part of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeProtocol {
    Shadowsocks(ShadowsocksNode),
    Shadowsocksr(ShadowsocksrNode),
    Vmess(VmessNode),
    Trojan(TrojanNode),
    Http(HttpNode),
    Https(HttpNode),
    Snell(SnellNode),
}

impl NodeProtocol {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeProtocol::Shadowsocks(_) => NodeType::Shadowsocks,
            NodeProtocol::Shadowsocksr(_) => NodeType::Shadowsocksr,
            NodeProtocol::Vmess(_) => NodeType::Vmess,
            NodeProtocol::Trojan(_) => NodeType::Trojan,
            NodeProtocol::Http(_) => NodeType::Http,
            NodeProtocol::Https(_) => NodeType::Https,
            NodeProtocol::Snell(_) => NodeType::Snell,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadowsocksNode {
    pub hostname: String,
    pub port: u16,
    pub method: String,
    pub password: String,
    /// `tls` or `http`, simple-obfs style
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obfs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obfs_host: Option<String>,
    #[serde(default)]
    pub udp_relay: bool,
    #[serde(default)]
    pub tfo: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadowsocksrNode {
    pub hostname: String,
    pub port: u16,
    pub method: String,
    pub password: String,
    pub protocol: String,
    #[serde(default)]
    pub protoparam: String,
    pub obfs: String,
    #[serde(default)]
    pub obfsparam: String,
}

/// VMess transport network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VmessNetwork {
    #[default]
    Tcp,
    Ws,
    H2,
    Grpc,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmessNode {
    pub hostname: String,
    pub port: u16,
    pub uuid: String,
    #[serde(default)]
    pub alter_id: u16,
    #[serde(default = "default_vmess_method")]
    pub method: String,
    #[serde(default)]
    pub network: VmessNetwork,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default)]
    pub tls: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sni: Option<String>,
    #[serde(default)]
    pub skip_cert_verify: bool,
    #[serde(default)]
    pub udp_relay: bool,
}

fn default_vmess_method() -> String {
    "auto".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrojanNode {
    pub hostname: String,
    pub port: u16,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sni: Option<String>,
    #[serde(default)]
    pub skip_cert_verify: bool,
    #[serde(default)]
    pub udp_relay: bool,
}

/// Shared by the `http` and `https` variants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpNode {
    pub hostname: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub skip_cert_verify: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnellNode {
    pub hostname: String,
    pub port: u16,
    pub psk: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obfs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obfs_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u8>,
}

impl NodeConfig {
    pub fn new(node_name: impl Into<String>, protocol: NodeProtocol) -> Self {
        NodeConfig {
            node_name: node_name.into(),
            enable: true,
            bin_path: None,
            local_port: None,
            surge_config: None,
            protocol,
        }
    }

    pub fn node_type(&self) -> NodeType {
        self.protocol.node_type()
    }

    /// Summary used for the `names` list handed to templates.
    pub fn project(&self) -> SimpleNodeConfig {
        SimpleNodeConfig {
            node_type: self.node_type(),
            enable: self.enable,
            node_name: self.node_name.clone(),
        }
    }
}

/// Projection of a [`NodeConfig`] onto `{type, enable, nodeName}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleNodeConfig {
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub enable: bool,
    pub node_name: String,
}
