//! Core data models for the application
//!
//! This module contains the primary data structures used throughout the
//! application, separated from the logic that operates on them.
//!
//! # Usage
//!
//! ```rust
//! use subgen::models::{NodeConfig, NodeProtocol, ShadowsocksNode};
//!
//! let node = NodeConfig::new(
//!     "HK 01",
//!     NodeProtocol::Shadowsocks(ShadowsocksNode {
//!         hostname: "hk.example.com".to_string(),
//!         port: 8388,
//!         method: "aes-256-gcm".to_string(),
//!         password: "password".to_string(),
//!         ..Default::default()
//!     }),
//! );
//! assert_eq!(node.project().node_name, "HK 01");
//! ```

pub mod artifact;
pub mod command;
pub mod node;
pub mod proxy_group_config;
pub mod remote_snippet;

pub use artifact::ArtifactConfig;
pub use command::{CommandConfig, ConfigFormat, GatewayConfig};
pub use node::*;
pub use proxy_group_config::{ProxyGroupConfig, ProxyGroupModifier, ProxyGroupType};
pub use remote_snippet::{index_snippets, RemoteSnippet, RemoteSnippetConfig};
