use super::select_nodes;
use crate::filter::NodeNameFilter;
use crate::models::{NodeConfig, NodeProtocol};
use crate::utils::base64::url_safe_base64_encode;

/// SIP002 `ss://` links of the selected shadowsocks nodes, one per line.
///
/// `group` is appended as the `group` query parameter when given.
pub fn get_shadowsocks_nodes(
    nodes: &[NodeConfig],
    filter: Option<&NodeNameFilter>,
    group: Option<&str>,
) -> String {
    select_nodes(nodes, filter)
        .filter_map(|node| match &node.protocol {
            NodeProtocol::Shadowsocks(ss) => {
                let user_info = url_safe_base64_encode(&format!("{}:{}", ss.method, ss.password));
                let mut query = Vec::new();
                if let Some(obfs) = &ss.obfs {
                    let mut plugin = format!("obfs-local;obfs={}", obfs);
                    if let Some(host) = &ss.obfs_host {
                        plugin.push_str(&format!(";obfs-host={}", host));
                    }
                    query.push(format!("plugin={}", urlencoding::encode(&plugin)));
                }
                if let Some(group) = group {
                    query.push(format!("group={}", url_safe_base64_encode(group)));
                }
                let query = if query.is_empty() {
                    String::new()
                } else {
                    format!("/?{}", query.join("&"))
                };
                Some(format!(
                    "ss://{}@{}:{}{}#{}",
                    user_info,
                    ss.hostname,
                    ss.port,
                    query,
                    urlencoding::encode(&node.node_name)
                ))
            }
            NodeProtocol::Shadowsocksr(_)
            | NodeProtocol::Vmess(_)
            | NodeProtocol::Trojan(_)
            | NodeProtocol::Http(_)
            | NodeProtocol::Https(_)
            | NodeProtocol::Snell(_) => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}
