use super::select_nodes;
use crate::filter::NodeNameFilter;
use crate::models::{NodeConfig, NodeProtocol, VmessNetwork};

/// Convert a node to a Quantumult X `[server_local]` line.
pub fn node_to_quantumult_x(node: &NodeConfig) -> Option<String> {
    let mut parts: Vec<String> = match &node.protocol {
        NodeProtocol::Shadowsocks(ss) => {
            let mut parts = vec![
                format!("shadowsocks={}:{}", ss.hostname, ss.port),
                format!("method={}", ss.method),
                format!("password={}", ss.password),
            ];
            if let Some(obfs) = &ss.obfs {
                parts.push(format!("obfs={}", obfs));
                if let Some(host) = &ss.obfs_host {
                    parts.push(format!("obfs-host={}", host));
                }
            }
            if ss.udp_relay {
                parts.push("udp-relay=true".to_string());
            }
            if ss.tfo {
                parts.push("fast-open=true".to_string());
            }
            parts
        }
        NodeProtocol::Shadowsocksr(ssr) => {
            let mut parts = vec![
                format!("shadowsocks={}:{}", ssr.hostname, ssr.port),
                format!("method={}", ssr.method),
                format!("password={}", ssr.password),
                format!("ssr-protocol={}", ssr.protocol),
            ];
            if !ssr.protoparam.is_empty() {
                parts.push(format!("ssr-protocol-param={}", ssr.protoparam));
            }
            parts.push(format!("obfs={}", ssr.obfs));
            if !ssr.obfsparam.is_empty() {
                parts.push(format!("obfs-host={}", ssr.obfsparam));
            }
            parts
        }
        NodeProtocol::Vmess(vmess) => {
            let method = if vmess.method == "auto" {
                "chacha20-poly1305"
            } else {
                vmess.method.as_str()
            };
            let mut parts = vec![
                format!("vmess={}:{}", vmess.hostname, vmess.port),
                format!("method={}", method),
                format!("password={}", vmess.uuid),
            ];
            match (vmess.network, vmess.tls) {
                (VmessNetwork::Ws, tls) => {
                    parts.push(format!("obfs={}", if tls { "wss" } else { "ws" }));
                    if let Some(path) = &vmess.path {
                        parts.push(format!("obfs-uri={}", path));
                    }
                    if let Some(host) = vmess.host.as_ref().or(vmess.sni.as_ref()) {
                        parts.push(format!("obfs-host={}", host));
                    }
                }
                (VmessNetwork::Tcp, true) => {
                    parts.push("obfs=over-tls".to_string());
                    if let Some(host) = &vmess.sni {
                        parts.push(format!("obfs-host={}", host));
                    }
                }
                (VmessNetwork::Tcp, false) => {}
                (VmessNetwork::H2 | VmessNetwork::Grpc, _) => return None,
            }
            if vmess.tls && vmess.skip_cert_verify {
                parts.push("tls-verification=false".to_string());
            }
            if vmess.udp_relay {
                parts.push("udp-relay=true".to_string());
            }
            parts
        }
        NodeProtocol::Trojan(trojan) => {
            let mut parts = vec![
                format!("trojan={}:{}", trojan.hostname, trojan.port),
                format!("password={}", trojan.password),
                "over-tls=true".to_string(),
            ];
            if let Some(sni) = &trojan.sni {
                parts.push(format!("tls-host={}", sni));
            }
            parts.push(format!("tls-verification={}", !trojan.skip_cert_verify));
            if trojan.udp_relay {
                parts.push("udp-relay=true".to_string());
            }
            parts
        }
        NodeProtocol::Http(http) | NodeProtocol::Https(http) => {
            let mut parts = vec![format!("http={}:{}", http.hostname, http.port)];
            if let Some(username) = &http.username {
                parts.push(format!("username={}", username));
            }
            if let Some(password) = &http.password {
                parts.push(format!("password={}", password));
            }
            if matches!(node.protocol, NodeProtocol::Https(_)) {
                parts.push("over-tls=true".to_string());
                parts.push(format!("tls-verification={}", !http.skip_cert_verify));
            }
            parts
        }
        NodeProtocol::Snell(_) => return None,
    };
    parts.push(format!("tag={}", node.node_name));
    Some(parts.join(", "))
}

/// Quantumult X server lines of the selected nodes, one per line.
pub fn get_quantumult_x_nodes(nodes: &[NodeConfig], filter: Option<&NodeNameFilter>) -> String {
    select_nodes(nodes, filter)
        .filter_map(node_to_quantumult_x)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SnellNode, TrojanNode, VmessNode};

    #[test]
    fn test_trojan() {
        let node = NodeConfig::new(
            "SG",
            NodeProtocol::Trojan(TrojanNode {
                hostname: "sg.example.com".to_string(),
                port: 443,
                password: "pw".to_string(),
                sni: Some("sni.example.com".to_string()),
                ..Default::default()
            }),
        );
        assert_eq!(
            node_to_quantumult_x(&node).unwrap(),
            "trojan=sg.example.com:443, password=pw, over-tls=true, tls-host=sni.example.com, tls-verification=true, tag=SG"
        );
    }

    #[test]
    fn test_vmess_wss() {
        let node = NodeConfig::new(
            "JP",
            NodeProtocol::Vmess(VmessNode {
                hostname: "jp.example.com".to_string(),
                port: 443,
                uuid: "uuid".to_string(),
                method: "auto".to_string(),
                network: VmessNetwork::Ws,
                path: Some("/ray".to_string()),
                tls: true,
                sni: Some("cdn.example.com".to_string()),
                ..Default::default()
            }),
        );
        assert_eq!(
            node_to_quantumult_x(&node).unwrap(),
            "vmess=jp.example.com:443, method=chacha20-poly1305, password=uuid, obfs=wss, obfs-uri=/ray, obfs-host=cdn.example.com, tag=JP"
        );
    }

    #[test]
    fn test_snell_unsupported() {
        let nodes = vec![NodeConfig::new("S", NodeProtocol::Snell(SnellNode::default()))];
        assert!(node_to_quantumult_x(&nodes[0]).is_none());
        assert_eq!(get_quantumult_x_nodes(&nodes, None), "");
    }
}
