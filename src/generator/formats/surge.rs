use log::warn;

use super::select_nodes;
use crate::filter::NodeNameFilter;
use crate::models::{NodeConfig, NodeProtocol, VmessNetwork};

/// Convert a node to a line of Surge's `[Proxy]` section.
///
/// Shadowsocksr has no native Surge support and is only emitted as an
/// `external` proxy when the node carries a binary path and a local port.
pub fn node_to_surge(node: &NodeConfig) -> Option<String> {
    let name = &node.node_name;
    let surge_config = node.surge_config.clone().unwrap_or_default();

    match &node.protocol {
        NodeProtocol::Shadowsocks(ss) => {
            let mut line = format!(
                "{} = ss, {}, {}, encrypt-method={}, password={}",
                name, ss.hostname, ss.port, ss.method, ss.password
            );
            if let Some(obfs) = &ss.obfs {
                line.push_str(&format!(", obfs={}", obfs));
                if let Some(host) = &ss.obfs_host {
                    line.push_str(&format!(", obfs-host={}", host));
                }
            }
            line.push_str(&format!(", udp-relay={}", ss.udp_relay));
            if ss.tfo {
                line.push_str(", tfo=true");
            }
            Some(line)
        }
        NodeProtocol::Shadowsocksr(ssr) => {
            let (Some(bin_path), Some(local_port)) = (&node.bin_path, node.local_port) else {
                warn!("Skipping shadowsocksr node {} without binPath for Surge", name);
                return None;
            };
            let mut args: Vec<String> = vec![
                "-s".to_string(),
                ssr.hostname.clone(),
                "-p".to_string(),
                ssr.port.to_string(),
                "-m".to_string(),
                ssr.method.clone(),
                "-o".to_string(),
                ssr.obfs.clone(),
                "-O".to_string(),
                ssr.protocol.clone(),
                "-k".to_string(),
                ssr.password.clone(),
                "-l".to_string(),
                local_port.to_string(),
                "-b".to_string(),
                "127.0.0.1".to_string(),
            ];
            if !ssr.protoparam.is_empty() {
                args.extend(["-G".to_string(), ssr.protoparam.clone()]);
            }
            if !ssr.obfsparam.is_empty() {
                args.extend(["-g".to_string(), ssr.obfsparam.clone()]);
            }
            let args = args
                .iter()
                .map(|arg| format!("args = \"{}\"", arg))
                .collect::<Vec<_>>()
                .join(", ");
            let mut line = format!(
                "{} = external, exec = \"{}\", {}, local-port = {}",
                name, bin_path, args, local_port
            );
            if !surge_config.resolve_hostname {
                line.push_str(&format!(", addresses = {}", ssr.hostname));
            }
            Some(line)
        }
        NodeProtocol::Vmess(vmess) => {
            let mut line = format!(
                "{} = vmess, {}, {}, username={}",
                name, vmess.hostname, vmess.port, vmess.uuid
            );
            match vmess.network {
                VmessNetwork::Tcp => {}
                VmessNetwork::Ws => {
                    line.push_str(", ws=true");
                    if let Some(path) = &vmess.path {
                        line.push_str(&format!(", ws-path={}", path));
                    }
                    if let Some(host) = &vmess.host {
                        line.push_str(&format!(", ws-headers=Host:{}", host));
                    }
                }
                VmessNetwork::H2 | VmessNetwork::Grpc => {
                    warn!(
                        "Skipping vmess node {}: Surge has no {:?} transport",
                        name, vmess.network
                    );
                    return None;
                }
            }
            if vmess.tls {
                line.push_str(", tls=true");
                if let Some(sni) = &vmess.sni {
                    line.push_str(&format!(", sni={}", sni));
                }
                if vmess.skip_cert_verify {
                    line.push_str(", skip-cert-verify=true");
                }
            }
            if surge_config.vmess_aead && vmess.alter_id == 0 {
                line.push_str(", vmess-aead=true");
            }
            Some(line)
        }
        NodeProtocol::Trojan(trojan) => {
            let mut line = format!(
                "{} = trojan, {}, {}, password={}",
                name, trojan.hostname, trojan.port, trojan.password
            );
            if let Some(sni) = &trojan.sni {
                line.push_str(&format!(", sni={}", sni));
            }
            if trojan.skip_cert_verify {
                line.push_str(", skip-cert-verify=true");
            }
            Some(line)
        }
        NodeProtocol::Http(http) | NodeProtocol::Https(http) => {
            let scheme = if matches!(node.protocol, NodeProtocol::Https(_)) {
                "https"
            } else {
                "http"
            };
            let mut line = format!("{} = {}, {}, {}", name, scheme, http.hostname, http.port);
            if let (Some(username), Some(password)) = (&http.username, &http.password) {
                line.push_str(&format!(", {}, {}", username, password));
            }
            if scheme == "https" && http.skip_cert_verify {
                line.push_str(", skip-cert-verify=true");
            }
            Some(line)
        }
        NodeProtocol::Snell(snell) => {
            let mut line = format!(
                "{} = snell, {}, {}, psk={}",
                name, snell.hostname, snell.port, snell.psk
            );
            if let Some(obfs) = &snell.obfs {
                line.push_str(&format!(", obfs={}", obfs));
                if let Some(host) = &snell.obfs_host {
                    line.push_str(&format!(", obfs-host={}", host));
                }
            }
            if let Some(version) = snell.version {
                line.push_str(&format!(", version={}", version));
            }
            Some(line)
        }
    }
}

/// Surge proxy lines of the selected nodes, one per line.
pub fn get_surge_nodes(nodes: &[NodeConfig], filter: Option<&NodeNameFilter>) -> String {
    select_nodes(nodes, filter)
        .filter_map(node_to_surge)
        .collect::<Vec<_>>()
        .join("\n")
}
