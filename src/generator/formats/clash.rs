use serde_json::{json, Map, Value};

use super::select_nodes;
use crate::filter::NodeNameFilter;
use crate::models::{NodeConfig, NodeProtocol, VmessNetwork};

fn insert_opt<T: Into<Value>>(map: &mut Map<String, Value>, key: &str, value: Option<T>) {
    if let Some(value) = value {
        map.insert(key.to_string(), value.into());
    }
}

/// Convert a node to an entry of Clash's `proxies` list.
pub fn node_to_clash(node: &NodeConfig) -> Value {
    let name = node.node_name.as_str();
    match &node.protocol {
        NodeProtocol::Shadowsocks(ss) => {
            let mut proxy = json!({
                "type": "ss",
                "name": name,
                "server": ss.hostname,
                "port": ss.port,
                "cipher": ss.method,
                "password": ss.password,
                "udp": ss.udp_relay,
            });
            if let (Some(obfs), Value::Object(map)) = (&ss.obfs, &mut proxy) {
                map.insert("plugin".to_string(), json!("obfs"));
                let mut opts = Map::new();
                opts.insert("mode".to_string(), json!(obfs));
                insert_opt(&mut opts, "host", ss.obfs_host.clone());
                map.insert("plugin-opts".to_string(), Value::Object(opts));
            }
            proxy
        }
        NodeProtocol::Shadowsocksr(ssr) => json!({
            "type": "ssr",
            "name": name,
            "server": ssr.hostname,
            "port": ssr.port,
            "cipher": ssr.method,
            "password": ssr.password,
            "protocol": ssr.protocol,
            "protocol-param": ssr.protoparam,
            "obfs": ssr.obfs,
            "obfs-param": ssr.obfsparam,
        }),
        NodeProtocol::Vmess(vmess) => {
            let network = match vmess.network {
                VmessNetwork::Tcp => None,
                VmessNetwork::Ws => Some("ws"),
                VmessNetwork::H2 => Some("h2"),
                VmessNetwork::Grpc => Some("grpc"),
            };
            let mut map = Map::new();
            map.insert("type".to_string(), json!("vmess"));
            map.insert("name".to_string(), json!(name));
            map.insert("server".to_string(), json!(vmess.hostname));
            map.insert("port".to_string(), json!(vmess.port));
            map.insert("uuid".to_string(), json!(vmess.uuid));
            map.insert("alterId".to_string(), json!(vmess.alter_id));
            map.insert("cipher".to_string(), json!(vmess.method));
            map.insert("udp".to_string(), json!(vmess.udp_relay));
            insert_opt(&mut map, "network", network);
            if vmess.network == VmessNetwork::Ws {
                let mut opts = Map::new();
                insert_opt(&mut opts, "path", vmess.path.clone());
                if let Some(host) = &vmess.host {
                    opts.insert("headers".to_string(), json!({ "Host": host }));
                }
                map.insert("ws-opts".to_string(), Value::Object(opts));
            }
            if vmess.tls {
                map.insert("tls".to_string(), json!(true));
                insert_opt(&mut map, "servername", vmess.sni.clone());
                map.insert("skip-cert-verify".to_string(), json!(vmess.skip_cert_verify));
            }
            Value::Object(map)
        }
        NodeProtocol::Trojan(trojan) => {
            let mut map = Map::new();
            map.insert("type".to_string(), json!("trojan"));
            map.insert("name".to_string(), json!(name));
            map.insert("server".to_string(), json!(trojan.hostname));
            map.insert("port".to_string(), json!(trojan.port));
            map.insert("password".to_string(), json!(trojan.password));
            insert_opt(&mut map, "sni", trojan.sni.clone());
            map.insert("udp".to_string(), json!(trojan.udp_relay));
            map.insert("skip-cert-verify".to_string(), json!(trojan.skip_cert_verify));
            Value::Object(map)
        }
        NodeProtocol::Http(http) | NodeProtocol::Https(http) => {
            let mut map = Map::new();
            map.insert("type".to_string(), json!("http"));
            map.insert("name".to_string(), json!(name));
            map.insert("server".to_string(), json!(http.hostname));
            map.insert("port".to_string(), json!(http.port));
            insert_opt(&mut map, "username", http.username.clone());
            insert_opt(&mut map, "password", http.password.clone());
            if matches!(node.protocol, NodeProtocol::Https(_)) {
                map.insert("tls".to_string(), json!(true));
                map.insert("skip-cert-verify".to_string(), json!(http.skip_cert_verify));
            }
            Value::Object(map)
        }
        NodeProtocol::Snell(snell) => {
            let mut map = Map::new();
            map.insert("type".to_string(), json!("snell"));
            map.insert("name".to_string(), json!(name));
            map.insert("server".to_string(), json!(snell.hostname));
            map.insert("port".to_string(), json!(snell.port));
            map.insert("psk".to_string(), json!(snell.psk));
            insert_opt(&mut map, "version", snell.version);
            if let Some(obfs) = &snell.obfs {
                let mut opts = Map::new();
                opts.insert("mode".to_string(), json!(obfs));
                insert_opt(&mut opts, "host", snell.obfs_host.clone());
                map.insert("obfs-opts".to_string(), Value::Object(opts));
            }
            Value::Object(map)
        }
    }
}

/// Clash proxy entries of the selected nodes.
pub fn get_clash_nodes(nodes: &[NodeConfig], filter: Option<&NodeNameFilter>) -> Vec<Value> {
    select_nodes(nodes, filter).map(node_to_clash).collect()
}

/// Names of the selected nodes, every protocol has a Clash form.
pub fn get_clash_node_names(nodes: &[NodeConfig], filter: Option<&NodeNameFilter>) -> Vec<String> {
    select_nodes(nodes, filter)
        .map(|node| node.node_name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HttpNode, ShadowsocksNode, VmessNode};

    #[test]
    fn test_shadowsocks_obfs() {
        let node = NodeConfig::new(
            "HK",
            NodeProtocol::Shadowsocks(ShadowsocksNode {
                hostname: "hk.example.com".to_string(),
                port: 8388,
                method: "aes-128-gcm".to_string(),
                password: "pw".to_string(),
                obfs: Some("http".to_string()),
                obfs_host: Some("bing.com".to_string()),
                ..Default::default()
            }),
        );
        let proxy = node_to_clash(&node);
        assert_eq!(proxy["type"], "ss");
        assert_eq!(proxy["plugin"], "obfs");
        assert_eq!(proxy["plugin-opts"]["mode"], "http");
        assert_eq!(proxy["plugin-opts"]["host"], "bing.com");
    }

    #[test]
    fn test_vmess_ws() {
        let node = NodeConfig::new(
            "JP",
            NodeProtocol::Vmess(VmessNode {
                hostname: "jp.example.com".to_string(),
                port: 443,
                uuid: "uuid".to_string(),
                method: "auto".to_string(),
                network: VmessNetwork::Ws,
                path: Some("/ray".to_string()),
                host: Some("cdn.example.com".to_string()),
                tls: true,
                sni: Some("cdn.example.com".to_string()),
                ..Default::default()
            }),
        );
        let proxy = node_to_clash(&node);
        assert_eq!(proxy["network"], "ws");
        assert_eq!(proxy["ws-opts"]["path"], "/ray");
        assert_eq!(proxy["ws-opts"]["headers"]["Host"], "cdn.example.com");
        assert_eq!(proxy["servername"], "cdn.example.com");
        assert_eq!(proxy["tls"], true);
    }

    #[test]
    fn test_https_and_names() {
        let nodes = vec![
            NodeConfig::new(
                "US",
                NodeProtocol::Https(HttpNode {
                    hostname: "us.example.com".to_string(),
                    port: 443,
                    ..Default::default()
                }),
            ),
            NodeConfig::new("HK", NodeProtocol::Http(HttpNode::default())),
        ];
        let proxies = get_clash_nodes(&nodes, None);
        assert_eq!(proxies[0]["type"], "http");
        assert_eq!(proxies[0]["tls"], true);
        assert!(proxies[1].get("tls").is_none());

        let hk = NodeNameFilter::keywords(["HK"], true);
        assert_eq!(get_clash_node_names(&nodes, Some(&hk)), vec!["HK"]);
    }
}
