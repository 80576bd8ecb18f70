//! Per-client node formatting
//!
//! Every formatter skips disabled nodes, nodes rejected by the optional
//! filter and nodes whose protocol the client cannot express.

pub mod clash;
pub mod quanx;
pub mod ss_sub;
pub mod surge;

use crate::filter::NodeNameFilter;
use crate::models::NodeConfig;

pub use clash::{get_clash_node_names, get_clash_nodes, node_to_clash};
pub use quanx::{get_quantumult_x_nodes, node_to_quantumult_x};
pub use ss_sub::get_shadowsocks_nodes;
pub use surge::{get_surge_nodes, node_to_surge};

/// Enabled nodes accepted by `filter`, in order.
pub fn select_nodes<'a>(
    nodes: &'a [NodeConfig],
    filter: Option<&'a NodeNameFilter>,
) -> impl Iterator<Item = &'a NodeConfig> + 'a {
    nodes
        .iter()
        .filter(|node| node.enable)
        .filter(move |node| filter.map_or(true, |f| f.matches(&node.node_name)))
}

/// Names of the selected nodes joined by `separator`.
pub fn get_node_names(
    nodes: &[NodeConfig],
    filter: Option<&NodeNameFilter>,
    separator: &str,
) -> String {
    select_nodes(nodes, filter)
        .map(|node| node.node_name.as_str())
        .collect::<Vec<_>>()
        .join(separator)
}
