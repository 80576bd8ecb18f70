pub mod aggregate;
pub mod artifact;
pub mod context;
pub mod formats;
pub mod proxy_group;
pub mod snippets;

pub use aggregate::{get_node_list, NodeAggregate, NodeDecoration};
pub use artifact::{
    build_artifact_context, generate, generate_artifact, ProgressEvent, ProgressSender,
};
pub use context::{ArtifactContext, DownloadUrl};
pub use proxy_group::{normalize_clash_proxy_group, ClashProxyConfig, ClashProxyGroup};
pub use snippets::load_remote_snippets;
