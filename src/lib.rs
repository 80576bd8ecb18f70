pub mod error;
pub mod filter;
pub mod generator;
pub mod models;
pub mod provider;
pub mod template;
pub mod utils;

pub use error::{Error, Result};

// Re-export the pipeline entry points for easier access
pub use generator::{generate, generate_artifact, ProgressEvent, ProgressSender};
pub use models::{ArtifactConfig, CommandConfig, NodeConfig, NodeType};
pub use provider::{Provider, ProviderLoader};
pub use template::{MiniJinjaRenderer, TemplateRenderer};
