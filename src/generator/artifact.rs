//! Artifact generation pipeline
//!
//! Artifacts are generated strictly one at a time, in declaration order. The
//! first failure aborts the run.

use std::path::{Path, PathBuf};

use log::{error, info};
use tokio::sync::mpsc::UnboundedSender;

use super::aggregate::{get_node_list, NodeDecoration};
use super::context::ArtifactContext;
use super::snippets::load_remote_snippets;
use crate::error::{Error, Result};
use crate::models::{ArtifactConfig, CommandConfig, RemoteSnippet};
use crate::provider::ProviderLoader;
use crate::template::TemplateRenderer;

/// Progress of a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    RunStarted { artifacts: usize },
    ArtifactStarted { index: usize, name: String },
    ArtifactWritten { name: String, path: PathBuf, bytes: usize },
    RunFinished { artifacts: usize },
}

pub type ProgressSender = UnboundedSender<ProgressEvent>;

fn emit(progress: Option<&ProgressSender>, event: ProgressEvent) {
    if let Some(sender) = progress {
        // a dropped receiver only means nobody is listening
        let _ = sender.send(event);
    }
}

/// Build the context of one artifact.
pub async fn build_artifact_context(
    config: &CommandConfig,
    artifact: &ArtifactConfig,
    loader: &ProviderLoader,
    remote_snippets: &[RemoteSnippet],
) -> Result<ArtifactContext> {
    let decoration = NodeDecoration {
        bin_path: &config.bin_path,
        surge_config: &config.surge_config,
    };
    let aggregate = get_node_list(loader, &artifact.provider_names(), decoration).await?;
    ArtifactContext::build(artifact, config, aggregate, remote_snippets)
}

/// Render one artifact to text.
pub async fn generate_artifact(
    config: &CommandConfig,
    artifact: &ArtifactConfig,
    loader: &ProviderLoader,
    renderer: &dyn TemplateRenderer,
    remote_snippets: &[RemoteSnippet],
) -> Result<String> {
    let context = build_artifact_context(config, artifact, loader, remote_snippets).await?;
    renderer.render(&artifact.template, &context)
}

async fn recreate_dir(dir: &Path) -> Result<()> {
    if tokio::fs::try_exists(dir).await.map_err(|e| Error::io(dir, e))? {
        tokio::fs::remove_dir_all(dir)
            .await
            .map_err(|e| Error::io(dir, e))?;
    }
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| Error::io(dir, e))
}

/// Generate every artifact of `config` into its output directory.
///
/// Returns the paths written, in artifact order.
pub async fn generate(
    config: &CommandConfig,
    loader: &ProviderLoader,
    renderer: &dyn TemplateRenderer,
    progress: Option<&ProgressSender>,
) -> Result<Vec<PathBuf>> {
    config.validate()?;
    emit(
        progress,
        ProgressEvent::RunStarted {
            artifacts: config.artifacts.len(),
        },
    );

    let remote_snippets = load_remote_snippets(&config.remote_snippets).await?;
    recreate_dir(&config.output).await?;

    let mut written = Vec::with_capacity(config.artifacts.len());
    for (index, artifact) in config.artifacts.iter().enumerate() {
        info!("Generating artifact {}", artifact.name);
        emit(
            progress,
            ProgressEvent::ArtifactStarted {
                index,
                name: artifact.name.clone(),
            },
        );

        let content = generate_artifact(config, artifact, loader, renderer, &remote_snippets)
            .await
            .inspect_err(|e| error!("Failed to generate artifact {}: {}", artifact.name, e))?;

        let path = config.output.join(&artifact.name);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::io(parent, e))?;
        }
        tokio::fs::write(&path, content.as_bytes())
            .await
            .map_err(|e| Error::io(&path, e))?;
        info!("Generated {}", path.display());
        emit(
            progress,
            ProgressEvent::ArtifactWritten {
                name: artifact.name.clone(),
                path: path.clone(),
                bytes: content.len(),
            },
        );
        written.push(path);
    }

    emit(
        progress,
        ProgressEvent::RunFinished {
            artifacts: written.len(),
        },
    );
    Ok(written)
}
