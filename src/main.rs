use std::path::PathBuf;

use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{debug, error, info};
use tokio::sync::mpsc;

use subgen::{generate, CommandConfig, MiniJinjaRenderer, ProgressEvent, ProviderLoader};

/// Generate proxy client configuration artifacts from node providers
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate every artifact declared in the configuration file
    Generate {
        /// Path to the configuration file
        #[arg(short, long, value_name = "FILE", default_value = "subgen.yaml")]
        config: PathBuf,
    },
}

async fn run_generate(config_path: PathBuf) -> subgen::Result<()> {
    let config = CommandConfig::load_from_file(&config_path)?;
    info!(
        "Loaded {} artifact(s) from {}",
        config.artifacts.len(),
        config_path.display()
    );

    let loader = ProviderLoader::new(&config.provider_dir);
    let renderer = MiniJinjaRenderer::new(&config.template_dir);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let reporter = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                ProgressEvent::ArtifactWritten { path, bytes, .. } => {
                    debug!("Wrote {} bytes to {}", bytes, path.display())
                }
                ProgressEvent::RunFinished { artifacts } => {
                    info!("Generated {} artifact(s)", artifacts)
                }
                other => debug!("{:?}", other),
            }
        }
    });

    let result = generate(&config, &loader, &renderer, Some(&tx)).await;
    drop(tx);
    let _ = reporter.await;
    result.map(|_| ())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize the logger
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let args = Args::parse();
    let result = match args.command {
        Command::Generate { config } => run_generate(config).await,
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}
