use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use critiq::config::Config;
use critiq::gateway;
use critiq::history::ReviewHistory;
use critiq::pipeline::ReviewPipeline;
use critiq::review::{Language, ReviewRequest};

#[derive(Parser)]
#[command(name = "critiq", version, about = "Multi-source code review aggregation")]
struct Cli {
    /// Path to the config file (defaults to the platform config dir).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP gateway.
    Serve {
        /// Override the configured bind host.
        #[arg(long)]
        host: Option<String>,
        /// Override the configured port.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Review one file and print the result as JSON.
    Review {
        /// File to review.
        file: PathBuf,
        /// Language override; inferred from the extension otherwise.
        #[arg(long)]
        language: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Serve { host, port } => {
            let mut config = config;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            gateway::run_gateway(config).await
        }
        Command::Review { file, language } => {
            let code = std::fs::read_to_string(&file)?;
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned());
            let language = match language {
                Some(raw) => serde_json::from_value(serde_json::Value::String(raw.clone()))
                    .map_err(|_| anyhow::anyhow!("unsupported language: {raw}"))?,
                None => file_name
                    .as_deref()
                    .and_then(Language::from_file_name)
                    .ok_or_else(|| {
                        anyhow::anyhow!("cannot infer language from file name, pass --language")
                    })?,
            };

            let history = Arc::new(ReviewHistory::new());
            let pipeline = ReviewPipeline::new(&config, history);
            let review = pipeline
                .review(ReviewRequest {
                    code,
                    language,
                    context: None,
                    file_name,
                    include_static_analysis: true,
                    include_ai_analysis: true,
                    focus_areas: None,
                })
                .await?;

            println!("{}", serde_json::to_string_pretty(&review)?);
            Ok(())
        }
    }
}
