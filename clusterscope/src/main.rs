/*
clusterscope - main.rs
Fetches a feed and prints its articles grouped by topic, or serves the same pipeline over HTTP.
*/

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use common::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use clusterscope::ingestion::HttpFeedSource;
use clusterscope::pipeline::Pipeline;
use clusterscope::presenter;
use clusterscope::server::launch_rocket;

#[derive(Parser, Debug)]
#[command(name = "clusterscope", about = "Group the articles of a news feed into topical clusters")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a feed once and print the clustered articles
    Cluster {
        /// Feed URL (RSS, Atom or JSON Feed)
        #[arg(long)]
        url: String,

        /// Number of clusters (defaults to clustering.num_clusters, then 5)
        #[arg(long, short = 'k')]
        clusters: Option<usize>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,
    },
    /// Start the HTTP front end
    Serve,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Markdown,
    Json,
}

async fn load_config(override_path: Option<PathBuf>) -> Result<Config> {
    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = override_path {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() { Some(p) } else { None }
    };

    let config = Config::load_with_defaults(
        if default_path.exists() { Some(&default_path) } else { None },
        override_path.as_deref(),
    )
    .await?;
    info!(default = ?default_path, override = ?override_path, "configuration loaded");
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let config = match load_config(args.config).await {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(%e, "failed to load configuration");
            return Err(e);
        }
    };

    let source = Arc::new(
        HttpFeedSource::from_config(&config.fetch).context("failed to set up feed fetching")?,
    );

    match args.command {
        Command::Cluster { url, clusters, format } => {
            let num_clusters = clusters.unwrap_or_else(|| config.clustering.num_clusters());
            let pipeline = Pipeline::from_config(source, &config);

            let outcome = match pipeline.run(&url, num_clusters).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(%e, url = %url, "clustering failed");
                    return Err(e.into());
                }
            };

            let rendered = match format {
                OutputFormat::Markdown => presenter::render_markdown(&outcome),
                OutputFormat::Json => {
                    presenter::render_json(&outcome).context("failed to encode JSON output")?
                }
            };
            println!("{}", rendered);
        }
        Command::Serve => {
            info!(
                bind = config.server.bind(),
                port = config.server.port(),
                "Launching Rocket HTTP server"
            );
            launch_rocket(Arc::new(config), source).await?;
        }
    }

    Ok(())
}
