use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use climasphere::{ClimaConfig, RiskService, share, telemetry, web};

/// Multi-source weather reconciliation and comfort risk scoring
#[derive(Parser)]
#[command(name = "climasphere", version, about)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Port to listen on (overrides the configuration)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Compute comfort risk for one point and date and print it as JSON
    Risk {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Target date, YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// Also print a share token for the result
        #[arg(long)]
        share: bool,
    },
    /// Decode a share token and print it as JSON
    ShareDecode {
        token: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = ClimaConfig::load_from_path(cli.config.clone())?;
    telemetry::init(&config.logging, cli.verbose)?;
    debug!("Loaded configuration: {:?}", config.server);

    match cli.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            web::run(&config).await
        }
        Command::Risk {
            lat,
            lon,
            date,
            share: with_token,
        } => {
            let service = RiskService::from_config(&config)?;
            let report = service
                .compute_risk(lat, lon, &date)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;

            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("Failed to serialize report")?
            );
            if with_token {
                let date = chrono::NaiveDate::parse_from_str(&report.meta.date, "%Y-%m-%d")
                    .context("Report carries an invalid date")?;
                println!("share token: {}", share::encode(&report.indices, date));
            }
            Ok(())
        }
        Command::ShareDecode { token } => {
            let (indices, date) = share::decode(&token).context("Invalid share token")?;
            let shared = serde_json::json!({ "date": date, "indices": indices });
            println!(
                "{}",
                serde_json::to_string_pretty(&shared).context("Failed to serialize result")?
            );
            Ok(())
        }
    }
}
