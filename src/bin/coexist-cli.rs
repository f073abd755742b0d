use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

use multiversion_router::config::{load_config, ConfigError};
use multiversion_router::versioning::SortingMethod;

#[derive(Parser)]
#[command(name = "coexist-cli")]
#[command(about = "Management CLI for the multi-version router", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long, env = "COEXIST_ADMIN_KEY", default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Router status and last registration pass
    Status,
    /// Registered, active, and allowed versions
    Versions,
    /// Live route table
    Routes,
    /// Validate a config file without starting a server
    Check {
        /// Path to the TOML config
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let endpoint = match cli.command {
        Commands::Status => "status",
        Commands::Versions => "versions",
        Commands::Routes => "routes",
        Commands::Check { config } => return check(&config),
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let res = reqwest::Client::new()
        .get(format!("{}/admin/{}", cli.url.trim_end_matches('/'), endpoint))
        .headers(headers)
        .send()
        .await?;
    print_response(res).await
}

fn check(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    match load_config(path) {
        Ok(config) => {
            let sorting: SortingMethod = config.versioning.sorting_method.parse()?;
            println!("{}: ok", path.display());
            println!("  versioning:     {}", if config.versioning.enabled { "on" } else { "off" });
            println!("  sorting method: {sorting}");
            println!("  include:        {:?}", config.versioning.include);
            println!("  exclude:        {:?}", config.versioning.exclude);
            println!("  max versions:   {}", config.versioning.max_versions);
            println!("  catalog:        {} version(s)", config.versions_info.versions.len());
            if config.file_control.enabled {
                println!("  allow-list:     {}", config.file_control.path);
            }
            Ok(())
        }
        Err(ConfigError::Validation(errors)) => {
            eprintln!("{}: {} problem(s)", path.display(), errors.len());
            for error in &errors {
                eprintln!("  - {error}");
            }
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
