//! `dartscore` - CLI for the darts score service
//!
//! This binary runs the HTTP service and provides helpers for inspecting
//! its database and configuration.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::Context;
use clap::Parser;

use dartscore::cli::{Cli, Command, ConfigCommand, ServeCommand};
use dartscore::logging::init_logging;
use dartscore::{server, Config, Storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity(), cli.log_format.into());

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    match cli.command {
        Command::Serve(serve_cmd) => handle_serve(config, &serve_cmd).await,
        Command::Status(status_cmd) => handle_status(&config, status_cmd.json),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

async fn handle_serve(mut config: Config, cmd: &ServeCommand) -> anyhow::Result<()> {
    cmd.apply(&mut config);
    config.validate()?;
    server::run(config).await?;
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let path = config.database_path();
    let stats = if path.exists() {
        let storage = Storage::open(&path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        Some(storage.stats()?)
    } else {
        None
    };

    if json {
        let status = serde_json::json!({
            "database_path": path,
            "exists": stats.is_some(),
            "total_records": stats.as_ref().map(|s| s.total_records),
            "last_update": stats.as_ref().and_then(|s| s.last_update),
            "db_size_bytes": stats.as_ref().map(|s| s.db_size_bytes),
            "schema_version": stats.as_ref().map(|s| s.schema_version),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("dartscore status");
        println!("----------------");
        println!("Database:      {}", path.display());
        match stats {
            Some(stats) => {
                println!("Records:       {}", stats.total_records);
                println!(
                    "Last update:   {}",
                    stats
                        .last_update
                        .map_or_else(|| "never".to_string(), |t| t.to_rfc3339())
                );
                println!("Size:          {} bytes", stats.db_size_bytes);
                println!("Schema:        v{}", stats.schema_version);
            }
            None => println!("Records:       (database not created yet)"),
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Server]");
                println!("  Address:            {}", config.bind_address());
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[API]");
                println!("  Name:               {}", config.api.name);
                println!("  Default page size:  {}", config.api.default_page_size);
                println!("  Max page size:      {}", config.api.max_page_size);
                println!("  Docs enabled:       {}", config.api.docs_enabled);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
