mod cli;

use anistream::{config, server};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config::validate_config(&config)?;

    tracing::info!("Starting anistream server");
    tracing::info!("Data directory: {:?}", config.storage.data_dir);
    tracing::info!("Content root: {:?}", config.storage.content_root);

    server::start_server(config).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "anistream=trace,anistream_store=debug,anistream_common=debug,tower_http=debug"
                .to_string()
        } else {
            "anistream=debug,anistream_store=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("anistream {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            print_summary(&config);
        }
        None => {
            println!("No config file specified, using defaults");
            print_summary(&config::Config::default());
        }
    }

    Ok(())
}

fn print_summary(config: &config::Config) {
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Data directory: {}", config.storage.data_dir.display());
    println!("  Content root: {}", config.storage.content_root.display());
    println!("  Chunk size: {} bytes", config.streaming.chunk_size);
    if let Some(ref dir) = config.server.static_dir {
        println!("  Static files: {}", dir.display());
    }
}
