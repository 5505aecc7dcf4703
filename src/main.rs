use std::env;
use std::path::Path;
use tracing::info;

use deptsync::{logging, pipeline, Config};

const DEFAULT_CONFIG_PATH: &str = "./etc/deptsync.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|arg| arg == "-help" || arg == "--help") {
        println!("Usage: deptsync [OPTIONS]");
        println!("Options:");
        println!("  -config <path>   Path to configuration file (default: {})", DEFAULT_CONFIG_PATH);
        println!("  -log-cfg <path>  Path to a logging config file (overrides [log] and DEPTSYNC_LOG_CFG)");
        println!("  -help, --help    Print this help message");
        return Ok(());
    }

    let config_path = arg_value(&args, "-config").unwrap_or(DEFAULT_CONFIG_PATH);
    let log_cfg_path = arg_value(&args, "-log-cfg").map(Path::new);

    // Load configuration first (before logging init)
    let config = Config::load(config_path).unwrap_or_else(|e| {
        eprintln!("Could not load config file: {}, using defaults", e);
        let mut config = Config::default();
        config.apply_env();
        config
    });

    let log_config = logging::resolve(log_cfg_path, &config.log)?;
    logging::init(&log_config)?;

    info!("Starting department sync...");
    info!("Loading configuration from: {}", config_path);

    pipeline::run(&config).await.map_err(|e| {
        tracing::error!("Department sync failed: {}", e);
        anyhow::anyhow!("Department sync failed: {}", e)
    })?;

    Ok(())
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .skip_while(|arg| arg.as_str() != flag)
        .nth(1)
        .map(String::as_str)
}
