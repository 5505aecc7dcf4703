//! Logging setup
//!
//! Priority for the filter: RUST_LOG env var > log config > default "info".
//! An external log config file (TOML, same fields as `[log]`) can be pointed
//! to with `DEPTSYNC_LOG_CFG`; without one the `[log]` section or the
//! built-in defaults are used.

use std::path::{Path, PathBuf};

use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{LogConfig, LogFormat};
use crate::error::{AppError, AppResult};

/// Environment variable naming an external log config file
pub const LOG_CFG_ENV: &str = "DEPTSYNC_LOG_CFG";

/// Pick the effective log config: explicit path, then `DEPTSYNC_LOG_CFG`,
/// then `fallback`.
pub fn resolve(cfg_path: Option<&Path>, fallback: &LogConfig) -> AppResult<LogConfig> {
    let path = cfg_path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(LOG_CFG_ENV).map(PathBuf::from));

    match path {
        Some(path) => load_file(&path),
        None => Ok(fallback.clone()),
    }
}

fn load_file(path: &Path) -> AppResult<LogConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))
}

/// Install the global subscriber
pub fn init(config: &LogConfig) -> AppResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let timer = ChronoLocal::new(config.time_format.clone());

    let builder = fmt::fmt()
        .with_env_filter(env_filter)
        .with_timer(timer)
        .with_target(true);

    let result = match config.format {
        LogFormat::Full => builder.try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };

    result.map_err(|e| AppError::Config(format!("logging init failed: {}", e)))
}
