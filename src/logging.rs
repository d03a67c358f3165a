//! Logger setup for the host binary and embedders.

use std::fs::OpenOptions;
use std::path::Path;

use env_logger::{Builder, Target};
use log::LevelFilter;

use crate::runner::plugin::config::ConfigError;

/// Installs `env_logger` at `level`. `RUST_LOG` still overrides per module.
/// With `file`, log lines are appended there instead of going to stderr.
pub fn init(level: LevelFilter, file: Option<&Path>) -> Result<(), ConfigError> {
    let mut builder = Builder::new();
    builder.filter_level(level).parse_default_env();
    if let Some(path) = file {
        let out = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;
        builder.target(Target::Pipe(Box::new(out))).write_style(env_logger::WriteStyle::Never);
    }
    builder.try_init().map_err(|e| ConfigError::Logger(e.to_string()))
}
