//! Command-line interface: config location and execution-mode override.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::ExecutionMode;

/// arbiter - cross-exchange cryptocurrency arbitrage engine.
#[derive(Parser, Debug)]
#[command(name = "arbiter")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory containing config.toml
    #[arg(long, default_value = "configs")]
    pub config_dir: PathBuf,

    /// Override the configured execution mode
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,
}

impl Cli {
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Paper,
    Backtest,
}

impl From<ModeArg> for ExecutionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Paper => ExecutionMode::Paper,
            ModeArg::Backtest => ExecutionMode::Backtest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_dir_is_configs() {
        let cli = Cli::parse_from(["arbiter"]);
        assert_eq!(cli.config_path(), PathBuf::from("configs/config.toml"));
        assert_eq!(cli.mode, None);
    }

    #[test]
    fn mode_flag_parses_and_maps_to_execution_mode() {
        let cli = Cli::parse_from(["arbiter", "--mode", "backtest"]);
        assert_eq!(cli.mode, Some(ModeArg::Backtest));
        assert_eq!(ExecutionMode::from(cli.mode.unwrap()), ExecutionMode::Backtest);
    }

    #[test]
    fn config_dir_flag_overrides_default() {
        let cli = Cli::parse_from(["arbiter", "--config-dir", "/etc/arbiter"]);
        assert_eq!(cli.config_path(), PathBuf::from("/etc/arbiter/config.toml"));
    }
}
