use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, env = "POCKET_MIRROR_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log level, overrides the config file
    #[arg(long, value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Obtain an access token and store it in the config file
    Authorize,
    /// Bring the local mirror up to date
    Sync,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn directive(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Error => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sync_with_overrides() {
        let cli = Cli::parse_from([
            "pocket-mirror",
            "sync",
            "--log-level",
            "debug",
            "--config",
            "/tmp/pm.toml",
        ]);
        assert_eq!(cli.command, Command::Sync);
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/pm.toml")));
    }

    #[test]
    fn warning_maps_to_warn_directive() {
        let cli = Cli::parse_from(["pocket-mirror", "--log-level", "warning", "authorize"]);
        assert_eq!(cli.command, Command::Authorize);
        assert_eq!(cli.log_level.map(LogLevel::directive), Some("warn"));
    }

    #[test]
    fn command_is_required() {
        assert!(Cli::try_parse_from(["pocket-mirror"]).is_err());
    }
}
