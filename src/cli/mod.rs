pub mod commands;

use std::path::PathBuf;

use clap::Parser;

use crate::config::{expand_tilde, Config, ConfigError};

#[derive(Parser, Debug)]
#[command(name = "tread", version)]
#[command(about = "A simple terminal feed reader", long_about = None)]
pub struct Cli {
    /// Path to the configuration file. Defaults to ~/.tread.toml
    pub config: Option<PathBuf>,

    /// Instead of running interactively, fetch updates for all feeds then exit
    #[arg(short, long)]
    pub update: bool,
}

impl Cli {
    pub fn config_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.config {
            Some(path) => Ok(expand_tilde(&path.to_string_lossy())),
            None => Config::default_config_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["tread"]).unwrap();
        assert!(cli.config.is_none());
        assert!(!cli.update);
    }

    #[test]
    fn test_config_and_update() {
        let cli = Cli::try_parse_from(["tread", "/tmp/feeds.toml", "-u"]).unwrap();
        assert_eq!(cli.config_path().unwrap(), PathBuf::from("/tmp/feeds.toml"));
        assert!(cli.update);

        let cli = Cli::try_parse_from(["tread", "--update"]).unwrap();
        assert!(cli.update);
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        assert!(Cli::try_parse_from(["tread", "--bogus"]).is_err());
    }
}
