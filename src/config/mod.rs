#[cfg(feature = "cli")]
pub mod cli;
pub mod file_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use file_config::FileConfig;

use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_path, validate_positive_number, Validate};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SOURCE: &str = "ports.json";
pub const DEFAULT_GRACE_SECS: u64 = 5;

/// Values given on the command line; `None`/`false` defer to the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub file: Option<String>,
    pub shutdown_grace_secs: Option<u64>,
    pub lookups: Vec<String>,
    pub verbose: bool,
    pub json_logs: bool,
    pub monitor: bool,
}

/// Settings after merging command-line flags over the optional config file.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub source: PathBuf,
    pub shutdown_grace_secs: u64,
    pub lookups: Vec<String>,
    pub verbose: bool,
    pub json_logs: bool,
    pub monitor: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source: PathBuf::from(DEFAULT_SOURCE),
            shutdown_grace_secs: DEFAULT_GRACE_SECS,
            lookups: Vec::new(),
            verbose: false,
            json_logs: false,
            monitor: false,
        }
    }
}

impl Settings {
    /// Flags win over file values; file values win over defaults.
    pub fn merge(overrides: Overrides, config: &FileConfig) -> Self {
        let mut lookups = config.lookups().to_vec();
        lookups.extend(overrides.lookups);

        Self {
            source: overrides
                .file
                .or_else(|| config.source().map(str::to_string))
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCE)),
            shutdown_grace_secs: overrides
                .shutdown_grace_secs
                .or(config.grace_seconds())
                .unwrap_or(DEFAULT_GRACE_SECS),
            lookups,
            verbose: overrides.verbose || config.verbose(),
            json_logs: overrides.json_logs || config.json_logs(),
            monitor: overrides.monitor || config.monitoring_enabled(),
        }
    }

    #[cfg(feature = "cli")]
    pub fn from_cli(cli: CliConfig) -> Result<Self> {
        let file_config = match cli.config.as_deref() {
            Some(path) => {
                let config = FileConfig::from_file(path)?;
                config.validate()?;
                config
            }
            None => FileConfig::default(),
        };
        let overrides = Overrides {
            file: cli.file,
            shutdown_grace_secs: cli.shutdown_grace_secs,
            lookups: cli.lookups,
            verbose: cli.verbose,
            json_logs: cli.json_logs,
            monitor: cli.monitor,
        };
        Ok(Self::merge(overrides, &file_config))
    }
}

impl ConfigProvider for Settings {
    fn source_path(&self) -> &Path {
        &self.source
    }

    fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    fn lookups(&self) -> &[String] {
        &self.lookups
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_path("file", &self.source.to_string_lossy())?;
        validate_positive_number("shutdown_grace_secs", self.shutdown_grace_secs, 1)?;
        for id in &self.lookups {
            validate_non_empty_string("get", id)?;
        }
        Ok(())
    }
}
