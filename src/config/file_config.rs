use crate::utils::error::{PortError, Result};
use crate::utils::validation::{validate_path, validate_positive_number, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional TOML configuration file.
///
/// ```toml
/// [ingest]
/// source = "${DATA_DIR}/ports.json"
///
/// [shutdown]
/// grace_seconds = 5
///
/// [logging]
/// verbose = false
/// json = false
///
/// [monitoring]
/// enabled = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    pub ingest: Option<IngestSection>,
    pub shutdown: Option<ShutdownSection>,
    pub logging: Option<LoggingSection>,
    pub monitoring: Option<MonitoringSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestSection {
    pub source: Option<String>,
    #[serde(default)]
    pub lookups: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShutdownSection {
    pub grace_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSection {
    pub verbose: Option<bool>,
    pub json: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitoringSection {
    pub enabled: bool,
}

impl FileConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| PortError::Config {
            field: "config".to_string(),
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = substitute_env_vars(content)?;
        Ok(toml::from_str(&processed)?)
    }

    pub fn source(&self) -> Option<&str> {
        self.ingest.as_ref().and_then(|i| i.source.as_deref())
    }

    pub fn lookups(&self) -> &[String] {
        self.ingest.as_ref().map(|i| i.lookups.as_slice()).unwrap_or(&[])
    }

    pub fn grace_seconds(&self) -> Option<u64> {
        self.shutdown.as_ref().and_then(|s| s.grace_seconds)
    }

    pub fn verbose(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.verbose).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

/// Replaces `${VAR}` with the environment value; unknown variables are left as-is.
fn substitute_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| PortError::Config {
        field: "config".to_string(),
        message: e.to_string(),
    })?;

    let result = re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    });

    Ok(result.into_owned())
}

impl Validate for FileConfig {
    fn validate(&self) -> Result<()> {
        if let Some(source) = self.source() {
            validate_path("ingest.source", source)?;
        }
        if let Some(grace) = self.grace_seconds() {
            validate_positive_number("shutdown.grace_seconds", grace, 1)?;
        }
        Ok(())
    }
}
