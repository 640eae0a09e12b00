//! Configuration handling for the postbox inspector.
//!
//! Settings come from the shared YAML config file, then environment
//! variables, then command-line flags (applied in `main`).

use anyhow::Result;
use letter_wire::ParamOrder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

/// How reports are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// One human readable line per letter
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format {other:?}")),
        }
    }
}

/// Framing of the input stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    /// `=kind` line, params, body
    #[default]
    Letter,
    /// Header-only messages typed by the `type` header
    Legacy,
}

impl FromStr for InputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "letter" => Ok(InputFormat::Letter),
            "legacy" => Ok(InputFormat::Legacy),
            other => Err(format!("unknown input format {other:?}")),
        }
    }
}

/// Postbox configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostboxConfig {
    /// Param order used when re-encoding
    pub param_order: ParamOrder,
    /// Report format
    pub output: OutputFormat,
    /// Framing of the input stream
    pub format: InputFormat,
    /// Fail as soon as a letter does not validate
    pub stop_on_invalid: bool,
}

/// Root configuration structure (matches the YAML structure)
#[derive(Debug, Deserialize)]
struct RootConfig {
    services: Option<ServicesConfig>,
}

#[derive(Debug, Deserialize)]
struct ServicesConfig {
    postbox: Option<ServiceConfig>,
}

#[derive(Debug, Deserialize)]
struct ServiceConfig {
    args: Option<Vec<String>>,
    config: Option<HashMap<String, String>>,
}

impl PostboxConfig {
    /// Load configuration from file and environment variables
    pub fn load_from_file<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let mut config = Self::default();

        if let Ok(content) = std::fs::read_to_string(&config_path) {
            match serde_yaml::from_str::<RootConfig>(&content) {
                Ok(root_config) => {
                    config.apply_root_config(root_config);
                    info!("Loaded configuration from {:?}", config_path.as_ref());
                }
                Err(err) => {
                    warn!(
                        "Failed to parse config file {:?}, using defaults: {}",
                        config_path.as_ref(),
                        err
                    );
                }
            }
        } else {
            warn!("Config file {:?} not found, using defaults", config_path.as_ref());
        }

        config.apply_environment_overrides();

        info!(
            "Final postbox configuration: format={:?}, output={:?}, param_order={:?}, stop_on_invalid={}",
            config.format, config.output, config.param_order, config.stop_on_invalid
        );

        Ok(config)
    }

    fn apply_root_config(&mut self, root_config: RootConfig) {
        if let Some(service) = root_config.services.and_then(|services| services.postbox) {
            self.apply_service_config(service);
        }
    }

    /// Apply postbox service specific configuration
    fn apply_service_config(&mut self, service_config: ServiceConfig) {
        for arg in service_config.args.unwrap_or_default() {
            let Some((flag, value)) = arg.split_once('=') else {
                continue;
            };
            let field = match flag {
                "--param-order" => "param_order",
                "--output" => "output",
                "--format" => "format",
                "--stop-on-invalid" => "stop_on_invalid",
                _ => continue,
            };
            self.set(field, value);
        }

        for (key, value) in service_config.config.unwrap_or_default() {
            if let Some(field) = key.strip_prefix("services.postbox.") {
                self.set(field, &value);
            }
        }
    }

    /// Apply environment variable overrides
    fn apply_environment_overrides(&mut self) {
        for (var, field) in [
            ("POSTBOX_PARAM_ORDER", "param_order"),
            ("POSTBOX_OUTPUT", "output"),
            ("POSTBOX_FORMAT", "format"),
            ("POSTBOX_STOP_ON_INVALID", "stop_on_invalid"),
        ] {
            if let Ok(value) = std::env::var(var) {
                if self.set(field, &value) {
                    info!("{} overridden by environment: {}", field, value);
                }
            }
        }
    }

    /// Set one field from its string form, returns whether it was applied
    fn set(&mut self, field: &str, value: &str) -> bool {
        let applied = match field {
            "param_order" => value.parse::<ParamOrder>().map(|v| self.param_order = v).is_ok(),
            "output" => value.parse::<OutputFormat>().map(|v| self.output = v).is_ok(),
            "format" => value.parse::<InputFormat>().map(|v| self.format = v).is_ok(),
            "stop_on_invalid" => {
                self.stop_on_invalid = value.eq_ignore_ascii_case("true");
                true
            }
            // Ignore unknown configuration keys
            _ => return false,
        };
        if !applied {
            warn!("Ignoring invalid value {:?} for {}", value, field);
        }
        applied
    }
}
