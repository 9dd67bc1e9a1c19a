//! Output formatting for configuration values.

use crate::error::{ConfigError, Result};
use serde_json::Value;

/// Output format for printed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "yaml" | "yml" => Some(OutputFormat::Yaml),
            _ => None,
        }
    }

    /// Render a value. Scalars print bare in both formats.
    pub fn render(self, value: &Value) -> Result<String> {
        match value {
            Value::String(s) => return Ok(s.clone()),
            Value::Null | Value::Bool(_) | Value::Number(_) => return Ok(value.to_string()),
            _ => {}
        }
        match self {
            OutputFormat::Json => serde_json::to_string_pretty(value).map_err(ConfigError::internal),
            OutputFormat::Yaml => serde_yaml::to_string(value)
                .map(|s| s.trim_end().to_string())
                .map_err(ConfigError::internal),
        }
    }
}
