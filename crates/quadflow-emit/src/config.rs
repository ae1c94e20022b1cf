use crate::output::OutputFormat;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Color the method headers. Report lines are never colored.
    pub use_colors: bool,
    /// Precede each text report with a `Method: <name>` line.
    pub method_headers: bool,
    pub format: OutputFormat,
    pub pretty_json: bool,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            use_colors: false,
            method_headers: false,
            format: OutputFormat::Text,
            pretty_json: true,
        }
    }
}

impl EmitterConfig {
    pub fn json() -> Self {
        Self {
            format: OutputFormat::Json,
            ..Self::default()
        }
    }

    pub fn with_method_headers(mut self, enabled: bool) -> Self {
        self.method_headers = enabled;
        self
    }

    pub fn with_colors(mut self, enabled: bool) -> Self {
        self.use_colors = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_plain_text() {
        let config = EmitterConfig::default();
        assert_eq!(config.format, OutputFormat::Text);
        assert!(!config.use_colors);
        assert!(!config.method_headers);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: EmitterConfig = serde_json::from_str(r#"{"format": "Json"}"#).unwrap();
        assert_eq!(config, EmitterConfig::json());
    }
}
