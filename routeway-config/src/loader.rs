// Configuration file loaders

use crate::{ConfigError, Result, RouteFile};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileFormat {
    Json,
    Toml,
    Env,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(FileFormat::Json),
            "toml" => Some(FileFormat::Toml),
            "env" => Some(FileFormat::Env),
            _ => None,
        }
    }

    /// Detect the format of a path. A bare `.env` file name counts as
    /// [`FileFormat::Env`].
    pub fn from_path(path: &Path) -> Option<Self> {
        if path.file_name().and_then(|n| n.to_str()) == Some(".env") {
            return Some(FileFormat::Env);
        }
        path.extension()
            .and_then(|s| s.to_str())
            .and_then(Self::from_extension)
    }
}

/// Configuration file loader
pub struct ConfigLoader {
    format: FileFormat,
}

impl ConfigLoader {
    pub fn new(format: FileFormat) -> Self {
        Self { format }
    }

    /// Auto-detect format from file extension
    pub fn auto(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = FileFormat::from_path(path).ok_or_else(|| {
            ConfigError::LoadError(format!("Unsupported format: {}", path.display()))
        })?;

        Ok(Self::new(format))
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    /// Load configuration from file
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Value> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::LoadError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        debug!(path = %path.display(), format = ?self.format, "Loaded configuration file");
        self.parse(&content)
    }

    /// Load a route file
    pub fn load_route_file(&self, path: impl AsRef<Path>) -> Result<RouteFile> {
        let value = self.load_file(path)?;
        self.route_file_from_value(value)
    }

    /// Parse a route file from string
    pub fn parse_route_file(&self, content: &str) -> Result<RouteFile> {
        let value = self.parse(content)?;
        self.route_file_from_value(value)
    }

    /// Parse configuration from string
    pub fn parse(&self, content: &str) -> Result<Value> {
        match self.format {
            FileFormat::Json => self.parse_json(content),
            FileFormat::Toml => self.parse_toml(content),
            FileFormat::Env => self.parse_env(content),
        }
    }

    fn route_file_from_value(&self, value: Value) -> Result<RouteFile> {
        match self.format {
            // `.env` files carry settings only
            FileFormat::Env => {
                let vars = env_settings(&value);
                let mut file = RouteFile::default();
                file.settings.apply_vars(&vars)?;
                Ok(file)
            }
            _ => serde_json::from_value(value)
                .map_err(|e| ConfigError::DeserializationError(e.to_string())),
        }
    }

    fn parse_json(&self, content: &str) -> Result<Value> {
        serde_json::from_str(content)
            .map_err(|e| ConfigError::ParseError(format!("JSON parse error: {}", e)))
    }

    fn parse_toml(&self, content: &str) -> Result<Value> {
        let toml_value: toml::Value = toml::from_str(content)
            .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;

        serde_json::to_value(toml_value)
            .map_err(|e| ConfigError::SerializationError(e.to_string()))
    }

    fn parse_env(&self, content: &str) -> Result<Value> {
        let mut map = serde_json::Map::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim().trim_start_matches("export ").trim();
                let value = value.trim().trim_matches('"').trim_matches('\'');
                map.insert(key.to_string(), Value::String(value.to_string()));
            }
        }

        Ok(Value::Object(map))
    }
}

/// `ROUTEWAY_TIMEOUT_SECS=30` becomes `timeout_secs = "30"`. Unprefixed keys
/// are kept as well, lowercased.
fn env_settings(value: &Value) -> HashMap<String, String> {
    let Some(map) = value.as_object() else {
        return HashMap::new();
    };

    map.iter()
        .filter_map(|(key, value)| {
            let value = value.as_str()?;
            let key = key.strip_prefix(crate::ENV_PREFIX).map_or(key.as_str(), |k| {
                k.trim_start_matches('_')
            });
            Some((key.to_lowercase(), value.to_string()))
        })
        .collect()
}
