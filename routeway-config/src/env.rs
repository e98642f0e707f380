// Environment variable loading

use crate::{ClientSettings, Result};
use std::collections::HashMap;
use std::env;

/// Environment variable loader
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    /// Create a new environment loader
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Loader for the `ROUTEWAY_` variables.
    pub fn routeway() -> Self {
        Self::new(Some(crate::ENV_PREFIX.to_string()))
    }

    /// Load all matching environment variables, keyed lowercase without the
    /// prefix.
    pub fn load(&self) -> Result<HashMap<String, String>> {
        let mut config = HashMap::new();

        for (key, value) in env::vars() {
            if let Some(ref prefix) = self.prefix {
                if let Some(rest) = key.strip_prefix(prefix.as_str())
                    && let Some(trimmed_key) = rest.strip_prefix('_')
                {
                    config.insert(trimmed_key.to_lowercase(), value);
                }
            } else {
                config.insert(key.to_lowercase(), value);
            }
        }

        Ok(config)
    }

    /// Override settings from the environment.
    pub fn apply(&self, settings: &mut ClientSettings) -> Result<()> {
        settings.apply_vars(&self.load()?)
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::routeway()
    }
}
