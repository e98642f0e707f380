//! Route table and client settings loading for routeway.
//!
//! A route file is read from TOML, JSON or `.env` (settings only), then
//! `ROUTEWAY_*` environment variables override its `[settings]`.
//!
//! ```no_run
//! let file = routeway_config::load("routeway.toml")?;
//! let (config, table, probe) = file.into_parts()?;
//! # Ok::<(), routeway_config::ConfigError>(())
//! ```

pub mod env;
pub mod error;
pub mod loader;
pub mod settings;

pub use env::EnvLoader;
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use settings::{ClientSettings, RouteFile, RouteSpec};

use std::path::Path;
use tracing::debug;

/// Prefix of the environment variables that override settings.
pub const ENV_PREFIX: &str = "ROUTEWAY";

/// Load a route file, then apply `.env` and `ROUTEWAY_*` overrides.
pub fn load(path: impl AsRef<Path>) -> Result<RouteFile> {
    if dotenvy::dotenv().is_ok() {
        debug!("Loaded .env from working directory");
    }
    load_with(path, &EnvLoader::routeway())
}

/// Load a route file and apply overrides from `env`.
pub fn load_with(path: impl AsRef<Path>, env: &EnvLoader) -> Result<RouteFile> {
    let path = path.as_ref();
    let mut file = ConfigLoader::auto(path)?.load_route_file(path)?;
    env.apply(&mut file.settings)?;
    Ok(file)
}
