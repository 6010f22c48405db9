use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;

/// Prefix for environment overrides, e.g. `LN__AJAX__LOADING_CLASS`.
pub const ENV_PREFIX: &str = "LN";
const DEFAULT_SOURCE: &str = "enhancers";

/// Custom error type for config loading.
#[ln_derive::ln_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Loads a configuration structure from a file layered with environment overrides.
///
/// 1. **Base File**: settings from `path` (any format the `config` crate detects from the
///    extension, e.g. `enhancers.toml`). Defaults to `"enhancers"` in the working directory.
/// 2. **Environment Overrides**: variables prefixed with `LN__`. Nested keys use double
///    underscores (`LN__TOAST__MAX_ITEMS` maps to `toast.max_items`).
///
/// # Errors
/// Returns [`ConfigError::Config`] when the file is missing, an override cannot be
/// parsed, or the merged values do not fit `T`.
///
/// # Example
/// ```rust
/// use ln_kernel::config::load_config;
/// use ln_kernel::domain::config::EnhancerConfig;
///
/// let cfg: EnhancerConfig = load_config(Some("config/enhancers")).unwrap_or_default();
/// assert_eq!(cfg.ajax.marker, "data-ln-ajax");
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let effective_path =
        path.map_or_else(|| PathBuf::from(DEFAULT_SOURCE), |p| p.as_ref().to_path_buf());

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(true))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .convert_case(config::Case::Snake),
        );

    info!("Loading enhancer config from {}", effective_path.display());

    let config = builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}
