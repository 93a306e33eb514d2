//! Harvester configuration.
//!
//! User config lives at `~/.entidades/entidades.toml`. CLI flags override
//! config file values, which override defaults. All of it is merged into one
//! immutable [`RunConfig`] at startup; nothing is reconfigured at runtime.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{EntidadesError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "entidades.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".entidades";

// ---------------------------------------------------------------------------
// Config structs (matching entidades.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// The directory being harvested.
    #[serde(default)]
    pub target: TargetConfig,

    /// Run defaults.
    #[serde(default)]
    pub run: RunDefaults,

    /// Per-call browser timeouts.
    #[serde(default)]
    pub timeouts: TimeoutsConfig,

    /// Retry and throttle policy.
    #[serde(default)]
    pub retry: RetryConfig,
}

/// `[target]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Listing base URL. Pages are addressed as
    /// `{base_url}?order_last_process=desc&page={n}`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Known catalog size, in entities.
    #[serde(default = "default_entity_count")]
    pub entity_count: u32,

    /// Entities per listing page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            entity_count: default_entity_count(),
            page_size: default_page_size(),
        }
    }
}

fn default_base_url() -> String {
    "https://contratacionesabiertas.osce.gob.pe/entidades".into()
}
fn default_entity_count() -> u32 {
    3292
}
fn default_page_size() -> u32 {
    10
}

/// `[run]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunDefaults {
    /// Worker pool size.
    #[serde(default = "default_workers")]
    pub workers: u32,

    /// Output CSV path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Run the browsers headless.
    #[serde(default = "default_true")]
    pub headless: bool,
}

impl Default for RunDefaults {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            output: default_output(),
            headless: true,
        }
    }
}

fn default_workers() -> u32 {
    8
}
fn default_output() -> String {
    "entidades.csv".into()
}
fn default_true() -> bool {
    true
}

/// `[timeouts]` section, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    /// Budget for one navigation.
    #[serde(default = "default_navigation_ms")]
    pub navigation_ms: u64,

    /// Budget for document-ready and selector waits.
    #[serde(default = "default_ready_ms")]
    pub ready_ms: u64,

    /// Budget for spotting the onboarding overlay.
    #[serde(default = "default_overlay_ms")]
    pub overlay_ms: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            navigation_ms: default_navigation_ms(),
            ready_ms: default_ready_ms(),
            overlay_ms: default_overlay_ms(),
        }
    }
}

fn default_navigation_ms() -> u64 {
    45_000
}
fn default_ready_ms() -> u64 {
    45_000
}
fn default_overlay_ms() -> u64 {
    5_000
}

/// `[retry]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts per detail page before giving up on it.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Pause between failed attempts, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Pause between entity visits, in milliseconds.
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            throttle_ms: default_throttle_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    5_000
}
fn default_throttle_ms() -> u64 {
    1_000
}

// ---------------------------------------------------------------------------
// Run config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime run configuration — merged from config file + CLI flags,
/// constructed once at startup and passed explicitly into the engine.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Listing base URL.
    pub base_url: Url,
    /// Listing pages to cover, `[1, total_pages]`.
    pub total_pages: u32,
    /// Worker pool size.
    pub worker_count: u32,
    /// Budget for one navigation.
    pub navigation_timeout: Duration,
    /// Budget for document-ready and selector waits.
    pub ready_timeout: Duration,
    /// Budget for spotting the onboarding overlay.
    pub overlay_timeout: Duration,
    /// Attempts per detail page before giving up on it.
    pub max_attempts: u32,
    /// Pause between failed attempts.
    pub retry_delay: Duration,
    /// Pause between entity visits.
    pub throttle_delay: Duration,
}

impl RunConfig {
    /// Merge file config with CLI overrides.
    ///
    /// `max_pages` replaces the catalog-derived page count for reduced test
    /// runs; `workers` overrides the configured pool size.
    pub fn resolve(
        config: &AppConfig,
        workers: Option<u32>,
        max_pages: Option<u32>,
    ) -> Result<Self> {
        let base_url = Url::parse(&config.target.base_url).map_err(|e| {
            EntidadesError::config(format!(
                "invalid base_url '{}': {e}",
                config.target.base_url
            ))
        })?;

        let catalog_pages = config
            .target
            .entity_count
            .div_ceil(config.target.page_size.max(1));

        let resolved = Self {
            base_url,
            total_pages: max_pages.unwrap_or(catalog_pages),
            worker_count: workers.unwrap_or(config.run.workers),
            navigation_timeout: Duration::from_millis(config.timeouts.navigation_ms),
            ready_timeout: Duration::from_millis(config.timeouts.ready_ms),
            overlay_timeout: Duration::from_millis(config.timeouts.overlay_ms),
            max_attempts: config.retry.max_attempts,
            retry_delay: Duration::from_millis(config.retry.retry_delay_ms),
            throttle_delay: Duration::from_millis(config.retry.throttle_ms),
        };

        resolved.validate()?;
        Ok(resolved)
    }

    /// Reject degenerate scalar values before any work is scheduled.
    pub fn validate(&self) -> Result<()> {
        if self.total_pages == 0 {
            return Err(EntidadesError::validation("total pages must be at least 1"));
        }
        if self.worker_count == 0 {
            return Err(EntidadesError::validation("worker count must be at least 1"));
        }
        if self.max_attempts == 0 {
            return Err(EntidadesError::validation("max attempts must be at least 1"));
        }
        Ok(())
    }

    /// Listing URL for page `n` (n ≥ 1), ordered by most recent process.
    pub fn listing_url(&self, page: u32) -> String {
        format!("{}?order_last_process=desc&page={page}", self.base_url)
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.entidades/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| EntidadesError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.entidades/entidades.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does
/// not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| EntidadesError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| EntidadesError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| EntidadesError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| EntidadesError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| EntidadesError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("base_url"));
        assert!(toml_str.contains("max_attempts"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.run.workers, 8);
        assert_eq!(parsed.retry.max_attempts, 3);
        assert_eq!(parsed.timeouts.navigation_ms, 45_000);
    }

    #[test]
    fn catalog_size_divides_into_pages() {
        let config = AppConfig::default();
        let run = RunConfig::resolve(&config, None, None).expect("resolve");
        // 3292 entities at 10 per page, rounded up.
        assert_eq!(run.total_pages, 330);
        assert_eq!(run.worker_count, 8);
    }

    #[test]
    fn overrides_replace_configured_values() {
        let config = AppConfig::default();
        let run = RunConfig::resolve(&config, Some(2), Some(2)).expect("resolve");
        assert_eq!(run.total_pages, 2);
        assert_eq!(run.worker_count, 2);
    }

    #[test]
    fn zero_workers_rejected() {
        let config = AppConfig::default();
        let err = RunConfig::resolve(&config, Some(0), None).unwrap_err();
        assert!(err.to_string().contains("worker count"));
    }

    #[test]
    fn bad_base_url_rejected() {
        let mut config = AppConfig::default();
        config.target.base_url = "not a url".into();
        assert!(RunConfig::resolve(&config, None, None).is_err());
    }

    #[test]
    fn listing_url_reproduces_target_contract() {
        let config = AppConfig::default();
        let run = RunConfig::resolve(&config, None, None).expect("resolve");
        assert_eq!(
            run.listing_url(7),
            "https://contratacionesabiertas.osce.gob.pe/entidades?order_last_process=desc&page=7"
        );
    }
}
