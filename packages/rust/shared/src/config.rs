//! Application configuration for the training catalog.
//!
//! User config lives at `~/.trainingcatalog/trainingcatalog.toml`.
//! CLI flags override config file values, which override defaults.
//! Core components never read the config file or the environment; they
//! receive an immutable [`Settings`] (and, for searchers, [`Credentials`]).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrainingCatalogError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "trainingcatalog.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".trainingcatalog";

// ---------------------------------------------------------------------------
// Config structs (matching trainingcatalog.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Outbound HTTP behaviour.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Catalog admission threshold.
    #[serde(default)]
    pub quality: QualityConfig,

    /// Curriculum assembly constraints.
    #[serde(default)]
    pub curriculum: CurriculumConfig,

    /// On-disk locations.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Search provider credentials (env var names) and limits.
    #[serde(default)]
    pub search: SearchConfig,
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Global ceiling on in-flight requests.
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Requests per second allowed against any single host.
    #[serde(default = "default_rate_limit_per_second")]
    pub rate_limit_per_second: f64,

    /// Per-host overrides of `rate_limit_per_second`.
    #[serde(default)]
    pub host_rate_limits: BTreeMap<String, f64>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: default_max_concurrent_requests(),
            request_timeout_secs: default_request_timeout_secs(),
            rate_limit_per_second: default_rate_limit_per_second(),
            host_rate_limits: BTreeMap::new(),
        }
    }
}

fn default_max_concurrent_requests() -> usize {
    10
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_rate_limit_per_second() -> f64 {
    2.0
}

/// `[quality]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Resources scoring below this are never admitted to the catalog.
    #[serde(default = "default_min_quality_score")]
    pub min_quality_score: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_quality_score: default_min_quality_score(),
        }
    }
}

fn default_min_quality_score() -> f64 {
    0.3
}

/// `[curriculum]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurriculumConfig {
    #[serde(default = "default_max_resources_per_module")]
    pub max_resources_per_module: usize,

    /// Upper bound on a beginner path's total hours.
    #[serde(default = "default_max_hours_beginner_path")]
    pub max_hours_beginner_path: f64,

    /// Largest share of a path any single provider may take.
    #[serde(default = "default_provider_diversity_cap")]
    pub provider_diversity_cap: f64,
}

impl Default for CurriculumConfig {
    fn default() -> Self {
        Self {
            max_resources_per_module: default_max_resources_per_module(),
            max_hours_beginner_path: default_max_hours_beginner_path(),
            provider_diversity_cap: default_provider_diversity_cap(),
        }
    }
}

fn default_max_resources_per_module() -> usize {
    5
}
fn default_max_hours_beginner_path() -> f64 {
    20.0
}
fn default_provider_diversity_cap() -> f64 {
    0.4
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    #[serde(default = "default_curricula_dir")]
    pub curricula_dir: String,

    /// Optional JSON file with contextualization tables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_library: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            catalog_path: default_catalog_path(),
            curricula_dir: default_curricula_dir(),
            context_library: None,
        }
    }
}

fn default_data_dir() -> String {
    "data".into()
}
fn default_catalog_path() -> String {
    "data/catalog.json".into()
}
fn default_curricula_dir() -> String {
    "data/curricula".into()
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Name of the env var holding the Google API key (never store the key itself).
    #[serde(default = "default_google_api_key_env")]
    pub google_api_key_env: String,

    /// Name of the env var holding the Programmable Search engine id.
    #[serde(default = "default_google_cse_id_env")]
    pub google_cse_id_env: String,

    /// Name of the env var holding an optional GitHub token.
    #[serde(default = "default_github_token_env")]
    pub github_token_env: String,

    /// Default number of results requested per query.
    #[serde(default = "default_max_results_per_query")]
    pub max_results_per_query: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            google_api_key_env: default_google_api_key_env(),
            google_cse_id_env: default_google_cse_id_env(),
            github_token_env: default_github_token_env(),
            max_results_per_query: default_max_results_per_query(),
        }
    }
}

fn default_google_api_key_env() -> String {
    "ATC_GOOGLE_API_KEY".into()
}
fn default_google_cse_id_env() -> String {
    "ATC_GOOGLE_CSE_ID".into()
}
fn default_github_token_env() -> String {
    "ATC_GITHUB_TOKEN".into()
}
fn default_max_results_per_query() -> usize {
    10
}

/// Slowest non-zero per-host rate accepted (one request every ~17 minutes).
pub const MIN_RATE_PER_SECOND: f64 = 0.001;

/// `0` disables spacing; anything else must be a usable rate.
fn rate_is_valid(rate: f64) -> bool {
    rate == 0.0 || (rate.is_finite() && rate >= MIN_RATE_PER_SECOND)
}

impl AppConfig {
    /// Reject values that would make the pipeline misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.max_concurrent_requests == 0 {
            return Err(TrainingCatalogError::config(
                "fetch.max_concurrent_requests must be at least 1",
            ));
        }
        if self.fetch.request_timeout_secs == 0 {
            return Err(TrainingCatalogError::config(
                "fetch.request_timeout_secs must be at least 1",
            ));
        }
        if !rate_is_valid(self.fetch.rate_limit_per_second) {
            return Err(TrainingCatalogError::config(format!(
                "fetch.rate_limit_per_second must be 0 or at least {MIN_RATE_PER_SECOND}"
            )));
        }
        if let Some((host, _)) = self
            .fetch
            .host_rate_limits
            .iter()
            .find(|(_, rate)| !rate_is_valid(**rate))
        {
            return Err(TrainingCatalogError::config(format!(
                "fetch.host_rate_limits.\"{host}\" must be 0 or at least {MIN_RATE_PER_SECOND}"
            )));
        }
        if !(0.0..=1.0).contains(&self.quality.min_quality_score) {
            return Err(TrainingCatalogError::config(
                "quality.min_quality_score must be within [0, 1]",
            ));
        }
        if self.curriculum.max_resources_per_module == 0 {
            return Err(TrainingCatalogError::config(
                "curriculum.max_resources_per_module must be at least 1",
            ));
        }
        let cap = self.curriculum.provider_diversity_cap;
        if !(cap > 0.0 && cap <= 1.0) {
            return Err(TrainingCatalogError::config(
                "curriculum.provider_diversity_cap must be within (0, 1]",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Runtime settings (immutable, injected into every component)
// ---------------------------------------------------------------------------

/// Immutable runtime settings derived from [`AppConfig`] plus CLI overrides.
#[derive(Debug, Clone)]
pub struct Settings {
    pub max_concurrent_requests: usize,
    pub request_timeout: Duration,
    pub rate_limit_per_second: f64,
    pub host_rate_limits: BTreeMap<String, f64>,
    pub min_quality_score: f64,
    pub max_resources_per_module: usize,
    pub max_hours_beginner_path: f64,
    pub provider_diversity_cap: f64,
    pub max_results_per_query: usize,
    pub data_dir: PathBuf,
    pub catalog_path: PathBuf,
    pub curricula_dir: PathBuf,
    pub context_library: Option<PathBuf>,
}

impl From<&AppConfig> for Settings {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_concurrent_requests: config.fetch.max_concurrent_requests,
            request_timeout: Duration::from_secs(config.fetch.request_timeout_secs),
            rate_limit_per_second: config.fetch.rate_limit_per_second,
            host_rate_limits: config.fetch.host_rate_limits.clone(),
            min_quality_score: config.quality.min_quality_score,
            max_resources_per_module: config.curriculum.max_resources_per_module,
            max_hours_beginner_path: config.curriculum.max_hours_beginner_path,
            provider_diversity_cap: config.curriculum.provider_diversity_cap,
            max_results_per_query: config.search.max_results_per_query,
            data_dir: PathBuf::from(&config.storage.data_dir),
            catalog_path: PathBuf::from(&config.storage.catalog_path),
            curricula_dir: PathBuf::from(&config.storage.curricula_dir),
            context_library: config.storage.context_library.as_ref().map(PathBuf::from),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl Settings {
    /// Settings with every storage path rooted under `dir`.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.catalog_path = dir.join("catalog.json");
        self.curricula_dir = dir.join("curricula");
        self.data_dir = dir;
        self
    }
}

/// Search provider secrets, resolved from the environment at the CLI boundary.
#[derive(Clone, Default)]
pub struct Credentials {
    pub google_api_key: Option<String>,
    pub google_cse_id: Option<String>,
    pub github_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Credentials")
            .field("google_api_key", &mask(&self.google_api_key))
            .field("google_cse_id", &mask(&self.google_cse_id))
            .field("github_token", &mask(&self.github_token))
            .finish()
    }
}

impl Credentials {
    /// Read the env vars named in `[search]`. Empty values count as unset.
    pub fn from_env(search: &SearchConfig) -> Self {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            google_api_key: read(&search.google_api_key_env),
            google_cse_id: read(&search.google_cse_id_env),
            github_token: read(&search.github_token_env),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.trainingcatalog/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| TrainingCatalogError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.trainingcatalog/trainingcatalog.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
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
    let content = std::fs::read_to_string(path).map_err(|e| TrainingCatalogError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        TrainingCatalogError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Write a default config file at `path`, creating parent directories.
pub fn write_default_config(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| TrainingCatalogError::io(dir, e))?;
    }
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| TrainingCatalogError::config(e.to_string()))?;
    std::fs::write(path, content).map_err(|e| TrainingCatalogError::io(path, e))?;
    tracing::info!(?path, "created default config file");
    Ok(())
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let path = config_file_path()?;
    write_default_config(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("max_concurrent_requests"));
        assert!(toml_str.contains("ATC_GITHUB_TOKEN"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.fetch.max_concurrent_requests, 10);
        assert_eq!(parsed.curriculum.max_resources_per_module, 5);
        assert_eq!(parsed.search.google_api_key_env, "ATC_GOOGLE_API_KEY");
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let toml_str = r#"
[fetch]
rate_limit_per_second = 0.5

[fetch.host_rate_limits]
"api.github.com" = 1.0

[storage]
data_dir = "/tmp/atc"
context_library = "/tmp/atc/rural.json"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.fetch.rate_limit_per_second, 0.5);
        assert_eq!(config.fetch.request_timeout_secs, 30);
        assert_eq!(config.fetch.host_rate_limits.get("api.github.com"), Some(&1.0));
        assert_eq!(config.storage.catalog_path, "data/catalog.json");

        let settings = Settings::from(&config);
        assert_eq!(settings.context_library, Some(PathBuf::from("/tmp/atc/rural.json")));
    }

    #[test]
    fn settings_from_app_config() {
        let settings = Settings::from(&AppConfig::default());
        assert_eq!(settings.max_concurrent_requests, 10);
        assert_eq!(settings.request_timeout, Duration::from_secs(30));
        assert_eq!(settings.rate_limit_per_second, 2.0);
        assert_eq!(settings.min_quality_score, 0.3);
        assert_eq!(settings.max_hours_beginner_path, 20.0);
        assert_eq!(settings.provider_diversity_cap, 0.4);
        assert_eq!(settings.catalog_path, PathBuf::from("data/catalog.json"));

        let rooted = settings.with_data_dir("/tmp/x");
        assert_eq!(rooted.curricula_dir, PathBuf::from("/tmp/x/curricula"));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.curriculum.provider_diversity_cap = 0.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.quality.min_quality_score = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_rejects_unusable_fetch_limits() {
        let mut config = AppConfig::default();
        config.fetch.request_timeout_secs = 0;
        assert!(config.validate().is_err());

        for rate in [1e-20, -1.0, f64::NAN, f64::INFINITY] {
            let mut config = AppConfig::default();
            config.fetch.rate_limit_per_second = rate;
            assert!(config.validate().is_err(), "rate {rate} accepted");
        }

        let mut config = AppConfig::default();
        config.fetch.host_rate_limits.insert("slow.example".into(), 1e-20);
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("slow.example"));

        let mut config = AppConfig::default();
        config.fetch.rate_limit_per_second = 0.0;
        config.fetch.host_rate_limits.insert("slow.example".into(), MIN_RATE_PER_SECOND);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn credentials_from_unset_env() {
        let mut search = SearchConfig::default();
        // Unique names so other tests cannot interfere.
        search.google_api_key_env = "ATC_TEST_NONEXISTENT_KEY_12345".into();
        search.google_cse_id_env = "ATC_TEST_NONEXISTENT_CSE_12345".into();
        search.github_token_env = "ATC_TEST_NONEXISTENT_TOKEN_12345".into();
        let creds = Credentials::from_env(&search);
        assert!(creds.google_api_key.is_none());
        assert!(creds.github_token.is_none());
        assert!(format!("{creds:?}").contains("<unset>"));
    }

    #[test]
    fn write_and_load_default_config() {
        let dir = std::env::temp_dir().join(format!("atc-config-{}", uuid::Uuid::now_v7()));
        let path = dir.join("nested").join(CONFIG_FILE_NAME);
        write_default_config(&path).expect("write");
        let loaded = load_config_from(&path).expect("load");
        assert_eq!(loaded.search.max_results_per_query, 10);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
