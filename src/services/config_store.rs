// Configuration Storage Service
// Tunable thresholds, gateway settings and API keys, persisted as JSON with rolling backups

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_VERSION: &str = "1";
const MAX_BACKUPS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub humanizer: HumanizerConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub proxy: Option<ProxyConfig>,
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    #[serde(default)]
    pub api_keys: HashMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            gateway: GatewayConfig::default(),
            humanizer: HumanizerConfig::default(),
            detector: DetectorConfig::default(),
            proxy: None,
            providers: HashMap::new(),
            api_keys: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    pub enabled: bool,
    pub http: Option<String>,
    pub https: Option<String>,
}

impl ProxyConfig {
    pub fn active_url(&self) -> Option<&str> {
        if !self.enabled {
            return None;
        }
        self.https.as_deref().or(self.http.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Used when the provider spec names no model.
    pub model: Option<String>,
    pub base_url: Option<String>,
}

/// Text generation gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// `provider[:model]`, e.g. `openai:gpt-4o-mini`.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: i32,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            max_tokens: default_max_tokens(),
            http_timeout_secs: default_http_timeout_secs(),
        }
    }
}

/// Rewrite orchestration limits. All thresholds are tunable; the defaults
/// reproduce the consolidated policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanizerConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// A valid candidate scoring below this ends the loop early.
    #[serde(default = "default_ai_threshold")]
    pub ai_threshold: u8,
    /// Baseline probability at which single-sentence anti-ai input must change.
    #[serde(default = "default_force_rewrite_min_probability")]
    pub force_rewrite_min_probability: u8,
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
    #[serde(default = "default_min_input_chars")]
    pub min_input_chars: usize,
    #[serde(default = "default_anti_ai_min_input_chars")]
    pub anti_ai_min_input_chars: usize,
    #[serde(default = "default_min_length_ratio")]
    pub min_length_ratio: f64,
    #[serde(default = "default_gateway_timeout_secs")]
    pub gateway_timeout_secs: u64,
    #[serde(default = "default_detect_min_words")]
    pub detect_min_words: usize,
    #[serde(default = "default_insights_min_words")]
    pub insights_min_words: usize,
    #[serde(default = "default_max_concurrent_generations")]
    pub max_concurrent_generations: usize,
}

impl Default for HumanizerConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            ai_threshold: default_ai_threshold(),
            force_rewrite_min_probability: default_force_rewrite_min_probability(),
            max_input_chars: default_max_input_chars(),
            min_input_chars: default_min_input_chars(),
            anti_ai_min_input_chars: default_anti_ai_min_input_chars(),
            min_length_ratio: default_min_length_ratio(),
            gateway_timeout_secs: default_gateway_timeout_secs(),
            detect_min_words: default_detect_min_words(),
            insights_min_words: default_insights_min_words(),
            max_concurrent_generations: default_max_concurrent_generations(),
        }
    }
}

impl HumanizerConfig {
    /// Retry budget clamped into [1, 5].
    pub fn effective_max_retries(&self) -> u32 {
        self.max_retries.clamp(1, 5)
    }
}

/// Verdict and confidence cut-offs for the heuristic detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectorConfig {
    #[serde(default = "default_likely_ai")]
    pub likely_ai: u8,
    #[serde(default = "default_mixed")]
    pub mixed: u8,
    #[serde(default = "default_confidence_low_words")]
    pub confidence_low_words: usize,
    #[serde(default = "default_confidence_medium_words")]
    pub confidence_medium_words: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            likely_ai: default_likely_ai(),
            mixed: default_mixed(),
            confidence_low_words: default_confidence_low_words(),
            confidence_medium_words: default_confidence_medium_words(),
        }
    }
}

fn default_version() -> String { CONFIG_VERSION.to_string() }
fn default_provider() -> String { "openai:gpt-4o-mini".to_string() }
fn default_max_tokens() -> i32 { 4000 }
fn default_http_timeout_secs() -> u64 { 80 }
fn default_max_retries() -> u32 { 3 }
fn default_ai_threshold() -> u8 { 55 }
fn default_force_rewrite_min_probability() -> u8 { 40 }
fn default_max_input_chars() -> usize { 5000 }
fn default_min_input_chars() -> usize { 20 }
fn default_anti_ai_min_input_chars() -> usize { 10 }
fn default_min_length_ratio() -> f64 { 0.7 }
fn default_gateway_timeout_secs() -> u64 { 60 }
fn default_detect_min_words() -> usize { 50 }
fn default_insights_min_words() -> usize { 40 }
fn default_max_concurrent_generations() -> usize { 4 }
fn default_likely_ai() -> u8 { 70 }
fn default_mixed() -> u8 { 40 }
fn default_confidence_low_words() -> usize { 80 }
fn default_confidence_medium_words() -> usize { 200 }

pub struct ConfigStore {
    config_dir: PathBuf,
    config_file: PathBuf,
}

impl ConfigStore {
    pub fn new(config_dir: PathBuf) -> Self {
        let config_file = config_dir.join("config.json");
        Self { config_dir, config_file }
    }

    /// Get default config directory
    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("humanizer"))
    }

    /// Store at the default location, if the platform has one.
    pub fn open_default() -> Option<Self> {
        Self::default_config_dir().map(Self::new)
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Ensure config directory exists
    pub fn ensure_dir(&self) -> Result<(), String> {
        fs::create_dir_all(&self.config_dir)
            .map_err(|e| format!("Failed to create config dir: {}", e))
    }

    /// Load configuration; a missing file yields defaults.
    pub fn load(&self) -> Result<AppConfig, String> {
        if !self.config_file.exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_file)
            .map_err(|e| format!("Failed to read config: {}", e))?;

        serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config: {}", e))
    }

    /// Save configuration, backing up the previous file first.
    pub fn save(&self, config: &AppConfig) -> Result<(), String> {
        self.ensure_dir()?;

        if self.config_file.exists() {
            self.create_backup()?;
        }

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(&self.config_file, content)
            .map_err(|e| format!("Failed to write config: {}", e))
    }

    fn backup_dir(&self) -> PathBuf {
        self.config_dir.join("backups")
    }

    fn create_backup(&self) -> Result<(), String> {
        let backup_dir = self.backup_dir();
        fs::create_dir_all(&backup_dir)
            .map_err(|e| format!("Failed to create backup dir: {}", e))?;

        // Millisecond stamp so two saves within one second keep separate backups.
        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S_%3f");
        let backup_file = backup_dir.join(format!("config_{}.json", timestamp));

        fs::copy(&self.config_file, &backup_file)
            .map_err(|e| format!("Failed to create backup: {}", e))?;

        self.cleanup_old_backups(&backup_dir, MAX_BACKUPS)
    }

    /// Remove old backups, keeping only the most recent `keep`.
    fn cleanup_old_backups(&self, backup_dir: &Path, keep: usize) -> Result<(), String> {
        let mut entries: Vec<_> = fs::read_dir(backup_dir)
            .map_err(|e| format!("Failed to read backup dir: {}", e))?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
            .collect();

        if entries.len() <= keep {
            return Ok(());
        }

        // File names carry the timestamp, so name order is age order.
        entries.sort_by_key(|e| e.file_name());

        let remove_count = entries.len() - keep;
        for entry in entries.iter().take(remove_count) {
            let _ = fs::remove_file(entry.path());
        }

        Ok(())
    }

    pub fn get_api_key(&self, provider: &str) -> Result<Option<String>, String> {
        let config = self.load()?;
        Ok(config.api_keys.get(provider).cloned())
    }

    pub fn set_api_key(&self, provider: &str, key: &str) -> Result<(), String> {
        let mut config = self.load()?;
        config.api_keys.insert(provider.to_string(), key.to_string());
        self.save(&config)
    }

    pub fn delete_api_key(&self, provider: &str) -> Result<(), String> {
        let mut config = self.load()?;
        config.api_keys.remove(provider);
        self.save(&config)
    }

    pub fn get_provider_url(&self, provider: &str) -> Result<Option<String>, String> {
        let config = self.load()?;
        Ok(config.providers.get(provider).and_then(|p| p.base_url.clone()))
    }

    pub fn set_provider_url(&self, provider: &str, url: &str) -> Result<(), String> {
        let mut config = self.load()?;
        let provider_config = config.providers.entry(provider.to_string()).or_default();
        provider_config.base_url = Some(url.to_string());
        self.save(&config)
    }
}
