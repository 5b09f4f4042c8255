//! Application configuration for leadpipe.
//!
//! User config lives at `~/.leadpipe/leadpipe.toml`. Every value has a
//! default, so the file is optional. API keys are never stored in the file;
//! each service section names the environment variable that holds its key.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{LeadPipeError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "leadpipe.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".leadpipe";

// ---------------------------------------------------------------------------
// Config structs (matching leadpipe.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Lead table service.
    #[serde(default)]
    pub airtable: AirtableConfig,

    /// Lead-sourcing service.
    #[serde(default = "ServiceConfig::prospety", deserialize_with = "prospety_section")]
    pub prospety: ServiceConfig,

    /// Chat completion service.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Channel video listing service.
    #[serde(default = "ServiceConfig::media", deserialize_with = "media_section")]
    pub media: ServiceConfig,

    /// Video transcript service.
    #[serde(default = "ServiceConfig::transcript", deserialize_with = "transcript_section")]
    pub transcript: ServiceConfig,

    /// Enrichment stage tuning.
    #[serde(default)]
    pub enrichment: EnrichmentSettings,

    /// Merge workflow settings.
    #[serde(default)]
    pub merge: MergeSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            airtable: AirtableConfig::default(),
            prospety: ServiceConfig::prospety(),
            openai: OpenAiConfig::default(),
            media: ServiceConfig::media(),
            transcript: ServiceConfig::transcript(),
            enrichment: EnrichmentSettings::default(),
            merge: MergeSettings::default(),
        }
    }
}

/// `[airtable]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirtableConfig {
    /// Name of the env var holding the API key.
    #[serde(default = "default_airtable_key_env")]
    pub api_key_env: String,

    /// Host override; the client default is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Base holding the lead table.
    #[serde(default = "default_base_id")]
    pub base_id: String,

    /// Lead table within the base.
    #[serde(default = "default_lead_table_id")]
    pub lead_table_id: String,

    /// Request budget per second.
    #[serde(default = "default_airtable_rate")]
    pub requests_per_second: u32,
}

impl Default for AirtableConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_airtable_key_env(),
            host: None,
            base_id: default_base_id(),
            lead_table_id: default_lead_table_id(),
            requests_per_second: default_airtable_rate(),
        }
    }
}

fn default_airtable_key_env() -> String {
    "AIRTABLE_KEY".into()
}
fn default_base_id() -> String {
    "appl2x7vwQfJClY42".into()
}
fn default_lead_table_id() -> String {
    "tblQcKRYGoq7kIxVN".into()
}
fn default_airtable_rate() -> u32 {
    5
}

/// Connection settings for a REST collaborator.
///
/// A partial section keeps the service's own default for every field it
/// leaves out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Name of the env var holding the API key.
    pub api_key_env: String,
    /// Service host, optionally with a path prefix.
    pub host: String,
    /// Request budget per second.
    pub requests_per_second: u32,
    /// Header carrying the raw key instead of `Authorization: Bearer`.
    /// An empty value selects bearer auth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_header: Option<String>,
    /// Static headers sent with every request.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl ServiceConfig {
    fn prospety() -> Self {
        Self {
            api_key_env: "PROSPETY_KEY".into(),
            host: "api.prospety.com/v1".into(),
            requests_per_second: default_service_rate(),
            api_key_header: None,
            headers: BTreeMap::new(),
        }
    }

    fn media() -> Self {
        Self::rapidapi("MEDIADOWNLOADER_KEY", "youtube-media-downloader.p.rapidapi.com", "/v2")
    }

    fn transcript() -> Self {
        Self::rapidapi("TRANSCRIPTOR_KEY", "youtube-transcriptor.p.rapidapi.com", "")
    }

    /// RapidAPI gateways take the key and the upstream host as headers.
    fn rapidapi(api_key_env: &str, authority: &str, prefix: &str) -> Self {
        Self {
            api_key_env: api_key_env.into(),
            host: format!("{authority}{prefix}"),
            requests_per_second: default_service_rate(),
            api_key_header: Some("X-RapidAPI-Key".into()),
            headers: BTreeMap::from([("X-RapidAPI-Host".to_string(), authority.to_string())]),
        }
    }

    /// Key header to use, if any. `None` means bearer auth.
    pub fn key_header(&self) -> Option<&str> {
        self.api_key_header.as_deref().filter(|h| !h.is_empty())
    }
}

/// Field-by-field overrides for a [`ServiceConfig`] section.
#[derive(Deserialize)]
struct ServiceOverrides {
    api_key_env: Option<String>,
    host: Option<String>,
    requests_per_second: Option<u32>,
    api_key_header: Option<String>,
    headers: Option<BTreeMap<String, String>>,
}

impl ServiceOverrides {
    fn apply(self, mut base: ServiceConfig) -> ServiceConfig {
        if let Some(v) = self.api_key_env {
            base.api_key_env = v;
        }
        if let Some(v) = self.host {
            base.host = v;
        }
        if let Some(v) = self.requests_per_second {
            base.requests_per_second = v;
        }
        if let Some(v) = self.api_key_header {
            base.api_key_header = Some(v);
        }
        if let Some(v) = self.headers {
            base.headers = v;
        }
        base
    }
}

fn section<'de, D: Deserializer<'de>>(
    deserializer: D,
    defaults: fn() -> ServiceConfig,
) -> std::result::Result<ServiceConfig, D::Error> {
    ServiceOverrides::deserialize(deserializer).map(|o| o.apply(defaults()))
}

fn prospety_section<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<ServiceConfig, D::Error> {
    section(d, ServiceConfig::prospety)
}

fn media_section<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<ServiceConfig, D::Error> {
    section(d, ServiceConfig::media)
}

fn transcript_section<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<ServiceConfig, D::Error> {
    section(d, ServiceConfig::transcript)
}

fn default_service_rate() -> u32 {
    5
}

/// `[openai]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Name of the env var holding the API key.
    #[serde(default = "default_openai_key_env")]
    pub api_key_env: String,

    /// API host.
    #[serde(default = "default_openai_host")]
    pub host: String,

    /// Chat model used for every completion.
    #[serde(default = "default_model")]
    pub model: String,

    /// Global completion budget per second, shared by all enrichment tasks.
    #[serde(default = "default_openai_rate")]
    pub requests_per_second: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_openai_key_env(),
            host: default_openai_host(),
            model: default_model(),
            requests_per_second: default_openai_rate(),
        }
    }
}

fn default_openai_key_env() -> String {
    "OPENAI_KEY".into()
}
fn default_openai_host() -> String {
    "api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-3.5-turbo".into()
}
fn default_openai_rate() -> u32 {
    3
}

/// `[enrichment]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentSettings {
    /// Only enrich leads assigned to this user name (all leads when absent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,

    /// Maximum transcript characters embedded in a prompt.
    #[serde(default = "default_transcript_budget")]
    pub transcript_budget: usize,

    /// Upper bound on concurrently running records (unbounded when absent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_in_flight: Option<usize>,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            assignee: None,
            transcript_budget: default_transcript_budget(),
            max_in_flight: None,
        }
    }
}

fn default_transcript_budget() -> usize {
    6_000
}

/// `[merge]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeSettings {
    /// User id assigned to newly created leads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,

    /// Platform single-select value for imported leads.
    #[serde(default = "default_platform")]
    pub platform: String,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            assignee_id: None,
            platform: default_platform(),
        }
    }
}

fn default_platform() -> String {
    "YouTube".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.leadpipe/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| LeadPipeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.leadpipe/leadpipe.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| LeadPipeError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| LeadPipeError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| LeadPipeError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| LeadPipeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| LeadPipeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read a required API key from the named environment variable.
///
/// A missing or empty variable is a configuration error.
pub fn require_api_key(var_name: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(LeadPipeError::config(format!(
            "{var_name} is required. Set the {var_name} environment variable."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("AIRTABLE_KEY"));
        assert!(toml_str.contains("PROSPETY_KEY"));
        assert!(toml_str.contains("transcript_budget"));
    }

    #[test]
    fn empty_file_yields_defaults() {
        let config: AppConfig = toml::from_str("").expect("parse");
        assert_eq!(config.airtable.requests_per_second, 5);
        assert_eq!(config.prospety.api_key_env, "PROSPETY_KEY");
        assert_eq!(config.openai.model, "gpt-3.5-turbo");
        assert_eq!(config.enrichment.transcript_budget, 6_000);
        assert!(config.enrichment.max_in_flight.is_none());
        assert_eq!(config.merge.platform, "YouTube");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let toml_str = r#"
[airtable]
host = "localhost:8080/v0"
requests_per_second = 2

[enrichment]
assignee = "Jordan Doe"
max_in_flight = 8
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.airtable.host.as_deref(), Some("localhost:8080/v0"));
        assert_eq!(config.airtable.requests_per_second, 2);
        assert_eq!(config.airtable.api_key_env, "AIRTABLE_KEY");
        assert_eq!(config.enrichment.assignee.as_deref(), Some("Jordan Doe"));
        assert_eq!(config.enrichment.max_in_flight, Some(8));
        assert_eq!(config.enrichment.transcript_budget, 6_000);
    }

    #[test]
    fn partial_service_section_keeps_service_defaults() {
        let toml_str = r#"
[media]
requests_per_second = 2

[prospety]
host = "localhost:9000/v1"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.media.requests_per_second, 2);
        assert_eq!(config.media.api_key_env, "MEDIADOWNLOADER_KEY");
        assert_eq!(config.media.host, "youtube-media-downloader.p.rapidapi.com/v2");
        assert_eq!(config.media.key_header(), Some("X-RapidAPI-Key"));
        assert_eq!(config.prospety.host, "localhost:9000/v1");
        assert_eq!(config.prospety.api_key_env, "PROSPETY_KEY");
        assert_eq!(config.prospety.key_header(), None);
        assert_eq!(config.transcript.api_key_env, "TRANSCRIPTOR_KEY");
    }

    #[test]
    fn rapidapi_sections_send_gateway_headers() {
        let config = AppConfig::default();
        assert_eq!(
            config.transcript.headers.get("X-RapidAPI-Host").map(String::as_str),
            Some("youtube-transcriptor.p.rapidapi.com")
        );

        let toml_str = "[transcript]\napi_key_header = \"\"\nheaders = {}\n";
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.transcript.key_header(), None);
        assert!(config.transcript.headers.is_empty());
        assert_eq!(config.transcript.host, "youtube-transcriptor.p.rapidapi.com");
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.airtable.base_id, config.airtable.base_id);
        assert_eq!(parsed.transcript.host, config.transcript.host);
        assert_eq!(parsed.media.headers, config.media.headers);
    }

    #[test]
    fn missing_api_key_is_config_error() {
        // Use a unique env var name to avoid interfering with other tests
        let err = require_api_key("LEADPIPE_TEST_NONEXISTENT_KEY_12345").unwrap_err();
        assert!(matches!(err, LeadPipeError::Config { .. }));
        assert!(err.to_string().contains("LEADPIPE_TEST_NONEXISTENT_KEY_12345 is required"));
    }
}
