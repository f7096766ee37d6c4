use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub supabase: SupabaseConfig,

    #[serde(default)]
    pub loader: LoaderConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

/// Destination datastore (Supabase / PostgREST) configuration.
///
/// `url` and `service_key` have no defaults on purpose: credentials come from
/// the environment or a local config file, never from source literals.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SupabaseConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub service_key: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Upsert loader configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoaderConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    #[serde(default)]
    pub upsert_key: UpsertKey,
}

/// Natural key used for the broker upsert. `name` is the legacy variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertKey {
    #[default]
    Slug,
    Name,
}

impl UpsertKey {
    pub fn column(&self) -> &'static str {
        match self {
            UpsertKey::Slug => "slug",
            UpsertKey::Name => "name",
        }
    }
}

/// Report artifact configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportConfig {
    #[serde(default = "default_report_dir")]
    pub dir: PathBuf,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    "fxbroker-etl/0.1 (broker data pipeline)".to_string()
}
fn default_batch_size() -> usize {
    10
}
fn default_batch_delay_ms() -> u64 {
    500
}
fn default_report_dir() -> PathBuf {
    PathBuf::from("reports")
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            service_key: String::new(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            upsert_key: UpsertKey::Slug,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { dir: default_report_dir() }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("FXB").separator("__"))
            .build()?;

        cfg.try_deserialize().context("invalid configuration")
    }
}

impl SupabaseConfig {
    /// Fail fast before any network work when credentials are absent.
    pub fn ensure_credentials(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            bail!("supabase.url is not set (FXB__SUPABASE__URL)");
        }
        if self.service_key.trim().is_empty() {
            bail!("supabase.service_key is not set (FXB__SUPABASE__SERVICE_KEY)");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_required() {
        let cfg = SupabaseConfig::default();
        assert!(cfg.ensure_credentials().is_err());

        let cfg = SupabaseConfig {
            url: "https://example.supabase.co".into(),
            service_key: "key".into(),
            ..SupabaseConfig::default()
        };
        assert!(cfg.ensure_credentials().is_ok());
    }

    #[test]
    fn test_loader_defaults() {
        let cfg = LoaderConfig::default();
        assert_eq!(cfg.batch_size, 10);
        assert_eq!(cfg.batch_delay_ms, 500);
        assert_eq!(cfg.upsert_key, UpsertKey::Slug);
    }
}
