use crate::invoice::{editor, validation, MappingRules, ValidationRules};
use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE: &str = "invoice-review.toml";
pub const RC_FILE: &str = ".invoice-review-rc";
pub const ENV_PREFIX: &str = "INVOICE_REVIEW";

/// Main configuration structure for invoice-review
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InvoiceReviewConfig {
    /// Invoice API connection settings
    pub api: ApiConfig,
    /// Mapping step allow-lists
    pub mapping: MappingConfig,
    /// Validation step rules
    pub validation: ValidationConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Base URL of the invoice service
    pub base_url: String,
    /// Bearer token (can be set via env var)
    pub token: Option<String>,
    /// Per-request timeout
    pub timeout_seconds: u64,
    /// Accept self-signed certificates (local development servers)
    pub accept_invalid_certs: bool,
    /// Client-side rate limit
    pub requests_per_second: u32,
    /// Burst capacity on top of the rate limit
    pub burst_capacity: u32,
    /// How long GET responses are reused; 0 disables the cache
    pub cache_ttl_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://localhost:44307".to_string(),
            token: None,
            timeout_seconds: 30,
            accept_invalid_certs: false,
            requests_per_second: 5,
            burst_capacity: 10,
            cache_ttl_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MappingConfig {
    /// Root attributes that must be confirmed before leaving the mapping step
    pub allowed_fields: Vec<String>,
    /// Line item fields shown for nested items
    pub allowed_item_fields: Vec<String>,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            allowed_fields: to_strings(editor::DEFAULT_MAPPING_FIELDS),
            allowed_item_fields: to_strings(editor::DEFAULT_ITEM_FIELDS),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ValidationConfig {
    /// Attributes checked by the validation step
    pub allowed_fields: Vec<String>,
    /// Totals at or above this value fail validation
    pub total_ceiling: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        let rules = ValidationRules::default();
        Self {
            allowed_fields: rules.allowed_fields,
            total_ceiling: rules.total_ceiling,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Default log level when RUST_LOG is unset
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            json_logs: false,
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl From<&MappingConfig> for MappingRules {
    fn from(config: &MappingConfig) -> Self {
        MappingRules {
            allowed_fields: config.allowed_fields.clone(),
            allowed_item_fields: config.allowed_item_fields.clone(),
        }
    }
}

impl From<&ValidationConfig> for ValidationRules {
    fn from(config: &ValidationConfig) -> Self {
        ValidationRules {
            allowed_fields: config.allowed_fields.clone(),
            total_ceiling: config.total_ceiling,
        }
    }
}

impl InvoiceReviewConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (invoice-review.toml, .invoice-review-rc)
    /// 3. Environment variables (prefixed with INVOICE_REVIEW_, `__` between sections)
    pub fn load() -> Result<Self> {
        let mut files = Vec::new();
        if Path::new(CONFIG_FILE).exists() {
            files.push(Path::new(CONFIG_FILE));
        }
        if Path::new(RC_FILE).exists() {
            files.push(Path::new(RC_FILE));
        }
        Self::load_from(&files)
    }

    /// Load configuration layering the given files over the defaults
    pub fn load_from(files: &[&Path]) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        for file in files {
            builder = builder.add_source(File::from(*file).format(config::FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut loaded: InvoiceReviewConfig = builder.build()?.try_deserialize()?;

        if loaded.api.token.is_none() {
            if let Ok(token) = std::env::var("INVOICE_REVIEW_TOKEN") {
                loaded.api.token = Some(token);
            }
        }

        Ok(loaded)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }

    pub fn mapping_rules(&self) -> MappingRules {
        (&self.mapping).into()
    }

    pub fn validation_rules(&self) -> ValidationRules {
        (&self.validation).into()
    }
}
