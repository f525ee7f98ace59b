use crate::service_url::Environment;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub project: ProjectConfig,
    pub api: ApiConfig,
    pub billing: BillingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project identifier used in API calls
    pub app_id: Option<String>,
    /// Project subdomain, e.g. "mxyqdrrfbmtrsxplpelv"
    pub subdomain: String,
    /// Project region, e.g. "eu-central-1" (empty for local projects)
    pub region: String,
    pub environment: Environment,
    /// Port override for locally running backends
    pub local_backend_port: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the project configuration API
    pub base_url: String,
    /// Admin secret sent as a header on every request
    pub admin_secret: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    /// Base plan price in $/month
    pub plan_price: f64,
    /// Dedicated compute price in $/vCPU/month
    pub vcpu_price: f64,
}

/// Where the pending allocation state file lives by default.
pub const DEFAULT_STATE_FILE: &str = ".computectl-state.toml";

impl Default for Config {
    fn default() -> Self {
        Self {
            project: ProjectConfig {
                app_id: None,
                subdomain: "localhost".to_string(),
                region: String::new(),
                environment: Environment::Production,
                local_backend_port: None,
            },
            api: ApiConfig {
                base_url: "https://api.cloud.example.com/v1".to_string(),
                admin_secret: None,
                timeout_secs: 30,
                max_retries: 3,
            },
            billing: BillingConfig {
                plan_price: 25.0,
                vcpu_price: 50.0,
            },
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p.to_path_buf()
        } else {
            // Try .computectl.toml in current dir, then ~/.config/computectl/config.toml
            let local = PathBuf::from(".computectl.toml");
            if local.exists() {
                local
            } else {
                dirs::config_dir()
                    .map(|d| d.join("computectl").join("config.toml"))
                    .unwrap_or_else(|| PathBuf::from(".computectl.toml"))
            }
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config: {}", config_path.display()))?;
            let config: Config = toml::from_str(&content).with_context(|| {
                let mut err = format!("Failed to parse config: {}", config_path.display());
                err.push_str("\n  Common issues:");
                err.push_str("\n    - Invalid TOML syntax");
                err.push_str("\n    - Missing required fields");
                err.push_str("\n    - Incorrect value types");
                err.push_str("\n  Tip: Run 'computectl init' to create a new config file");
                err
            })?;
            Ok(config)
        } else {
            // Use defaults but warn if user explicitly provided a path
            if path.is_some() {
                eprintln!("WARNING: Config file not found: {}", config_path.display());
                eprintln!(
                    "   Using default configuration. Run 'computectl init' to create a config file."
                );
            }
            Ok(Config::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }
}

pub fn init_config(output: &Path) -> Result<()> {
    let config = Config::default();
    config.save(output)?;
    println!("Created config file: {}", output.display());
    Ok(())
}
