use std::path::PathBuf;

use anyhow::{anyhow, Context};
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "INKWELL_ENV";
const CONFIG_DIR_ENV: &str = "INKWELL_CONFIG_DIR";
const PORT_ENV: &str = "PORT";
const SERVERLESS_ENV: &str = "VERCEL";

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub uploads: UploadSettings,
    #[serde(default)]
    pub assets: AssetSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, environment overlay,
    /// `INKWELL__*` variables and finally the platform variables (`PORT`, `VERCEL`).
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .with_context(|| "unable to resolve current directory")?
                .join("config"),
        };

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        let builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix("INKWELL")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        settings.environment = parse_environment(&environment)?;
        settings.apply_platform_overrides(
            std::env::var(PORT_ENV).ok().as_deref(),
            std::env::var_os(SERVERLESS_ENV).is_some(),
        )?;

        Ok(settings)
    }

    /// Apply the hosting platform's conventions on top of file/env configuration.
    pub fn apply_platform_overrides(
        &mut self,
        port: Option<&str>,
        serverless: bool,
    ) -> anyhow::Result<()> {
        if let Some(port) = port {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("invalid {} value '{}'", PORT_ENV, port))?;
        }
        if serverless {
            self.server.serverless = true;
        }
        Ok(())
    }
}

fn parse_environment(name: &str) -> anyhow::Result<Environment> {
    match name {
        "local" => Ok(Environment::Local),
        "staging" => Ok(Environment::Staging),
        "production" => Ok(Environment::Production),
        other => Err(anyhow!(
            "unsupported environment '{}'; expected local/staging/production",
            other
        )),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Set when running under a serverless host that owns the listener.
    #[serde(default)]
    pub serverless: bool,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        5000
    }

    fn default_request_timeout_ms() -> u64 {
        15000
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
            serverless: false,
        }
    }
}

/// Which record store implementation backs the catalog.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Memory,
    JsonFile,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "StorageSettings::default_books_path")]
    pub books_path: PathBuf,
    #[serde(default = "StorageSettings::default_contacts_path")]
    pub contacts_path: PathBuf,
    /// Seed the in-memory catalog with the sample books on startup.
    #[serde(default = "StorageSettings::default_seed_samples")]
    pub seed_samples: bool,
}

impl StorageSettings {
    fn default_books_path() -> PathBuf {
        PathBuf::from("books.json")
    }

    fn default_contacts_path() -> PathBuf {
        PathBuf::from("contacts.json")
    }

    fn default_seed_samples() -> bool {
        true
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            books_path: Self::default_books_path(),
            contacts_path: Self::default_contacts_path(),
            seed_samples: Self::default_seed_samples(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadSettings {
    #[serde(default = "UploadSettings::default_dir")]
    pub dir: PathBuf,
    #[serde(default = "UploadSettings::default_max_bytes")]
    pub max_bytes: usize,
}

impl UploadSettings {
    fn default_dir() -> PathBuf {
        PathBuf::from("uploads")
    }

    fn default_max_bytes() -> usize {
        10 * 1024 * 1024
    }
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            dir: Self::default_dir(),
            max_bytes: Self::default_max_bytes(),
        }
    }
}

/// Bundled static assets (sample cover art).
#[derive(Debug, Clone, Deserialize)]
pub struct AssetSettings {
    #[serde(default = "AssetSettings::default_dir")]
    pub dir: PathBuf,
}

impl AssetSettings {
    fn default_dir() -> PathBuf {
        PathBuf::from("attached_assets")
    }
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            dir: Self::default_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default = "TelemetrySettings::default_log_level")]
    pub log_level: String,
}

impl TelemetrySettings {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            log_level: Self::default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}
