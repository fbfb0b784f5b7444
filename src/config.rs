use anyhow::{Context, Result, bail};
use std::env;

/// Which persistent backend the gateway talks to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    Spanner(SpannerConfig),
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpannerConfig {
    pub emulator_host: Option<String>,
    pub project: String,
    pub instance: String,
    pub database: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendConfig,
    pub table: String,
    pub service_port: u16,
    pub service_host: String,
    pub cors_origins: CorsOrigins,
    pub log_format: LogFormat,
    pub log_file: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name).with_context(|| format!("{} environment variable is required", name))
        };

        let backend = match lookup("KV_BACKEND").as_deref().unwrap_or("spanner") {
            "spanner" => BackendConfig::Spanner(SpannerConfig {
                emulator_host: lookup("SPANNER_EMULATOR_HOST"),
                project: required("SPANNER_PROJECT")?,
                instance: required("SPANNER_INSTANCE")?,
                database: required("SPANNER_DATABASE")?,
            }),
            "memory" => BackendConfig::Memory,
            other => bail!("KV_BACKEND must be one of: spanner, memory, got '{}'", other),
        };

        let table = lookup("KV_TABLE").unwrap_or_else(|| "kv_store".to_string());
        if !is_identifier(&table) {
            bail!(
                "KV_TABLE must start with a letter and contain only letters, digits and '_', got '{}'",
                table
            );
        }

        let service_port = lookup("SERVICE_PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse::<u16>()
            .context("SERVICE_PORT must be a valid port number (0-65535)")?;

        let service_host = lookup("SERVICE_HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let cors_origins = match lookup("CORS_ALLOWED_ORIGINS") {
            None => CorsOrigins::Any,
            Some(raw) if raw.trim() == "*" => CorsOrigins::Any,
            Some(raw) => {
                let origins: Vec<String> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(String::from)
                    .collect();
                if origins.is_empty() {
                    bail!("CORS_ALLOWED_ORIGINS must be '*' or a comma-separated list of origins");
                }
                CorsOrigins::List(origins)
            }
        };

        let log_format = match lookup("LOG_FORMAT").as_deref().unwrap_or("text") {
            "text" => LogFormat::Text,
            "json" => LogFormat::Json,
            other => bail!("LOG_FORMAT must be one of: text, json, got '{}'", other),
        };

        let log_file = lookup("LOG_FILE").filter(|path| !path.is_empty());

        Ok(Config {
            backend,
            table,
            service_port,
            service_host,
            cors_origins,
            log_format,
            log_file,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.service_host, self.service_port)
    }

    pub fn log_startup(&self) {
        tracing::info!("Configuration loaded:");
        match &self.backend {
            BackendConfig::Spanner(spanner) => {
                tracing::info!("  Backend: spanner");
                tracing::info!("  Spanner emulator: {}",
                    spanner.emulator_host.as_deref().unwrap_or("disabled (using production)"));
                tracing::info!("  Spanner project: {}", spanner.project);
                tracing::info!("  Spanner instance: {}", spanner.instance);
                tracing::info!("  Spanner database: {}", spanner.database);
            }
            BackendConfig::Memory => {
                tracing::info!("  Backend: memory (data is lost on exit)");
            }
        }
        tracing::info!("  Table: {}", self.table);
        match &self.cors_origins {
            CorsOrigins::Any => tracing::info!("  CORS origins: any"),
            CorsOrigins::List(origins) => tracing::info!("  CORS origins: {}", origins.join(", ")),
        }
        tracing::info!("  Log file: {}", self.log_file.as_deref().unwrap_or("none"));
        tracing::info!("  Service listening on: {}", self.bind_address());
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
