use portal_core::config as core_config;
use portal_core::error::AppError;
use serde::Deserialize;
use std::env;

use crate::services::WindowConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct PortalConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub session: SessionConfig,
    pub security: SecurityConfig,
    pub swagger: SwaggerConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Connection string for the cache service. Absent means the portal
    /// runs with the no-op cache.
    pub url: Option<String>,
    pub op_timeout_ms: u64,
    pub properties_ttl_seconds: u64,
    pub overview_ttl_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwaggerConfig {
    pub enabled: SwaggerMode,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SwaggerMode {
    Public,
    Disabled,
}

/// Window/attempt/block settings for one endpoint class.
#[derive(Debug, Clone, Deserialize)]
pub struct WindowSettings {
    pub max_attempts: u32,
    pub window_seconds: u64,
    pub block_seconds: u64,
}

impl WindowSettings {
    pub fn to_window(&self) -> WindowConfig {
        WindowConfig::from_seconds(self.window_seconds, self.max_attempts, self.block_seconds)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub login: WindowSettings,
    pub enlist: WindowSettings,
    pub status: WindowSettings,
    pub global_ip_limit: u32,
    pub global_ip_window_seconds: u64,
}

impl PortalConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = PortalConfig {
            common: common_config,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("portal-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            database: DatabaseConfig {
                url: get_env("DATABASE_URL", None, is_prod)?,
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", "10", is_prod)?,
                min_connections: parse_env("DATABASE_MIN_CONNECTIONS", "1", is_prod)?,
            },
            cache: CacheConfig {
                url: env::var("REDIS_URL").ok().filter(|s| !s.is_empty()),
                op_timeout_ms: parse_env("CACHE_OP_TIMEOUT_MS", "250", is_prod)?,
                properties_ttl_seconds: parse_env("CACHE_TTL_PROPERTIES_SECONDS", "60", is_prod)?,
                overview_ttl_seconds: parse_env("CACHE_TTL_OVERVIEW_SECONDS", "30", is_prod)?,
            },
            session: SessionConfig {
                // Always required: session claims must never be signed with
                // a baked-in default.
                secret: get_env("SESSION_SECRET", None, true)?,
                ttl_minutes: parse_env("SESSION_TTL_MINUTES", "60", is_prod)?,
            },
            security: SecurityConfig {
                allowed_origins: get_env("ALLOWED_ORIGINS", Some("http://localhost:3000"), is_prod)?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
                otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            },
            swagger: SwaggerConfig {
                enabled: get_env("ENABLE_SWAGGER", Some("public"), is_prod)?
                    .parse()
                    .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
            },
            rate_limit: RateLimitConfig {
                login: WindowSettings {
                    max_attempts: parse_env("RATE_LIMIT_LOGIN_MAX_ATTEMPTS", "6", is_prod)?,
                    window_seconds: parse_env("RATE_LIMIT_LOGIN_WINDOW_SECONDS", "900", is_prod)?,
                    block_seconds: parse_env("RATE_LIMIT_LOGIN_BLOCK_SECONDS", "900", is_prod)?,
                },
                enlist: WindowSettings {
                    max_attempts: parse_env("RATE_LIMIT_ENLIST_MAX_ATTEMPTS", "5", is_prod)?,
                    window_seconds: parse_env("RATE_LIMIT_ENLIST_WINDOW_SECONDS", "900", is_prod)?,
                    block_seconds: parse_env("RATE_LIMIT_ENLIST_BLOCK_SECONDS", "1800", is_prod)?,
                },
                status: WindowSettings {
                    max_attempts: parse_env("RATE_LIMIT_STATUS_MAX_ATTEMPTS", "10", is_prod)?,
                    window_seconds: parse_env("RATE_LIMIT_STATUS_WINDOW_SECONDS", "60", is_prod)?,
                    block_seconds: parse_env("RATE_LIMIT_STATUS_BLOCK_SECONDS", "300", is_prod)?,
                },
                global_ip_limit: parse_env("RATE_LIMIT_GLOBAL_IP_LIMIT", "100", is_prod)?,
                global_ip_window_seconds: parse_env(
                    "RATE_LIMIT_GLOBAL_IP_WINDOW_SECONDS",
                    "60",
                    is_prod,
                )?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.session.secret.len() < 32 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "SESSION_SECRET must be at least 32 bytes"
            )));
        }

        if self.session.ttl_minutes <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "SESSION_TTL_MINUTES must be positive"
            )));
        }

        for (name, settings) in [
            ("login", &self.rate_limit.login),
            ("enlist", &self.rate_limit.enlist),
            ("status", &self.rate_limit.status),
        ] {
            if settings.max_attempts == 0 || settings.window_seconds == 0 {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Rate limit settings for {} must be positive",
                    name
                )));
            }
        }

        if self.environment == Environment::Prod {
            if self.security.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }

            if self.swagger.enabled == SwaggerMode::Public {
                tracing::warn!(
                    "Swagger is publicly accessible in production - consider disabling it"
                );
            }
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: &str, is_prod: bool) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, Some(default), is_prod)?.parse().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("Invalid value for {}: {}", key, e))
    })
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

impl std::str::FromStr for SwaggerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(SwaggerMode::Public),
            "disabled" => Ok(SwaggerMode::Disabled),
            _ => Err(format!("Invalid swagger mode: {}", s)),
        }
    }
}
