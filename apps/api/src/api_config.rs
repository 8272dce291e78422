use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use pondok_application::{AuditDeliveryPolicy, MissingProfilePolicy};
use pondok_core::AppError;
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub anon_key: String,
    pub service_key: String,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub database_max_connections: u32,
    pub frontend_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub backend: BackendConfig,
    pub missing_profile_policy: MissingProfilePolicy,
    pub audit_delivery: AuditDeliveryPolicy,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");
        Self::from_lookup(migrate_only, |name| env::var(name).ok())
    }

    pub fn from_lookup(
        migrate_only: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let database_url = required(&lookup, "DATABASE_URL")?;
        let database_max_connections = parsed::<u32>(&lookup, "DATABASE_MAX_CONNECTIONS")?
            .unwrap_or(10)
            .max(1);
        let frontend_url =
            lookup("FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".to_owned());

        let api_host = lookup("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = parsed::<u16>(&lookup, "API_PORT")?.unwrap_or(3001);
        let cookie_secure = lookup("SESSION_COOKIE_SECURE")
            .unwrap_or_else(|| "false".to_owned())
            .eq_ignore_ascii_case("true");

        let base_url = required(&lookup, "BACKEND_BASE_URL")?;
        Url::parse(base_url.as_str())
            .map_err(|error| AppError::Validation(format!("invalid BACKEND_BASE_URL: {error}")))?;
        let backend = BackendConfig {
            base_url,
            anon_key: required(&lookup, "BACKEND_ANON_KEY")?,
            service_key: required(&lookup, "BACKEND_SERVICE_KEY")?,
        };

        let missing_profile_policy = lookup("MISSING_PROFILE_POLICY")
            .filter(|value| !value.trim().is_empty())
            .map(|value| MissingProfilePolicy::from_str(value.trim()))
            .transpose()?
            .unwrap_or_default();

        let defaults = AuditDeliveryPolicy::default();
        let audit_delivery = AuditDeliveryPolicy {
            queue_capacity: parsed(&lookup, "AUDIT_QUEUE_CAPACITY")?
                .unwrap_or(defaults.queue_capacity)
                .max(1),
            max_attempts: parsed(&lookup, "AUDIT_MAX_ATTEMPTS")?
                .unwrap_or(defaults.max_attempts)
                .max(1),
            retry_base_delay: parsed::<u64>(&lookup, "AUDIT_RETRY_BASE_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_base_delay),
        };

        Ok(Self {
            migrate_only,
            database_url,
            database_max_connections,
            frontend_url,
            api_host,
            api_port,
            cookie_secure,
            backend,
            missing_profile_policy,
            audit_delivery,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<String, AppError> {
    lookup(name)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("{name} is required")))
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>, AppError> {
    lookup(name)
        .filter(|value| !value.trim().is_empty())
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|_| AppError::Validation(format!("{name} must be a positive integer")))
        })
        .transpose()
}
