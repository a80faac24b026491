use std::path::PathBuf;
use std::str::FromStr;

use storefront_cloud::{StorageBackend, StorageSettings, DEFAULT_WORKERS};

use crate::auth::jwt::JwtConfig;

/// Default maximum size of a single uploaded file (2 MiB).
pub const DEFAULT_FILE_LIMIT_BYTES: usize = 2 * 1024 * 1024;

/// Server configuration loaded from environment variables.
///
/// All fields except `DATABASE_URL` and the three JWT secrets (`JWT_SECRET`,
/// `JWT_API_KEY`, `JWT_ADMIN_KEY`) have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Postgres connection URL.
    pub database_url: String,
    /// Connection pool size (default: `20`).
    pub db_max_connections: u32,
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Maximum accepted size of one uploaded file, in bytes.
    pub file_limit_bytes: usize,
    /// JWT secrets and expiry durations.
    pub jwt: JwtConfig,
    /// Object-storage backend selection.
    pub storage: StorageSettings,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                         |
    /// |------------------------|---------------------------------|
    /// | `DATABASE_URL`         | **required**                    |
    /// | `DB_MAX_CONNECTIONS`   | `20`                            |
    /// | `HOST`                 | `0.0.0.0`                       |
    /// | `PORT`                 | `3000`                          |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`         |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                            |
    /// | `FILE_LIMIT_BYTES`     | `2097152`                       |
    /// | `STORAGE_BACKEND`      | `local` (`local` or `s3`)       |
    /// | `STORAGE_LOCAL_ROOT`   | `storage`                       |
    /// | `STORAGE_PUBLIC_URL`   | `http://localhost:3000/static`  |
    /// | `STORAGE_BUCKET`       | required when backend is `s3`   |
    /// | `STORAGE_ENDPOINT_URL` | unset (AWS default endpoint)    |
    /// | `STORAGE_WORKERS`      | `5`                             |
    ///
    /// JWT settings are read by [`JwtConfig::from_env`].
    ///
    /// # Panics
    ///
    /// Panics on a missing required variable or an unparsable value.
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let db_max_connections: u32 = env_or("DB_MAX_CONNECTIONS", 20);

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = env_or("PORT", 3000);

        let cors_origins = parse_origins(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into()),
        );

        let request_timeout_secs: u64 = env_or("REQUEST_TIMEOUT_SECS", 30);
        let file_limit_bytes: usize = env_or("FILE_LIMIT_BYTES", DEFAULT_FILE_LIMIT_BYTES);

        let jwt = JwtConfig::from_env();

        let backend_name = std::env::var("STORAGE_BACKEND").unwrap_or_else(|_| "local".into());
        let backend = parse_backend(
            &backend_name,
            std::env::var("STORAGE_LOCAL_ROOT").ok(),
            std::env::var("STORAGE_BUCKET").ok(),
            std::env::var("STORAGE_ENDPOINT_URL").ok(),
        )
        .unwrap_or_else(|msg| panic!("{msg}"));

        let storage = StorageSettings {
            backend,
            public_url: std::env::var("STORAGE_PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:3000/static".into()),
            workers: env_or("STORAGE_WORKERS", DEFAULT_WORKERS),
        };

        Self {
            database_url,
            db_max_connections,
            host,
            port,
            cors_origins,
            request_timeout_secs,
            file_limit_bytes,
            jwt,
            storage,
        }
    }
}

/// Read `key` and parse it, falling back to `default` when unset.
///
/// Panics when the variable is set but cannot be parsed.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Resolve the storage backend from its settings.
fn parse_backend(
    name: &str,
    local_root: Option<String>,
    bucket: Option<String>,
    endpoint_url: Option<String>,
) -> Result<StorageBackend, String> {
    match name.trim().to_ascii_lowercase().as_str() {
        "local" => Ok(StorageBackend::Local {
            root: PathBuf::from(local_root.unwrap_or_else(|| "storage".into())),
        }),
        "s3" => {
            let bucket = bucket
                .filter(|b| !b.trim().is_empty())
                .ok_or_else(|| "STORAGE_BUCKET must be set when STORAGE_BACKEND=s3".to_string())?;
            Ok(StorageBackend::S3 {
                bucket,
                endpoint_url: endpoint_url.filter(|u| !u.trim().is_empty()),
            })
        }
        other => Err(format!("STORAGE_BACKEND must be 'local' or 's3', got '{other}'")),
    }
}
