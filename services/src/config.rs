use serde::Deserialize;
use std::env::vars;
use std::fmt::Display;
use std::time::Duration;
use tracing::info;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_DB_ACQUIRE_TIMEOUT_SECS: u64 = 5;
const DEFAULT_DB_MAX_LIFETIME_SECS: u64 = 30 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum Env {
    #[serde(rename = "local")]
    Local,
    #[serde(rename = "test")]
    Test,
    #[serde(rename = "prod")]
    Prod,
}

impl Display for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Env::Local => write!(f, "local"),
            Env::Test => write!(f, "test"),
            Env::Prod => write!(f, "prod"),
        }
    }
}

/// Connection pool tuning for the Postgres pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            min_connections: 0,
            acquire_timeout: Duration::from_secs(DEFAULT_DB_ACQUIRE_TIMEOUT_SECS),
            max_lifetime: Duration::from_secs(DEFAULT_DB_MAX_LIFETIME_SECS),
        }
    }
}

// The final, validated configuration struct.
#[derive(Debug, Clone)]
pub struct Config {
    env: Env,
    database_url: String,
    server_addr: String,
    port: u16,
    pool: PoolConfig,
    run_migrations: bool,
    docs_enabled: bool,
}

// An intermediate struct for deserializing environment variables
// where most settings are optional.
#[derive(Deserialize)]
struct RawConfig {
    env: Env,
    database_url: String,
    server_addr: Option<String>,
    port: Option<u16>,
    db_max_connections: Option<u32>,
    db_min_connections: Option<u32>,
    db_acquire_timeout_secs: Option<u64>,
    db_max_lifetime_secs: Option<u64>,
    run_migrations: Option<bool>,
    enable_docs: Option<bool>,
}

impl Config {
    /// Create a test configuration with default values.
    ///
    /// This function is available for both unit tests and integration tests.
    /// It should not be used in production code.
    pub fn new_for_test() -> Self {
        Self {
            env: Env::Local,
            database_url: "postgres://localhost:5432/test".to_owned(),
            server_addr: "127.0.0.1".to_owned(),
            port: DEFAULT_PORT,
            pool: PoolConfig::default(),
            run_migrations: false,
            docs_enabled: true,
        }
    }

    /// Create a test configuration with a specific environment.
    pub fn new_for_test_with_env(env: Env) -> Self {
        let docs_enabled = !matches!(env, Env::Prod);
        Self {
            env,
            docs_enabled,
            ..Self::new_for_test()
        }
    }

    pub fn environment(&self) -> &Env {
        &self.env
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn server_addr(&self) -> &str {
        &self.server_addr
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn pool(&self) -> &PoolConfig {
        &self.pool
    }

    pub fn run_migrations(&self) -> bool {
        self.run_migrations
    }

    /// Whether `/docs` and `/openapi.json` are served.
    pub fn docs_enabled(&self) -> bool {
        self.docs_enabled
    }

    pub fn is_local(&self) -> bool {
        matches!(self.env, Env::Local)
    }

    pub fn is_prod(&self) -> bool {
        matches!(self.env, Env::Prod)
    }

    /// Initializes configuration by reading from environment variables
    /// and applying environment-aware defaults.
    pub fn init() -> anyhow::Result<Self> {
        info!("Loading configuration from environment variables");

        // First, deserialize into a temporary struct that allows for optional fields
        let raw_config: RawConfig = serde_env::from_iter(vars())?;
        Self::from_raw(raw_config)
    }

    fn from_raw(raw_config: RawConfig) -> anyhow::Result<Self> {
        let RawConfig {
            env,
            database_url,
            server_addr,
            port,
            db_max_connections,
            db_min_connections,
            db_acquire_timeout_secs,
            db_max_lifetime_secs,
            run_migrations,
            enable_docs,
        } = raw_config;

        if database_url.trim().is_empty() {
            anyhow::bail!("DATABASE_URL must not be empty");
        }

        // Apply the default logic for `server_addr` based on the environment
        let server_addr = match server_addr {
            Some(addr) => {
                info!("Using provided SERVER_ADDR: {}", addr);
                addr
            }
            None => {
                let default_addr = match env {
                    Env::Local => "127.0.0.1",
                    _ => "0.0.0.0",
                };
                info!(
                    "SERVER_ADDR not set, defaulting to {} for {} environment",
                    default_addr, env
                );
                default_addr.to_owned()
            }
        };

        let port = match port {
            Some(port) => port,
            None if matches!(env, Env::Local) => {
                info!(
                    "PORT not set, defaulting to {} for local environment",
                    DEFAULT_PORT
                );
                DEFAULT_PORT
            }
            None => anyhow::bail!("PORT must be set for {} environment", env),
        };

        let defaults = PoolConfig::default();
        let pool = PoolConfig {
            max_connections: db_max_connections.unwrap_or(defaults.max_connections),
            min_connections: db_min_connections.unwrap_or(defaults.min_connections),
            acquire_timeout: db_acquire_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.acquire_timeout),
            max_lifetime: db_max_lifetime_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.max_lifetime),
        };

        if pool.max_connections == 0 {
            anyhow::bail!("DB_MAX_CONNECTIONS must be at least 1");
        }
        if pool.min_connections > pool.max_connections {
            anyhow::bail!(
                "DB_MIN_CONNECTIONS ({}) must not exceed DB_MAX_CONNECTIONS ({})",
                pool.min_connections,
                pool.max_connections
            );
        }

        // API docs stay off in production unless explicitly requested
        let docs_enabled = enable_docs.unwrap_or(!matches!(env, Env::Prod));

        Ok(Config {
            env,
            database_url,
            server_addr,
            port,
            pool,
            run_migrations: run_migrations.unwrap_or(true),
            docs_enabled,
        })
    }
}
