//! Server configuration — command line flags with environment fallbacks.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::error::PvError;
use crate::services::auth_service::Credentials;
use crate::session;

const DEV_SECRET_KEY: &str = "dev-secret-key-change-me";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// Single JSON document on disk.
    Json,
    /// PostgreSQL tables `pvs` and `counter`.
    Postgres,
}

#[derive(Debug, Parser)]
#[command(name = "gestion-pv", about = "PV record tracking server")]
pub struct Cli {
    /// Server port
    #[arg(short, long, env = "PV_PORT", default_value = "5000")]
    pub port: u16,

    /// Storage backend
    #[arg(long, env = "PV_STORE", value_enum, default_value = "json")]
    pub store: StoreKind,

    /// Path of the JSON document (json backend)
    #[arg(long, env = "PV_DATA_FILE", default_value = "data/gestion_pv.json")]
    pub data_file: PathBuf,

    /// PostgreSQL connection URL (postgres backend)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Maximum pooled database connections
    #[arg(long, env = "PV_DB_MAX_CONNECTIONS", default_value = "5")]
    pub db_max_connections: usize,

    /// Admin accounts as name:password, comma separated or repeated
    #[arg(long = "user", env = "PV_USERS", value_delimiter = ',')]
    pub users: Vec<String>,

    /// Key used to sign session cookies
    #[arg(long, env = "SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Session lifetime in seconds
    #[arg(long, env = "PV_SESSION_TTL_SECS", default_value = "43200")]
    pub session_ttl_secs: u64,
}

#[derive(Debug, Clone)]
pub enum StoreConfig {
    Json { path: PathBuf },
    Postgres { url: String, max_connections: usize },
}

#[derive(Debug, Clone)]
pub struct PvConfig {
    pub port: u16,
    pub store: StoreConfig,
    pub credentials: Credentials,
    pub secret_key: String,
    pub session_ttl: Duration,
}

impl PvConfig {
    pub fn from_cli(cli: Cli) -> Result<Self, PvError> {
        let store = match cli.store {
            StoreKind::Json => StoreConfig::Json {
                path: cli.data_file,
            },
            StoreKind::Postgres => StoreConfig::Postgres {
                url: cli.database_url.ok_or_else(|| {
                    PvError::InvalidInput(
                        "DATABASE_URL is required for the postgres store".to_string(),
                    )
                })?,
                max_connections: cli.db_max_connections.max(1),
            },
        };

        let credentials = Credentials::from_entries(&cli.users)?;
        if credentials.is_empty() {
            tracing::warn!("PV_USERS not set -- admin login disabled");
        }

        let secret_key = match cli.secret_key.filter(|k| !k.is_empty()) {
            Some(key) => key,
            None => {
                tracing::warn!("SECRET_KEY not set -- using development key for session cookies");
                DEV_SECRET_KEY.to_string()
            }
        };

        let session_ttl = session::check_ttl(Duration::from_secs(cli.session_ttl_secs))?;

        Ok(Self {
            port: cli.port,
            store,
            credentials,
            secret_key,
            session_ttl,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("gestion-pv").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn json_store_with_repeated_and_delimited_users() {
        let cli = parse(&[
            "--data-file",
            "/tmp/pv.json",
            "--user",
            "alice:one,bob:two",
            "--user",
            "carol:three",
            "--secret-key",
            "k",
        ]);
        let config = PvConfig::from_cli(cli).unwrap();

        assert!(matches!(
            config.store,
            StoreConfig::Json { ref path } if path == &PathBuf::from("/tmp/pv.json")
        ));
        assert_eq!(config.credentials.len(), 3);
        assert_eq!(config.secret_key, "k");
        assert_eq!(config.session_ttl, Duration::from_secs(43200));
    }

    #[test]
    fn postgres_store_requires_url() {
        let cli = Cli {
            port: 5000,
            store: StoreKind::Postgres,
            data_file: PathBuf::from("unused.json"),
            database_url: None,
            db_max_connections: 5,
            users: Vec::new(),
            secret_key: Some("k".to_string()),
            session_ttl_secs: 60,
        };
        assert!(matches!(
            PvConfig::from_cli(cli),
            Err(PvError::InvalidInput(_))
        ));

        let cli = parse(&[
            "--store",
            "postgres",
            "--database-url",
            "postgres://pv@localhost/pv",
            "--db-max-connections",
            "0",
        ]);
        let config = PvConfig::from_cli(cli).unwrap();
        assert!(matches!(
            config.store,
            StoreConfig::Postgres { max_connections: 1, .. }
        ));
    }

    #[test]
    fn session_lifetime_out_of_range_is_rejected() {
        for secs in ["0", "10000000000000"] {
            let cli = parse(&["--secret-key", "k", "--session-ttl-secs", secs]);
            assert!(matches!(
                PvConfig::from_cli(cli),
                Err(PvError::InvalidInput(_))
            ));
        }

        let cli = parse(&["--secret-key", "k", "--session-ttl-secs", "31536000"]);
        assert_eq!(
            PvConfig::from_cli(cli).unwrap().session_ttl,
            Duration::from_secs(31_536_000)
        );
    }

    #[test]
    fn missing_secret_falls_back_to_dev_key() {
        let cli = parse(&["--secret-key", ""]);
        let config = PvConfig::from_cli(cli).unwrap();
        assert_eq!(config.secret_key, DEV_SECRET_KEY);
    }
}
