use crate::{
    error::{
        BadEnvVarSnafu, ParsePortSnafu, RosterError, RosterResult, UnknownSeedPolicySnafu,
        UnknownStorageBackendSnafu,
    },
    seed::SeedPolicy,
};
use secrecy::{ExposeSecret, SecretString};
use snafu::ResultExt;
use std::{env::VarError, path::PathBuf, sync::Arc};

pub const DEFAULT_SERVER_IP: &str = "127.0.0.1:8080";
pub const DEFAULT_STORAGE_KEY: &str = "students";
pub const DEFAULT_SEED_PATH: &str = "assets/students.json";

#[derive(Clone, Debug)]
pub struct RuntimeConfiguration {
    server_ip: String,
    storage_config: Arc<StorageConfig>,
    seed_config: Arc<SeedConfig>,
}

impl RuntimeConfiguration {
    pub fn new() -> RosterResult<Self> {
        Self::from_lookup(dotenvy::var)
    }

    ///`lookup` behaves like `dotenvy::var`, so tests can provide their own environment
    pub fn from_lookup(lookup: impl Fn(&'static str) -> Result<String, dotenvy::Error>) -> RosterResult<Self> {
        let optional = |name: &'static str| match lookup(name) {
            Ok(value) => Ok(Some(value)),
            Err(dotenvy::Error::EnvVar(VarError::NotPresent)) => Ok(None),
            Err(source) => Err(RosterError::BadEnvVar { source, name }),
        };

        let server_ip = optional("ROSTER_SERVER_IP")?.unwrap_or_else(|| DEFAULT_SERVER_IP.to_string());

        let backend = match optional("ROSTER_STORAGE")?.as_deref() {
            None | Some("postgres") => StorageBackend::Postgres(DbConfig::new(&lookup)?),
            Some("memory") => StorageBackend::Memory,
            Some(found) => return UnknownStorageBackendSnafu { found }.fail(),
        };
        let key = optional("ROSTER_STORAGE_KEY")?.unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string());

        let policy = match optional("ROSTER_SEED_POLICY")? {
            Some(found) => found
                .parse()
                .map_err(|()| UnknownSeedPolicySnafu { found }.build())?,
            None => SeedPolicy::default(),
        };
        let path = optional("ROSTER_SEED_PATH")?
            .map_or_else(|| PathBuf::from(DEFAULT_SEED_PATH), PathBuf::from);

        Ok(Self {
            server_ip,
            storage_config: Arc::new(StorageConfig { backend, key }),
            seed_config: Arc::new(SeedConfig { path, policy }),
        })
    }

    pub fn server_ip(&self) -> &str {
        &self.server_ip
    }

    pub fn storage_config(&self) -> Arc<StorageConfig> {
        self.storage_config.clone()
    }

    pub fn seed_config(&self) -> Arc<SeedConfig> {
        self.seed_config.clone()
    }
}

#[derive(Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub key: String,
}

#[derive(Debug)]
pub enum StorageBackend {
    Postgres(DbConfig),
    Memory,
}

#[derive(Debug)]
pub struct SeedConfig {
    pub path: PathBuf,
    pub policy: SeedPolicy,
}

#[derive(Debug)]
pub struct DbConfig {
    user: String,
    password: SecretString,
    path: String,
    port: u16,
    database: String,
}

impl DbConfig {
    fn new(lookup: impl Fn(&'static str) -> Result<String, dotenvy::Error>) -> RosterResult<Self> {
        let get_env_var = |name| lookup(name).context(BadEnvVarSnafu { name });

        Ok(Self {
            user: get_env_var("DB_USER")?,
            password: SecretString::from(get_env_var("DB_PASSWORD")?),
            path: get_env_var("DB_PATH")?,
            port: get_env_var("DB_PORT")?.parse().context(ParsePortSnafu)?,
            database: get_env_var("DB_NAME")?,
        })
    }

    pub fn get_db_path(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user,
            self.password.expose_secret(),
            self.path,
            self.port,
            self.database
        )
    }
}
