//! Process configuration, built once at startup and shared read-only.

use std::fmt;
use std::time::Duration;

use crate::store::{Signer, SignerError};

/// Shared default partition every reader also queries.
pub const SHARED_SPACE_ID: &str = "ns";
/// Expiration applied to every created entity: six months.
pub const ENTITY_TTL_SECS: u64 = 15_768_000;
pub const DEFAULT_WRITE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

pub const ENV_SPACE_ID: &str = "SPACE_ID";
pub const ENV_BETA_SPACE_ID: &str = "BETA_SPACE_ID";
pub const ENV_PRIVATE_KEY: &str = "ARKIV_PRIVATE_KEY";
pub const ENV_RPC_URL: &str = "ARKIV_RPC_URL";
pub const ENV_WRITE_TIMEOUT: &str = "BOARD_WRITE_TIMEOUT_SECS";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("ARKIV_PRIVATE_KEY environment variable is required for writes")]
    MissingPrivateKey,

    #[error("ARKIV_PRIVATE_KEY is invalid: {0}")]
    InvalidPrivateKey(#[from] SignerError),

    #[error("BOARD_WRITE_TIMEOUT_SECS must be a positive number of seconds, got {0:?}")]
    InvalidWriteTimeout(String),
}

#[derive(Clone)]
pub struct BoardConfig {
    /// Partition configured for this deployment, shown in `Debug` only.
    /// Reads and writes go through `query_space_id`.
    space_id: String,
    /// Partition used for writes and queried first on reads.
    pub query_space_id: String,
    private_key: Option<String>,
    pub rpc_url: String,
    /// Bounded wait around primary record submission.
    pub write_timeout: Duration,
    pub entity_ttl_secs: u64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            space_id: SHARED_SPACE_ID.to_string(),
            query_space_id: SHARED_SPACE_ID.to_string(),
            private_key: None,
            rpc_url: DEFAULT_RPC_URL.to_string(),
            write_timeout: Duration::from_secs(DEFAULT_WRITE_TIMEOUT_SECS),
            entity_ttl_secs: ENTITY_TTL_SECS,
        }
    }
}

impl BoardConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from a variable lookup. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let beta_space_id = var(ENV_BETA_SPACE_ID);
        let space_id = var(ENV_SPACE_ID)
            .or_else(|| beta_space_id.clone())
            .unwrap_or_else(|| SHARED_SPACE_ID.to_string());
        let query_space_id = beta_space_id.unwrap_or_else(|| space_id.clone());

        let private_key = var(ENV_PRIVATE_KEY);
        if let Some(key) = &private_key {
            Signer::from_private_key(key)?;
        }

        let write_timeout = match var(ENV_WRITE_TIMEOUT) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidWriteTimeout(raw)),
            },
            None => Duration::from_secs(DEFAULT_WRITE_TIMEOUT_SECS),
        };

        Ok(Self {
            space_id,
            query_space_id,
            private_key,
            rpc_url: var(ENV_RPC_URL).unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
            write_timeout,
            entity_ttl_secs: ENTITY_TTL_SECS,
        })
    }

    pub fn with_private_key(mut self, private_key: impl Into<String>) -> Result<Self, ConfigError> {
        let private_key = private_key.into();
        Signer::from_private_key(&private_key)?;
        self.private_key = Some(private_key);
        Ok(self)
    }

    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    pub fn writes_enabled(&self) -> bool {
        self.private_key.is_some()
    }

    /// Resolve the signing account for one write.
    pub fn signer(&self) -> Result<Signer, ConfigError> {
        let key = self
            .private_key
            .as_deref()
            .ok_or(ConfigError::MissingPrivateKey)?;
        Ok(Signer::from_private_key(key)?)
    }

    /// Partitions every read fans out to: the query partition, then the
    /// shared default, without repeats.
    pub fn read_partitions(&self) -> Vec<String> {
        let mut partitions = vec![self.query_space_id.clone()];
        if self.query_space_id != SHARED_SPACE_ID {
            partitions.push(SHARED_SPACE_ID.to_string());
        }
        partitions
    }
}

impl fmt::Debug for BoardConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoardConfig")
            .field("space_id", &self.space_id)
            .field("query_space_id", &self.query_space_id)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("rpc_url", &self.rpc_url)
            .field("write_timeout", &self.write_timeout)
            .field("entity_ttl_secs", &self.entity_ttl_secs)
            .finish()
    }
}
