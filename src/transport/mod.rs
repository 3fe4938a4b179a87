//! Transports
//!
//! A transport is one backend able to execute an operation.
//!
//! - [`credential`] - turns a configured credential into a wire-ready one
//! - [`api`] - the HTTP API
//! - [`cli`] - the local `abstract-cli` executable

pub mod api;
pub mod cli;
pub mod credential;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use api::{ApiRequest, ApiTransport, Progress};
pub use cli::CliTransport;
pub use credential::{Credential, ResolvedCredential, ShareReference};

/// Backend identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportId {
    Api,
    Cli,
}

impl TransportId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Cli => "cli",
        }
    }
}

impl fmt::Display for TransportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransportId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "api" => Ok(Self::Api),
            "cli" => Ok(Self::Cli),
            other => Err(format!("unknown transport: {}", other)),
        }
    }
}

/// Everything one call needs to reach either backend, bound to one
/// resolved credential
#[derive(Debug, Clone)]
pub struct Session {
    pub api: ApiTransport,
    pub cli: CliTransport,
}
