use std::collections::HashMap;
use std::fmt::Display;
use std::net::IpAddr;

use clap::ValueEnum;
use serde_derive::{Deserialize, Serialize};

use crate::core::konst::{
    CURRENT_DIR, LOGFILE_NAME, LOGGING_JSON, LOGGING_QUIET, LOOKUP_TIMEOUT, POOL_SIZE,
    REGISTRY_TIMEOUT, REGISTRY_URL,
};

/// Addresses resolved for one hostname, in the order the resolver returned
/// them. Empty means the host did not resolve.
pub type AddressList = Vec<IpAddr>;

/// Final hostname to addresses mapping for one batch.
pub type ResolutionMap = HashMap<String, AddressList>;

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolveMethod {
    /// Platform resolver (getaddrinfo)
    #[default]
    System,
    /// Direct DNS queries
    Dns,
}

impl Display for ResolveMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveMethod::System => write!(f, "system"),
            ResolveMethod::Dns => write!(f, "dns"),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct ResolveOptions {
    pub pool_size: u16,
    pub timeout: u16,
    pub method: ResolveMethod,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            pool_size: POOL_SIZE,
            timeout: LOOKUP_TIMEOUT,
            method: ResolveMethod::System,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RegistryOptions {
    pub url: String,
    pub timeout: u16,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            url: REGISTRY_URL.to_owned(),
            timeout: REGISTRY_TIMEOUT,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LoggingOptions {
    pub dir: String,
    pub file: String,
    pub json: bool,
    pub quiet: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            dir: CURRENT_DIR.to_owned(),
            file: LOGFILE_NAME.to_owned(),
            json: LOGGING_JSON,
            quiet: LOGGING_QUIET,
        }
    }
}
