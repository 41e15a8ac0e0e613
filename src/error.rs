//! Error types for prestoctl
//!
//! Library errors use `thiserror`; the binary wraps them in `anyhow`.

use std::path::PathBuf;
use thiserror::Error;

use crate::bundle::FileKey;
use crate::transport::TransportError;

/// Result type alias for prestoctl operations
pub type PrestoResult<T> = Result<T, PrestoError>;

/// User-correctable configuration problems.
///
/// Every variant is raised locally, before any remote mutation, so a
/// validation failure never leaves partial state on a host.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A required configuration file is absent from the bundle
    #[error("Missing configuration for required file: {0}")]
    MissingRequiredFile(FileKey),

    /// A worker bundle carries `coordinator=true`
    #[error("Coordinator must be false in the worker's config.properties")]
    CoordinatorEnabledOnWorker,

    /// A coordinator bundle does not carry `coordinator=true`
    #[error("Coordinator must be true in the coordinator's config.properties")]
    CoordinatorDisabledOnCoordinator,

    /// The discovery URI points at localhost while the cluster has more
    /// than one host
    #[error("discovery.uri should not be localhost in a multi-node cluster")]
    LocalhostDiscoveryUri,

    /// The topology defines no coordinator host
    #[error("no coordinator host defined in cluster topology")]
    NoCoordinator,

    /// A file name outside the closed set of managed configuration files
    #[error("unknown configuration file '{0}'")]
    UnknownFile(String),

    /// A properties line with no `key=value` separator
    #[error("malformed property line '{line}' in {file}")]
    MalformedProperty { file: PathBuf, line: String },

    /// The topology file failed to parse
    #[error("invalid topology in {file}: {message}")]
    InvalidTopology { file: PathBuf, message: String },
}

/// Main error type for prestoctl operations
#[derive(Error, Debug)]
pub enum PrestoError {
    /// Configuration is wrong; fix the inputs and rerun
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A remote command or connection failed. Not retried here; the
    /// multi-host driver decides whether to continue with other hosts.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
