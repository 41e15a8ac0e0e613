//! prestoctl - cluster configuration compiler and deployer
//!
//! prestoctl builds per-role configuration for a Presto cluster by layering
//! user-supplied overrides on top of a fixed defaults template, validates the
//! result, and deploys it to remote hosts over SSH. Deployment is idempotent:
//! every file is rewritten from scratch except for the `node.id` identity
//! line in `node.properties`, which is minted once per host and preserved
//! verbatim across all later deployments.

pub mod bundle;
pub mod coordinator;
pub mod defaults;
pub mod deploy;
pub mod error;
pub mod escaping;
pub mod overrides;
pub mod topology;
pub mod transport;
pub mod workers;

// Re-exports for convenience
pub use bundle::{output_format, ConfigBundle, FileContent, FileKey};
pub use deploy::{configure_presto, DeployOptions, DeployReport};
pub use error::{ConfigurationError, PrestoError, PrestoResult};
pub use escaping::{escape_single_quotes, shell_quote};
pub use topology::{ClusterContext, ClusterTopology, Role};
pub use transport::{RemoteExecutor, SshExecutor, TransportError};
