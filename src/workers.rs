//! Worker-role configuration
//!
//! Builds the defaults template for worker nodes, layers user overrides on
//! top, and validates the result. Everything here runs locally, before any
//! host is touched.

use std::collections::BTreeMap;

use crate::bundle::{ConfigBundle, FileKey};
use crate::defaults;
use crate::error::{ConfigurationError, PrestoResult};
use crate::topology::{is_localhost, ClusterContext};

/// Defaults template for a worker node. Pure: no I/O, no randomness.
///
/// The `coordinator` flag is always `"false"` here; coordinator-targeted
/// configuration goes through [`crate::coordinator::build_defaults`].
pub fn build_defaults(coordinator: &str) -> ConfigBundle {
    let mut config = BTreeMap::new();
    config.insert("coordinator".to_string(), "false".to_string());
    config.insert(
        "discovery.uri".to_string(),
        defaults::discovery_uri(coordinator),
    );
    config.insert(
        "http-server.http.port".to_string(),
        defaults::HTTP_PORT.to_string(),
    );
    config.insert(
        "task.max-memory".to_string(),
        defaults::TASK_MAX_MEMORY.to_string(),
    );

    let mut bundle = ConfigBundle::new();
    bundle.insert(FileKey::NodeProperties, defaults::node_properties());
    bundle.insert(FileKey::JvmConfig, defaults::jvm_config());
    bundle.insert(FileKey::ConfigProperties, config);
    bundle
}

/// Check a worker bundle. Non-mutating; the caller keeps the bundle
/// unchanged on success.
pub fn validate(conf: &ConfigBundle) -> PrestoResult<()> {
    conf.require_all_files()?;

    if let Some(config) = conf.get(FileKey::ConfigProperties) {
        if config.property("coordinator") == Some("true") {
            return Err(ConfigurationError::CoordinatorEnabledOnWorker.into());
        }
    }

    Ok(())
}

/// Resolve the full worker bundle for the current host.
///
/// Defaults, then overrides, then validation, then the localhost guard:
/// a single-node default discovery URI must not leak into a multi-node
/// deployment.
pub fn get_conf(ctx: &ClusterContext, overrides: ConfigBundle) -> PrestoResult<ConfigBundle> {
    let coordinator = ctx.coordinator()?;
    let conf = build_defaults(coordinator).merge(overrides);
    validate(&conf)?;

    if is_localhost(coordinator) && ctx.topology.is_multi_node() {
        return Err(ConfigurationError::LocalhostDiscoveryUri.into());
    }

    Ok(conf)
}
