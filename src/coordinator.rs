//! Coordinator-role configuration
//!
//! The coordinator takes its own defaults path: it shares the node and JVM
//! templates with workers but enables coordination and the embedded
//! discovery server in `config.properties`.

use std::collections::BTreeMap;

use crate::bundle::{ConfigBundle, FileKey};
use crate::defaults;
use crate::error::{ConfigurationError, PrestoResult};
use crate::topology::{is_localhost, ClusterContext};

/// Defaults template for the coordinator node. Pure: no I/O, no randomness.
pub fn build_defaults(coordinator: &str) -> ConfigBundle {
    let mut config = BTreeMap::new();
    config.insert("coordinator".to_string(), "true".to_string());
    config.insert("discovery-server.enabled".to_string(), "true".to_string());
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

/// Check a coordinator bundle. Non-mutating.
pub fn validate(conf: &ConfigBundle) -> PrestoResult<()> {
    conf.require_all_files()?;

    let enabled = conf
        .get(FileKey::ConfigProperties)
        .and_then(|config| config.property("coordinator"));
    if enabled != Some("true") {
        return Err(ConfigurationError::CoordinatorDisabledOnCoordinator.into());
    }

    Ok(())
}

/// Resolve the full coordinator bundle for the current host.
pub fn get_conf(ctx: &ClusterContext, overrides: ConfigBundle) -> PrestoResult<ConfigBundle> {
    let coordinator = ctx.coordinator()?;
    let conf = build_defaults(coordinator).merge(overrides);
    validate(&conf)?;

    if is_localhost(coordinator) && ctx.topology.is_multi_node() {
        return Err(ConfigurationError::LocalhostDiscoveryUri.into());
    }

    Ok(conf)
}
