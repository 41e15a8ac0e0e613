//! Fixed baseline values shared by every role template.

use std::collections::BTreeMap;

pub const NODE_ENVIRONMENT: &str = "presto";
pub const DATA_DIR: &str = "/var/lib/presto/data";
pub const PLUGIN_CONFIG_DIR: &str = "/etc/presto/catalog";
pub const PLUGIN_DIR: &str = "/usr/lib/presto/lib/plugin";

pub const HTTP_PORT: &str = "8080";
pub const TASK_MAX_MEMORY: &str = "1GB";

/// JVM flags every node starts with. Order is significant and is written
/// to `jvm.config` verbatim.
pub const JVM_FLAGS: [&str; 9] = [
    "-server",
    "-Xmx1G",
    "-XX:+UseConcMarkSweepGC",
    "-XX:+ExplicitGCInvokesConcurrent",
    "-XX:+CMSClassUnloadingEnabled",
    "-XX:+AggressiveOpts",
    "-XX:+HeapDumpOnOutOfMemoryError",
    "-XX:OnOutOfMemoryError=kill -9 %p",
    "-XX:ReservedCodeCacheSize=150M",
];

/// Default `node.properties` entries, identical for every role.
pub fn node_properties() -> BTreeMap<String, String> {
    [
        ("node.environment", NODE_ENVIRONMENT),
        ("node.data-dir", DATA_DIR),
        ("plugin.config-dir", PLUGIN_CONFIG_DIR),
        ("plugin.dir", PLUGIN_DIR),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Default `jvm.config` lines, identical for every role.
pub fn jvm_config() -> Vec<String> {
    JVM_FLAGS.iter().map(|flag| flag.to_string()).collect()
}

/// Discovery URI every node announces to or polls.
pub fn discovery_uri(coordinator: &str) -> String {
    format!("http://{}:{}", coordinator, HTTP_PORT)
}
