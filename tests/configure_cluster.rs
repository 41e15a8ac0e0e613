//! End-to-end configuration deployment against an in-memory remote host.
//!
//! `FakeRemote` interprets exactly the command shapes the executor issues
//! (mkdir, echo-overwrite, echo-append, sha256sum, cat, and the node.id
//! minting script) over an in-memory file map, so the full deploy flow can
//! run without a real host.

use std::cell::RefCell;
use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use prestoctl::bundle::{ConfigBundle, FileContent, FileKey};
use prestoctl::deploy::{configure_presto, deploy_node_properties, DeployOptions};
use prestoctl::topology::{ClusterContext, ClusterTopology};
use prestoctl::transport::{RemoteExecutor, TransportError};
use prestoctl::workers;

struct FakeRemote {
    files: RefCell<BTreeMap<String, String>>,
    minted_ids: RefCell<u32>,
}

impl FakeRemote {
    fn new() -> Self {
        Self {
            files: RefCell::new(BTreeMap::new()),
            minted_ids: RefCell::new(0),
        }
    }

    fn file(&self, path: &str) -> Option<String> {
        self.files.borrow().get(path).cloned()
    }

    fn unescape(content: &str) -> String {
        content.replace("'\\''", "'")
    }

    fn apply_node_id_script(&self, path: &str) {
        let mut text = self.file(path).unwrap_or_default();
        if !text.lines().any(|line| line.contains("node.id")) {
            let mut counter = self.minted_ids.borrow_mut();
            *counter += 1;
            text.push_str(&format!(
                "node.id=ffffffff-0000-0000-0000-{:012}\n",
                *counter
            ));
        }
        let kept: String = text
            .lines()
            .filter(|line| line.contains("node.id"))
            .map(|line| format!("{}\n", line))
            .collect();
        self.files.borrow_mut().insert(path.to_string(), kept);
    }
}

impl RemoteExecutor for FakeRemote {
    fn host(&self) -> &str {
        "fake-host"
    }

    fn run_privileged(&self, command: &str) -> Result<String, TransportError> {
        if command.starts_with("mkdir -p ") {
            return Ok(String::new());
        }
        if let Some(path) = command
            .strip_prefix("cat ")
            .and_then(|rest| rest.strip_suffix(" 2>/dev/null || true"))
        {
            return Ok(self.file(path).unwrap_or_default());
        }
        if let Some(path) = command
            .strip_prefix("sha256sum ")
            .and_then(|rest| rest.strip_suffix(" 2>/dev/null || true"))
        {
            return Ok(match self.file(path) {
                Some(content) => {
                    let mut hasher = Sha256::new();
                    hasher.update(content.as_bytes());
                    format!("{:x}  {}", hasher.finalize(), path)
                }
                None => String::new(),
            });
        }
        if let Some(rest) = command.strip_prefix("if ! ( grep -q 'node.id' ") {
            let path = &rest[..rest.find(" );").expect("malformed node.id script")];
            self.apply_node_id_script(path);
            return Ok(String::new());
        }
        if let Some(rest) = command.strip_prefix("echo '") {
            if let Some(split) = rest.rfind("' >> ") {
                let (content, path) = (&rest[..split], &rest[split + 5..]);
                let mut files = self.files.borrow_mut();
                let entry = files.entry(path.to_string()).or_default();
                entry.push_str(&Self::unescape(content));
                entry.push('\n');
                return Ok(String::new());
            }
            if let Some(split) = rest.rfind("' > ") {
                let (content, path) = (&rest[..split], &rest[split + 4..]);
                self.files
                    .borrow_mut()
                    .insert(path.to_string(), format!("{}\n", Self::unescape(content)));
                return Ok(String::new());
            }
        }
        panic!("FakeRemote cannot interpret command: {}", command);
    }
}

fn worker_context() -> ClusterContext {
    ClusterContext::new(
        "slave1",
        ClusterTopology {
            coordinator: vec!["master".to_string()],
            workers: vec!["slave1".to_string(), "slave2".to_string()],
        },
    )
}

fn node_id_lines(content: &str) -> Vec<&str> {
    content
        .lines()
        .filter(|line| line.contains("node.id"))
        .collect()
}

#[test]
fn first_deployment_writes_every_file_and_mints_an_identity() {
    let remote = FakeRemote::new();
    let conf = workers::get_conf(&worker_context(), ConfigBundle::new()).unwrap();

    let report =
        configure_presto(&remote, &conf, "/etc/presto", DeployOptions::default()).unwrap();

    assert_eq!(
        report.written,
        vec![FileKey::JvmConfig, FileKey::ConfigProperties, FileKey::NodeProperties]
    );

    let jvm = remote.file("/etc/presto/jvm.config").unwrap();
    assert!(jvm.starts_with("-server\n-Xmx1G\n"));
    assert!(jvm.ends_with("-XX:ReservedCodeCacheSize=150M\n"));

    let config = remote.file("/etc/presto/config.properties").unwrap();
    assert!(config.contains("coordinator=false\n"));
    assert!(config.contains("discovery.uri=http://master:8080\n"));

    let node = remote.file("/etc/presto/node.properties").unwrap();
    assert_eq!(node_id_lines(&node).len(), 1);
    assert!(node.starts_with("node.id=ffffffff-"));
    assert!(node.contains("node.environment=presto\n"));
    assert!(node.contains("node.data-dir=/var/lib/presto/data\n"));
}

#[test]
fn redeployment_preserves_the_node_identity() {
    let remote = FakeRemote::new();
    let conf = workers::get_conf(&worker_context(), ConfigBundle::new()).unwrap();
    configure_presto(&remote, &conf, "/etc/presto", DeployOptions::default()).unwrap();

    let first = remote.file("/etc/presto/node.properties").unwrap();
    let first_id = node_id_lines(&first)[0].to_string();

    let mut overrides = ConfigBundle::new();
    let mut props = BTreeMap::new();
    props.insert("node.environment".to_string(), "test".to_string());
    overrides.insert(FileKey::NodeProperties, FileContent::Properties(props));
    let changed = workers::get_conf(&worker_context(), overrides).unwrap();

    configure_presto(&remote, &changed, "/etc/presto", DeployOptions::default()).unwrap();

    let second = remote.file("/etc/presto/node.properties").unwrap();
    assert_eq!(node_id_lines(&second), vec![first_id.as_str()]);
    assert!(second.contains("node.environment=test\n"));
    assert!(!second.contains("node.environment=presto\n"));
}

#[test]
fn unchanged_files_are_skipped_on_redeploy() {
    let remote = FakeRemote::new();
    let conf = workers::get_conf(&worker_context(), ConfigBundle::new()).unwrap();

    configure_presto(&remote, &conf, "/etc/presto", DeployOptions::default()).unwrap();
    let report =
        configure_presto(&remote, &conf, "/etc/presto", DeployOptions::default()).unwrap();

    assert_eq!(report.skipped, vec![FileKey::JvmConfig, FileKey::ConfigProperties]);
    // node.properties always goes through its identity-preserving path
    assert_eq!(report.written, vec![FileKey::NodeProperties]);
}

#[test]
fn repeated_node_properties_deployment_keeps_one_identity_line() {
    let remote = FakeRemote::new();

    deploy_node_properties(&remote, "node.environment=presto", "/etc/presto").unwrap();
    let first = remote.file("/etc/presto/node.properties").unwrap();
    assert_eq!(node_id_lines(&first).len(), 1);

    deploy_node_properties(&remote, "node.environment=test", "/etc/presto").unwrap();
    let second = remote.file("/etc/presto/node.properties").unwrap();

    assert_eq!(node_id_lines(&second), node_id_lines(&first));
    assert!(second.contains("node.environment=test"));
    assert!(!second.contains("node.environment=presto"));
}

#[test]
fn validation_failure_leaves_the_remote_untouched() {
    let remote = FakeRemote::new();
    let mut overrides = ConfigBundle::new();
    let mut props = BTreeMap::new();
    props.insert("coordinator".to_string(), "true".to_string());
    overrides.insert(FileKey::ConfigProperties, FileContent::Properties(props));

    let err = workers::get_conf(&worker_context(), overrides).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Coordinator must be false in the worker's config.properties"
    );
    assert!(remote.files.borrow().is_empty());
}

#[test]
fn dry_run_diffs_against_the_live_remote() {
    let remote = FakeRemote::new();
    let conf = workers::get_conf(&worker_context(), ConfigBundle::new()).unwrap();
    configure_presto(&remote, &conf, "/etc/presto", DeployOptions::default()).unwrap();
    let before = remote.files.borrow().clone();

    let mut overrides = ConfigBundle::new();
    let mut props = BTreeMap::new();
    props.insert("task.max-memory".to_string(), "8GB".to_string());
    overrides.insert(FileKey::ConfigProperties, FileContent::Properties(props));
    let changed = workers::get_conf(&worker_context(), overrides).unwrap();

    let report = configure_presto(
        &remote,
        &changed,
        "/etc/presto",
        DeployOptions { dry_run: true },
    )
    .unwrap();

    assert_eq!(report.written, vec![FileKey::ConfigProperties]);
    let change = &report.changes[0];
    assert!(change.diff.contains("-task.max-memory=1GB"));
    assert!(change.diff.contains("+task.max-memory=8GB"));
    // a dry run never mutates the remote
    assert_eq!(*remote.files.borrow(), before);
}
