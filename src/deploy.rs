//! Remote deployment of rendered configuration
//!
//! Every file is written as a full overwrite through a single-quoted
//! `echo` command; merging already happened in the builder. The one
//! exception is `node.properties`: the host's `node.id` line is minted
//! remotely on the first-ever deployment and must survive every later
//! one, so its rewrite runs as one composed remote script.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};
use similar::TextDiff;
use tracing::{debug, info};

use crate::bundle::{output_format, ConfigBundle, FileKey};
use crate::error::PrestoResult;
use crate::escaping::escape_single_quotes;
use crate::transport::RemoteExecutor;

/// Options for a deployment run
#[derive(Debug, Clone, Copy, Default)]
pub struct DeployOptions {
    /// Report pending changes without touching the host
    pub dry_run: bool,
}

/// One file's pending change, computed during a dry run.
#[derive(Debug, Clone)]
pub struct PendingChange {
    pub file: FileKey,
    /// Unified diff between the current remote content and the rendered
    /// content
    pub diff: String,
}

/// Result of deploying one host
#[derive(Debug, Clone, Default)]
pub struct DeployReport {
    /// Files that were written (or would be, in a dry run)
    pub written: Vec<FileKey>,
    /// Files whose remote content already matched
    pub skipped: Vec<FileKey>,
    /// Dry-run only: the diffs behind `written`
    pub changes: Vec<PendingChange>,
}

impl DeployReport {
    pub fn has_changes(&self) -> bool {
        !self.written.is_empty()
    }
}

/// Deploy a fully resolved bundle to one host.
///
/// `node.properties` goes through the identity-preserving path; every
/// other file is overwritten outright.
pub fn configure_presto<E: RemoteExecutor>(
    executor: &E,
    conf: &ConfigBundle,
    remote_dir: &str,
    options: DeployOptions,
) -> PrestoResult<DeployReport> {
    let mut rendered: BTreeMap<FileKey, String> = conf
        .iter()
        .map(|(key, content)| (*key, output_format(content)))
        .collect();
    let node_properties = rendered.remove(&FileKey::NodeProperties);

    if options.dry_run {
        return preview(executor, &rendered, node_properties.as_deref(), remote_dir);
    }

    let mut report = deploy(executor, &rendered, remote_dir)?;
    if let Some(content) = node_properties {
        deploy_node_properties(executor, &content, remote_dir)?;
        report.written.push(FileKey::NodeProperties);
    }
    Ok(report)
}

/// Write every rendered file into `remote_dir`, overwriting what is there.
///
/// A file whose remote SHA-256 already matches the rendered content is
/// left untouched and reported as skipped.
pub fn deploy<E: RemoteExecutor>(
    executor: &E,
    files: &BTreeMap<FileKey, String>,
    remote_dir: &str,
) -> PrestoResult<DeployReport> {
    let mut report = DeployReport::default();
    executor.run_privileged(&format!("mkdir -p {}", remote_dir))?;

    for (key, content) in files {
        let path = format!("{}/{}", remote_dir, key);
        if remote_hash(executor, &path)?.as_deref() == Some(local_hash(content).as_str()) {
            debug!(host = %executor.host(), file = %key, "unchanged, skipping");
            report.skipped.push(*key);
            continue;
        }
        executor.run_privileged(&format!(
            "echo '{}' > {}",
            escape_single_quotes(content),
            path
        ))?;
        info!(host = %executor.host(), file = %key, "deployed");
        report.written.push(*key);
    }

    Ok(report)
}

/// Rewrite `node.properties` while preserving the host's `node.id` line.
///
/// The whole read-mint-strip sequence runs as one remote script so there
/// is no window in which the file lacks an identity line; the fresh
/// content is then appended behind the surviving line.
pub fn deploy_node_properties<E: RemoteExecutor>(
    executor: &E,
    content: &str,
    remote_dir: &str,
) -> PrestoResult<()> {
    let path = format!("{}/{}", remote_dir, FileKey::NodeProperties);
    executor.run_privileged(&node_id_script(&path))?;
    executor.append(&path, content)?;
    info!(host = %executor.host(), file = %FileKey::NodeProperties, "deployed");
    Ok(())
}

fn node_id_script(path: &str) -> String {
    format!(
        "if ! ( grep -q 'node.id' {path} ); then \
uuid=$(uuidgen); \
echo node.id=$uuid >> {path};\
fi; \
sed -i '/node.id/!d' {path}; "
    )
}

fn preview<E: RemoteExecutor>(
    executor: &E,
    files: &BTreeMap<FileKey, String>,
    node_properties: Option<&str>,
    remote_dir: &str,
) -> PrestoResult<DeployReport> {
    let mut report = DeployReport::default();

    for (key, content) in files {
        let path = format!("{}/{}", remote_dir, key);
        preview_file(executor, *key, &path, &format!("{}\n", content), &mut report)?;
    }

    if let Some(content) = node_properties {
        let path = format!("{}/{}", remote_dir, FileKey::NodeProperties);
        // The surviving identity line stays at the top of the rewritten
        // file; an identity a first deployment would mint is unknown
        // ahead of time and absent from the preview.
        let current = executor.read(&path)?;
        let node_id = current.lines().find(|line| line.contains("node.id"));
        let rendered = match node_id {
            Some(id) => format!("{}\n{}\n", id, content),
            None => format!("{}\n", content),
        };
        preview_file(executor, FileKey::NodeProperties, &path, &rendered, &mut report)?;
    }

    Ok(report)
}

fn preview_file<E: RemoteExecutor>(
    executor: &E,
    key: FileKey,
    path: &str,
    rendered: &str,
    report: &mut DeployReport,
) -> PrestoResult<()> {
    let current = executor.read(path)?;
    if current == rendered {
        report.skipped.push(key);
        return Ok(());
    }
    let diff = TextDiff::from_lines(current.as_str(), rendered)
        .unified_diff()
        .header("remote", "local")
        .to_string();
    report.written.push(key);
    report.changes.push(PendingChange { file: key, diff });
    Ok(())
}

fn remote_hash<E: RemoteExecutor>(executor: &E, path: &str) -> PrestoResult<Option<String>> {
    let output = executor.run_privileged(&format!("sha256sum {} 2>/dev/null || true", path))?;
    Ok(output.split_whitespace().next().map(str::to_string))
}

// `echo '<content>' > <path>` terminates the file with a newline, so the
// local hash must cover it too.
fn local_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hasher.update(b"\n");
    format!("{:x}", hasher.finalize())
}
