//! Cluster topology and per-run context
//!
//! The role registry is an explicit value loaded from a TOML file and
//! threaded through every call as part of a `ClusterContext`, rather than
//! ambient global state. This keeps the configuration builders pure and
//! testable in isolation.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ConfigurationError, PrestoResult};

/// Logical host group within the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Coordinator,
    Workers,
    All,
}

#[derive(Debug, Default, Deserialize)]
struct TopologyFile {
    #[serde(default)]
    roles: RolesSection,
}

#[derive(Debug, Default, Deserialize)]
struct RolesSection {
    #[serde(default)]
    coordinator: Vec<String>,
    #[serde(default)]
    workers: Vec<String>,
}

/// Non-fatal topology warning surfaced to CLI users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyWarning {
    pub key: String,
    pub file: PathBuf,
    pub suggestion: Option<String>,
}

/// Host membership for each role in the cluster.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterTopology {
    pub coordinator: Vec<String>,
    pub workers: Vec<String>,
}

impl ClusterTopology {
    /// Load a topology and collect non-fatal warnings (e.g. unknown keys).
    pub fn load(path: &Path) -> PrestoResult<(ClusterTopology, Vec<TopologyWarning>)> {
        let content = fs::read_to_string(path)?;

        let mut unknown_paths: Vec<String> = Vec::new();
        let deserializer = toml::de::Deserializer::new(&content);

        let file: TopologyFile = serde_ignored::deserialize(deserializer, |p| {
            unknown_paths.push(p.to_string());
        })
        .map_err(|e| ConfigurationError::InvalidTopology {
            file: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let warnings = unknown_paths
            .into_iter()
            .map(|path_str| {
                let key = path_str
                    .split('.')
                    .next_back()
                    .unwrap_or(path_str.as_str())
                    .to_string();
                TopologyWarning {
                    suggestion: suggest_key(&key),
                    key,
                    file: path.to_path_buf(),
                }
            })
            .collect();

        Ok((
            ClusterTopology {
                coordinator: file.roles.coordinator,
                workers: file.roles.workers,
            },
            warnings,
        ))
    }

    /// Hosts carrying the given role.
    pub fn roles(&self, role: Role) -> Vec<String> {
        match role {
            Role::Coordinator => self.coordinator.clone(),
            Role::Workers => self.workers.clone(),
            Role::All => self.all(),
        }
    }

    /// Ordered union of every host, coordinator first, duplicates removed.
    pub fn all(&self) -> Vec<String> {
        let mut hosts: Vec<String> = Vec::new();
        for host in self.coordinator.iter().chain(self.workers.iter()) {
            if !hosts.contains(host) {
                hosts.push(host.clone());
            }
        }
        hosts
    }

    /// Whether the cluster spans more than one distinct host.
    pub fn is_multi_node(&self) -> bool {
        self.all().len() > 1
    }
}

/// One resolved host within a run.
///
/// Carries the topology alongside the host currently being configured, so
/// no builder needs to consult global state.
#[derive(Debug, Clone)]
pub struct ClusterContext {
    pub current_host: String,
    pub topology: ClusterTopology,
}

impl ClusterContext {
    pub fn new(current_host: impl Into<String>, topology: ClusterTopology) -> Self {
        Self {
            current_host: current_host.into(),
            topology,
        }
    }

    /// Address of the coordinator: the first entry of the coordinator role.
    pub fn coordinator(&self) -> PrestoResult<&str> {
        self.topology
            .coordinator
            .first()
            .map(String::as_str)
            .ok_or_else(|| ConfigurationError::NoCoordinator.into())
    }

    /// Whether the current host also carries the coordinator role.
    pub fn is_coordinator(&self) -> bool {
        self.topology
            .coordinator
            .iter()
            .any(|host| host == &self.current_host)
    }
}

/// Whether a host identifier resolves to the local machine.
pub fn is_localhost(host: &str) -> bool {
    matches!(host, "localhost" | "127.0.0.1")
}

/// Default topology location: `~/.prestoctl/cluster.toml`.
pub fn default_topology_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".prestoctl").join("cluster.toml"))
}

fn suggest_key(unknown: &str) -> Option<String> {
    const CANDIDATES: &[&str] = &["roles", "coordinator", "workers"];

    let mut best: Option<(&str, usize)> = None;
    for candidate in CANDIDATES {
        let dist = levenshtein(unknown, candidate);
        best = match best {
            None => Some((candidate, dist)),
            Some((_, best_dist)) if dist < best_dist => Some((candidate, dist)),
            Some(current) => Some(current),
        };
    }

    match best {
        Some((candidate, dist)) if dist <= 2 => Some(candidate.to_string()),
        _ => None,
    }
}

fn levenshtein(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }

    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    let mut prev: Vec<usize> = (0..=b_bytes.len()).collect();
    let mut curr = vec![0usize; b_bytes.len() + 1];

    for (i, &ac) in a_bytes.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &bc) in b_bytes.iter().enumerate() {
            let cost = if ac == bc { 0 } else { 1 };
            curr[j + 1] =
                std::cmp::min(std::cmp::min(prev[j + 1] + 1, curr[j] + 1), prev[j] + cost);
        }
        prev.clone_from_slice(&curr);
    }

    prev[b_bytes.len()]
}
