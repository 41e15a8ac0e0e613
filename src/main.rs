//! prestoctl CLI - cluster configuration compiler and deployer
//!
//! Usage: prestoctl <COMMAND>
//!
//! Commands:
//!   configure  Build, validate and deploy configuration to cluster hosts
//!   show       Print the resolved configuration for a role

use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use prestoctl::bundle::{output_format, ConfigBundle};
use prestoctl::deploy::{configure_presto, DeployOptions, DeployReport};
use prestoctl::topology::{default_topology_path, ClusterContext, ClusterTopology, Role};
use prestoctl::transport::SshExecutor;
use prestoctl::{coordinator, overrides, workers};

/// prestoctl - cluster configuration compiler and deployer
#[derive(Parser, Debug)]
#[command(name = "prestoctl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build, validate and deploy configuration to cluster hosts
    Configure {
        /// Role to configure
        #[arg(long, value_enum, default_value = "all")]
        role: RoleArg,

        /// Path to the cluster topology file
        #[arg(long)]
        topology: Option<PathBuf>,

        /// Directory holding per-role override files
        #[arg(long, default_value = "/etc/opt/prestoctl")]
        conf_dir: PathBuf,

        /// Remote directory the configuration is deployed into
        #[arg(long, default_value = "/etc/presto")]
        remote_dir: String,

        /// Show pending changes without touching any host
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the resolved configuration for a role
    Show {
        /// Role to resolve
        #[arg(long, value_enum, default_value = "workers")]
        role: RoleArg,

        /// Path to the cluster topology file
        #[arg(long)]
        topology: Option<PathBuf>,

        /// Directory holding per-role override files
        #[arg(long, default_value = "/etc/opt/prestoctl")]
        conf_dir: PathBuf,

        /// Emit JSON instead of the on-disk text format
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RoleArg {
    Coordinator,
    Workers,
    All,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Configure {
            role,
            topology,
            conf_dir,
            remote_dir,
            dry_run,
        } => cmd_configure(role, topology, conf_dir, &remote_dir, dry_run),
        Commands::Show {
            role,
            topology,
            conf_dir,
            json,
        } => cmd_show(role, topology, conf_dir, json),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}

fn cmd_configure(
    role: RoleArg,
    topology_path: Option<PathBuf>,
    conf_dir: PathBuf,
    remote_dir: &str,
    dry_run: bool,
) -> Result<()> {
    let topology = load_topology(topology_path)?;
    let mut failed: Vec<String> = Vec::new();

    // All bundles are built and validated up front, so a configuration
    // error aborts the run before any host is touched.
    if matches!(role, RoleArg::Coordinator | RoleArg::All) {
        configure_coordinator(&topology, &conf_dir, remote_dir, dry_run, &mut failed)?;
    }
    if matches!(role, RoleArg::Workers | RoleArg::All) {
        configure_workers(&topology, &conf_dir, remote_dir, dry_run, &mut failed)?;
    }

    if !failed.is_empty() {
        bail!(
            "configuration failed on {} host(s): {}",
            failed.len(),
            failed.join(", ")
        );
    }
    Ok(())
}

fn configure_coordinator(
    topology: &ClusterTopology,
    conf_dir: &std::path::Path,
    remote_dir: &str,
    dry_run: bool,
    failed: &mut Vec<String>,
) -> Result<()> {
    let hosts = topology.roles(Role::Coordinator);
    let Some(first) = hosts.first() else {
        warn!("topology defines no coordinator host");
        return Ok(());
    };

    let ctx = ClusterContext::new(first.clone(), topology.clone());
    let conf = coordinator::get_conf(&ctx, overrides::load(&conf_dir.join("coordinator"))?)?;

    for host in &hosts {
        deploy_to_host(host, &conf, remote_dir, dry_run, failed);
    }
    Ok(())
}

fn configure_workers(
    topology: &ClusterTopology,
    conf_dir: &std::path::Path,
    remote_dir: &str,
    dry_run: bool,
    failed: &mut Vec<String>,
) -> Result<()> {
    // A host that also carries the coordinator role keeps its coordinator
    // configuration and is skipped here.
    let contexts: Vec<ClusterContext> = topology
        .roles(Role::Workers)
        .into_iter()
        .map(|host| ClusterContext::new(host, topology.clone()))
        .filter(|ctx| {
            if ctx.is_coordinator() {
                info!(host = %ctx.current_host, "skipping worker pass on coordinator host");
                return false;
            }
            true
        })
        .collect();

    let Some(first) = contexts.first() else {
        info!("no worker-only hosts to configure");
        return Ok(());
    };

    let conf = workers::get_conf(first, overrides::load(&conf_dir.join("workers"))?)?;

    for ctx in &contexts {
        deploy_to_host(&ctx.current_host, &conf, remote_dir, dry_run, failed);
    }
    Ok(())
}

fn deploy_to_host(
    host: &str,
    conf: &ConfigBundle,
    remote_dir: &str,
    dry_run: bool,
    failed: &mut Vec<String>,
) {
    let executor = SshExecutor::new(host);
    match configure_presto(&executor, conf, remote_dir, DeployOptions { dry_run }) {
        Ok(report) => print_report(host, &report, dry_run),
        Err(e) => {
            error!(host, error = %e, "deployment failed");
            failed.push(host.to_string());
        }
    }
}

fn print_report(host: &str, report: &DeployReport, dry_run: bool) {
    if dry_run {
        for change in &report.changes {
            println!("--- {}:{}", host, change.file);
            print!("{}", change.diff);
        }
        if report.has_changes() {
            println!("{}: {} file(s) would change", host, report.written.len());
        } else {
            println!("{}: up to date", host);
        }
    } else {
        println!(
            "{}: deployed {} file(s), {} unchanged",
            host,
            report.written.len(),
            report.skipped.len()
        );
    }
}

fn cmd_show(
    role: RoleArg,
    topology_path: Option<PathBuf>,
    conf_dir: PathBuf,
    json: bool,
) -> Result<()> {
    let topology = load_topology(topology_path)?;

    let conf = match role {
        RoleArg::Coordinator => {
            let hosts = topology.roles(Role::Coordinator);
            let host = hosts
                .first()
                .ok_or_else(|| anyhow!("topology defines no coordinator host"))?;
            let ctx = ClusterContext::new(host.clone(), topology.clone());
            coordinator::get_conf(&ctx, overrides::load(&conf_dir.join("coordinator"))?)?
        }
        RoleArg::Workers => {
            let hosts = topology.roles(Role::Workers);
            let host = hosts
                .first()
                .ok_or_else(|| anyhow!("topology defines no worker host"))?;
            let ctx = ClusterContext::new(host.clone(), topology.clone());
            workers::get_conf(&ctx, overrides::load(&conf_dir.join("workers"))?)?
        }
        RoleArg::All => bail!("--role must be coordinator or workers for show"),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&conf)?);
    } else {
        for (key, content) in conf.iter() {
            println!("=== {} ===", key);
            println!("{}", output_format(content));
            println!();
        }
    }
    Ok(())
}

fn load_topology(path: Option<PathBuf>) -> Result<ClusterTopology> {
    let path = match path {
        Some(path) => path,
        None => default_topology_path()
            .ok_or_else(|| anyhow!("cannot resolve home directory; pass --topology"))?,
    };

    let (topology, warnings) = ClusterTopology::load(&path)?;
    for warning in warnings {
        match warning.suggestion {
            Some(suggestion) => warn!(
                key = %warning.key,
                file = %warning.file.display(),
                "unknown topology key, did you mean '{}'?", suggestion
            ),
            None => warn!(
                key = %warning.key,
                file = %warning.file.display(),
                "unknown topology key"
            ),
        }
    }
    Ok(topology)
}
