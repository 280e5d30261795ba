//! Learning portal operator CLI (`portal`)
//!
//! Loads the bootstrap configuration, initializes logging, opens the
//! organization snapshot (or the demo tenants when there is none), runs one
//! command against the store and writes the snapshot back if it changed.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use portal_common::config::PortalConfig;
use portal_common::PortalStore;

mod commands;

/// Command-line arguments for portal
#[derive(Parser, Debug)]
#[command(name = "portal")]
#[command(about = "Operator command line for the learning portal content store")]
#[command(version)]
struct Args {
    /// Bootstrap configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Organization snapshot file (JSON); read at start, written on change
    #[arg(short, long, global = true, env = "PORTAL_SNAPSHOT")]
    snapshot: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List organizations with curriculum size and completion
    List,

    /// Provision a new, empty organization
    CreateOrg {
        name: String,
        /// Primary theme color (hex)
        #[arg(long, default_value = "#6366f1")]
        color: String,
    },

    /// Print an organization as interchange JSON
    Export { organization_id: String },

    /// Replace an organization with the contents of an edited export
    Replace { organization_id: String, file: PathBuf },

    /// Append an empty phase to an organization
    AddPhase { organization_id: String, title: String },

    /// Flip a lesson's completed flag
    Toggle {
        organization_id: String,
        phase_id: String,
        module_id: String,
        lesson_id: String,
    },

    /// Show an organization's roster with progress and overall score
    Roster { organization_id: String },

    /// Find users by name or organization name
    Search { term: String },

    /// Generate a program with the offline demo generator and append it
    Genesis { organization_id: String, prompt: String },

    /// Check a login; without --org this is a master login
    Login {
        username: String,
        password: String,
        /// Organization slug for a client login
        #[arg(long)]
        org: Option<String>,
    },
}

impl Command {
    /// Whether a successful run may have changed the collection
    fn mutates(&self) -> bool {
        matches!(
            self,
            Command::CreateOrg { .. }
                | Command::Replace { .. }
                | Command::AddPhase { .. }
                | Command::Toggle { .. }
                | Command::Genesis { .. }
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = PortalConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    info!("portal v{}", env!("CARGO_PKG_VERSION"));

    let snapshot = args.snapshot.clone().or_else(|| config.snapshot_path.clone());
    let store = open_store(snapshot.as_deref())?;

    let mutates = args.command.mutates();
    let store = commands::run(args.command, store, &config).await?;

    match snapshot {
        Some(path) if mutates => {
            store
                .save_snapshot(&path)
                .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
            info!("Snapshot saved to {}", path.display());
        }
        Some(_) => debug!("Read-only command, snapshot left as is"),
        None => debug!("No snapshot configured, changes discarded"),
    }
    Ok(())
}

fn open_store(snapshot: Option<&Path>) -> Result<PortalStore> {
    match snapshot {
        Some(path) if path.exists() => PortalStore::load_snapshot(path)
            .with_context(|| format!("Failed to load snapshot {}", path.display())),
        Some(path) => {
            info!("Snapshot {} not found, starting from demo data", path.display());
            Ok(PortalStore::with_demo_data())
        }
        None => Ok(PortalStore::with_demo_data()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_toggle() {
        let args = Args::try_parse_from(["portal", "toggle", "c1", "p1", "w1", "l1"]).unwrap();
        assert!(args.command.mutates());
        assert!(matches!(args.command, Command::Toggle { ref lesson_id, .. } if lesson_id == "l1"));
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let args = Args::try_parse_from(["portal", "list", "--snapshot", "/tmp/s.json"]).unwrap();
        assert_eq!(args.snapshot, Some(PathBuf::from("/tmp/s.json")));
        assert!(!args.command.mutates());
    }

    #[test]
    fn test_create_org_default_color() {
        let args = Args::try_parse_from(["portal", "create-org", "Acme Learning"]).unwrap();
        match args.command {
            Command::CreateOrg { name, color } => {
                assert_eq!(name, "Acme Learning");
                assert_eq!(color, "#6366f1");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
