use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use devmonitor_core::events::FeedEvent;
use devmonitor_core::medium::FileMedium;
use devmonitor_core::models::{
    AlertPatch, AlertStatus, DevicePatch, DeviceStatus, NewDevice, UserRef,
};
use devmonitor_core::monitor::MonitorStore;
use devmonitor_core::paths::data_dir;
use devmonitor_core::snapshot::Snapshot;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "devmonitor")]
#[command(about = "Local data store for the DevMonitor dashboard", long_about = None)]
struct Cli {
    /// Data directory override
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the store with the default collections
    Init,

    /// Print the derived dashboard document
    Dashboard,

    /// Print one collection
    List {
        collection: Collection,
    },

    /// Register a device (status defaults to PENDING)
    AddDevice {
        /// Display name of the device
        name: String,
        /// Stable device identifier
        device_id: String,
        /// Owner's email
        email: String,
        /// Owner's display name
        #[arg(long)]
        user_name: Option<String>,
    },

    /// Mark a device AUTHORIZED
    AuthorizeDevice {
        id: u64,
    },

    /// Mark an alert READ
    AckAlert {
        id: u64,
    },

    /// Fold feed records (one JSON object per line) into the store
    Feed {
        file: PathBuf,
    },

    /// Write a full snapshot to a file, or stdout when omitted
    Export {
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Import a snapshot; only the keys present in the file are overwritten
    Import {
        file: PathBuf,
    },

    /// Delete all collections and re-seed the defaults
    Reset,

    /// Print the security settings document
    Settings,
}

#[derive(Clone, Copy, ValueEnum)]
enum Collection {
    Users,
    Devices,
    Activities,
    Repositories,
    Alerts,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let dir = match cli.data_dir {
        Some(dir) => dir,
        None => data_dir()?,
    };
    let store: MonitorStore<FileMedium> = MonitorStore::open(&dir)?;

    match cli.command {
        Commands::Init => {
            let dashboard = store.dashboard();
            println!("Store ready at {}", dir.display());
            println!(
                "{} users, {} devices, {} activities, security score {}",
                dashboard.overview.total_users,
                dashboard.overview.total_devices,
                dashboard.overview.total_activities,
                dashboard.overview.security_score
            );
        }

        Commands::Dashboard => {
            println!("{}", serde_json::to_string_pretty(&store.dashboard())?);
        }

        Commands::List { collection } => {
            let json = match collection {
                Collection::Users => serde_json::to_string_pretty(&store.users())?,
                Collection::Devices => serde_json::to_string_pretty(&store.devices())?,
                Collection::Activities => serde_json::to_string_pretty(&store.activities())?,
                Collection::Repositories => serde_json::to_string_pretty(&store.repositories())?,
                Collection::Alerts => serde_json::to_string_pretty(&store.alerts())?,
            };
            println!("{json}");
        }

        Commands::AddDevice {
            name,
            device_id,
            email,
            user_name,
        } => {
            let device = store.add_device(NewDevice {
                device_name: name,
                device_id,
                user: UserRef {
                    id: None,
                    email,
                    name: user_name,
                },
                status: None,
            })?;
            println!("{}", serde_json::to_string_pretty(&device)?);
        }

        Commands::AuthorizeDevice { id } => {
            let device = store.update_device(
                id,
                DevicePatch {
                    status: Some(DeviceStatus::Authorized),
                    ..Default::default()
                },
            )?;
            println!("{}", serde_json::to_string_pretty(&device)?);
        }

        Commands::AckAlert { id } => {
            let alert = store.update_alert(
                id,
                AlertPatch {
                    status: Some(AlertStatus::Read),
                    ..Default::default()
                },
            )?;
            println!("{}", serde_json::to_string_pretty(&alert)?);
        }

        Commands::Feed { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("read {}", file.display()))?;
            let mut folded = 0usize;
            for (lineno, line) in raw.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let event: FeedEvent = serde_json::from_str(line)
                    .map_err(|e| anyhow!("line {}: {e}", lineno + 1))?;
                store.fold_event(event)?;
                folded += 1;
            }
            println!("folded {folded} records");
        }

        Commands::Export { out } => {
            let json = serde_json::to_string_pretty(&store.export())?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("write {}", path.display()))?;
                    println!("snapshot written to {}", path.display());
                }
                None => println!("{json}"),
            }
        }

        Commands::Import { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("read {}", file.display()))?;
            let snapshot: Snapshot = serde_json::from_str(&raw)?;
            store.import(snapshot)?;
            println!("snapshot imported");
        }

        Commands::Reset => {
            store.reset()?;
            println!("store reset to defaults");
        }

        Commands::Settings => {
            println!("{}", serde_json::to_string_pretty(&store.security_settings())?);
        }
    }

    Ok(())
}
