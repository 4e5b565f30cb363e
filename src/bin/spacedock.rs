use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, bail};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use clap::{Parser, Subcommand};
use spacedock::common::config::{Config, config_file};
use spacedock::common::log;
use spacedock::host::OsascriptBridge;
use spacedock::model::{SpaceId, WindowId};
use spacedock::remote::Remote;
use spacedock::store::{SpaceStore, StoreEvent};
use tokio::sync::mpsc::UnboundedReceiver;

#[derive(Parser)]
#[command(name = "spacedock", about = "Control macOS spaces and windows through Hammerspoon")]
struct Cli {
    /// Print results as JSON.
    #[arg(long)]
    json: bool,

    /// Path to configuration file to use (overrides default).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all spaces across all screens.
    Spaces,
    /// Create a space on the active screen and switch to it.
    Create,
    /// Remove a space by id.
    Remove { id: String },
    /// Remove the currently focused space, falling back to its
    /// predecessor.
    RemoveCurrent,
    /// Switch to a space.
    Goto { id: String },
    /// List the windows of one space.
    Windows { space_id: String },
    /// List windows across all spaces.
    AllWindows,
    /// Focus a window by id.
    Focus { id: String },
    /// Capture a window snapshot.
    Snapshot {
        id: String,
        /// Decode the snapshot and write it to this file instead of
        /// printing the data-URI.
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
    /// Execute a Lua chunk on the host verbatim and print the raw reply.
    /// Reads the chunk from stdin when not given as an argument.
    Exec { script: Option<String> },
}

fn main() -> anyhow::Result<()> {
    log::init_logging();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(config_file);
    let config = if config_path.exists() {
        Config::read(&config_path)?
    } else {
        Config::default()
    };
    let issues = config.validate();
    if !issues.is_empty() {
        bail!("Invalid config at {}: {}", config_path.display(), issues.join("; "));
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;
    runtime.block_on(run(cli, config))
}

async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    let bridge = OsascriptBridge::new(config.host_app.as_str());
    let remote = Remote::new(bridge.clone(), &config);
    let (store, mut events) = SpaceStore::new(remote, &config);

    match cli.command {
        Commands::Spaces => {
            store.fetch_spaces().await;
            check(&mut events)?;
            let spaces = store.spaces();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&spaces)?);
            } else {
                for space in &spaces {
                    let marker = if space.is_current { "*" } else { " " };
                    println!(
                        "{marker} {:>6}  {}  ({})",
                        space.id, space.name, space.screen_name
                    );
                }
            }
        }
        Commands::Create => {
            store.create_space().await;
            check(&mut events)?;
            if let Some(space) = store.spaces().iter().find(|space| space.is_current) {
                println!("Created and switched to space {}", space.id);
            }
        }
        Commands::Remove { id } => {
            store.remove_space(&SpaceId::new(id.clone())).await;
            check(&mut events)?;
            println!("Removed space {id}");
        }
        Commands::RemoveCurrent => {
            store.remove_current_space().await;
            check(&mut events)?;
            println!("Removed current space");
        }
        Commands::Goto { id } => {
            store.goto_space(&SpaceId::new(id.clone())).await;
            check(&mut events)?;
            println!("Switched to space {id}");
        }
        Commands::Windows { space_id } => {
            let space_id = SpaceId::new(space_id);
            store.fetch_space_windows(&space_id).await;
            check(&mut events)?;
            let windows = store.space_windows(&space_id).unwrap_or_default();
            print_windows(&store, &windows, cli.json)?;
        }
        Commands::AllWindows => {
            store.fetch_all_windows().await;
            check(&mut events)?;
            let windows = store.all_windows();
            print_windows(&store, &windows, cli.json)?;
        }
        Commands::Focus { id } => {
            store.focus_window(&WindowId::new(id.clone())).await;
            check(&mut events)?;
            println!("Focused window {id}");
        }
        Commands::Snapshot { id, out } => {
            let window_id = WindowId::new(id.clone());
            store.fetch_window_snapshot(&window_id).await;
            check(&mut events)?;
            match store.snapshot(&window_id).flatten() {
                Some(uri) => match out {
                    Some(path) => {
                        let bytes = decode_data_uri(&uri)?;
                        std::fs::write(&path, bytes)
                            .with_context(|| format!("Failed to write {}", path.display()))?;
                        println!("Wrote snapshot of window {id} to {}", path.display());
                    }
                    None => println!("{uri}"),
                },
                None => println!("Window {id} has no snapshot (minimized or no surface)"),
            }
        }
        Commands::Exec { script } => {
            let script = match script {
                Some(script) => script,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("Failed to read script from stdin")?;
                    buf
                }
            };
            let raw = Remote::new(bridge, &config);
            let reply = raw.execute_raw(&script).await?;
            println!("{reply}");
        }
    }

    Ok(())
}

fn print_windows(
    store: &SpaceStore<OsascriptBridge>,
    windows: &[spacedock::model::WindowInfo],
    json: bool,
) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(windows)?);
        return Ok(());
    }
    for window in windows {
        let mut flags = String::new();
        if window.is_minimized {
            flags.push_str(" [min]");
        }
        if window.is_fullscreen {
            flags.push_str(" [fs]");
        }
        let icon = store
            .app_icon(&window.application)
            .map(|path| format!("  ({})", path.display()))
            .unwrap_or_default();
        println!("{:>8}  {}: {}{flags}{icon}", window.id, window.application, window.title);
    }
    Ok(())
}

/// Surface store-reported failures as a process failure. The store never
/// throws; it resets the affected key and queues a notification instead.
fn check(events: &mut UnboundedReceiver<StoreEvent>) -> anyhow::Result<()> {
    if let Ok(StoreEvent::FetchFailed { context, message }) = events.try_recv() {
        bail!("Failed to {context}: {message}");
    }
    Ok(())
}

/// Decode the base64 payload of a `data:` URI as produced by the host's
/// snapshot encoding.
fn decode_data_uri(uri: &str) -> anyhow::Result<Vec<u8>> {
    let payload = uri.split_once("base64,").map(|(_, rest)| rest).unwrap_or(uri);
    BASE64
        .decode(payload.trim())
        .context("Snapshot is not valid base64 data")
}
