#![forbid(unsafe_code)]

//! Command-line front end: refresh Manager info and manage the scene's
//! job type and worker tag choices.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use flamenco_sync_client::{client_version, ClientSlot};
use flamenco_sync_core::{
    encode, job_type_items, refresh, worker_tag_items, CacheStore, EnumItem, ReportLevel,
    SelectionKind, NO_SELECTION_ID,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod scene;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "flamenco-syncctl", version, about = "Sync with a Flamenco Manager")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Manager URL, e.g. http://localhost:8080/
    #[arg(
        long,
        env = "FLAMENCO_MANAGER_URL",
        default_value = "http://localhost:8080/",
        global = true
    )]
    pub manager_url: String,

    /// Manager info cache file. Defaults to the per-user config directory.
    #[arg(long, env = "FLAMENCO_MANAGER_INFO", global = true)]
    pub cache_file: Option<PathBuf>,

    /// Scene selections file. Defaults to the per-user config directory.
    #[arg(long, env = "FLAMENCO_SCENE", global = true)]
    pub scene_file: Option<PathBuf>,

    /// HTTP timeout per request.
    #[arg(long, env = "FLAMENCO_TIMEOUT_SECS", default_value_t = 10, global = true)]
    pub timeout_secs: u64,

    /// Log level (env-filter syntax).
    #[arg(long, env = "RUST_LOG", default_value = "info", global = true)]
    pub log: String,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Fetch Manager info, cache it and re-check the scene's choices
    Refresh,
    /// Print the cached Manager info
    Show,
    /// List the job types to choose from
    JobTypes,
    /// List the worker tags to choose from
    Tags,
    /// Choose a job type; "-" unsets it
    SelectJobType { name: String },
    /// Choose a worker tag; "-" unsets it
    SelectTag { id: String },
    /// Forget the cached Manager info
    ClearCache,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&cli.global.log))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cfg = Config::resolve(&cli.global)?;
    let store = CacheStore::new(cfg.cache_file.clone());

    match cli.cmd {
        Cmd::Refresh => {
            let slot = ClientSlot::new(cfg.timeout);
            let client = slot.get_or_create(&cfg.manager_url)?;
            info!(client = client_version(), manager = %cfg.manager_url, "refreshing");

            let mut scene = scene::load(&cfg.scene_file)?;
            let mut status = String::new();
            let report = refresh(client.as_ref(), &store, &mut scene, &mut status);
            scene::save(&cfg.scene_file, &scene)?;

            drop(client);
            slot.discard(&store);

            println!("{}: {}", report.level, report.text);
            if report.level == ReportLevel::Error {
                return Ok(ExitCode::FAILURE);
            }
        }
        Cmd::Show => match store.get_cached() {
            Some(snapshot) => {
                let bytes = encode(&snapshot).context("encode manager info")?;
                println!("{}", String::from_utf8_lossy(&bytes));
            }
            None => println!("No Manager info cached; run `refresh` first."),
        },
        Cmd::JobTypes => print_items(&job_type_items(store.get_cached().as_deref())),
        Cmd::Tags => print_items(&worker_tag_items(store.get_cached().as_deref())),
        Cmd::SelectJobType { name } => select(&cfg, &store, SelectionKind::JobType, &name)?,
        Cmd::SelectTag { id } => select(&cfg, &store, SelectionKind::WorkerTag, &id)?,
        Cmd::ClearCache => {
            store.clear();
            match std::fs::remove_file(store.path()) {
                Ok(()) => println!("Removed {}", store.path().display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    println!("No cache at {}", store.path().display())
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("remove {}", store.path().display()))
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_items(items: &[EnumItem]) {
    for item in items {
        if item.description.is_empty() {
            println!("{}\t{}", item.id, item.name);
        } else {
            println!("{}\t{}\t{}", item.id, item.name, item.description);
        }
    }
}

/// Stores a choice, only accepting identifiers the cached Manager info knows.
fn select(cfg: &Config, store: &CacheStore, kind: SelectionKind, id: &str) -> anyhow::Result<()> {
    let mut scene = scene::load(&cfg.scene_file)?;
    let selection = match kind {
        SelectionKind::JobType => &mut scene.job_type,
        SelectionKind::WorkerTag => &mut scene.worker_tag,
    };

    if id == NO_SELECTION_ID || id.is_empty() {
        selection.clear();
    } else {
        let Some(snapshot) = store.get_cached() else {
            bail!("no Manager info cached; run `refresh` first");
        };
        if !kind.candidates(&snapshot).contains(&id) {
            bail!("{} '{}' is not offered by the Manager", kind.label(), id);
        }
        selection.set(id);
    }
    let shown = selection.get().unwrap_or("(none)").to_string();

    scene::save(&cfg.scene_file, &scene)?;
    println!("{} set to {shown}", kind.label());
    Ok(())
}
