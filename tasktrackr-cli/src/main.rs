use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::style::Stylize;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tasktrackr_core::{LoadOutcome, ReminderPoller, TaskStore};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod menu;
mod notify;
mod state;

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("TASKTRACKR_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(name = "tasktrackr", version, long_version = LONG_VERSION, about = "Personal task tracker with reminders")]
struct Cli {
    /// Task file (overrides storage.data_file in ~/.tasktrackr/config.toml)
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    /// Do not run the background reminder check
    #[arg(long, global = true, default_value_t = false)]
    no_reminders: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive menu (default)
    Menu,

    /// Print tasks and exit
    List {
        /// Hide completed tasks
        #[arg(long, default_value_t = false)]
        pending: bool,
    },

    /// Check reminders once and exit
    Remind,

    /// Config file helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write ~/.tasktrackr/config.toml with defaults
    Init,

    /// Show the effective configuration
    Show,
}

/// How the interactive session ended.
enum Ending {
    Menu(Result<Result<()>, tokio::task::JoinError>),
    Signal,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    if let Some(Command::Config { command }) = &cli.command {
        let cfg = config::load_config()?;
        return match command {
            ConfigCommand::Init => config::init_config(),
            ConfigCommand::Show => {
                let data_file = cli.data_file.clone().unwrap_or_else(|| cfg.storage.data_file.clone());
                config::show_config(&cfg, &data_file)
            }
        };
    }

    let cfg = config::load_config_or_default();
    let data_file = cli.data_file.unwrap_or_else(|| cfg.storage.data_file.clone());

    match cli.command.unwrap_or(Command::Menu) {
        Command::Menu => run_interactive(&data_file, &cfg, !cli.no_reminders).await,
        Command::List { pending } => list(&data_file, pending),
        Command::Remind => remind(&data_file),
        Command::Config { .. } => Ok(()),
    }
}

fn init_tracing() {
    // stderr keeps the menu on stdout readable; warnings and errors unless TASKTRACKR_LOG is set.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_env("TASKTRACKR_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
}

/// Load the task file, telling the user about anything that was dropped.
fn open_store(path: &Path) -> TaskStore {
    let (store, report) = TaskStore::open(path);

    for skipped in &report.skipped {
        println!("{}", format!("Error loading task: {}", skipped.reason).red());
    }
    if let LoadOutcome::Malformed { error, backup } = &report.outcome {
        println!("{}", format!("Error: {error}. Starting with an empty task list.").red());
        if let Some(backup) = backup {
            println!("A copy of the unreadable file was saved to {}", backup.display());
        }
    }

    store
}

async fn run_interactive(data_file: &Path, cfg: &config::Config, reminders: bool) -> Result<()> {
    let store = open_store(data_file).into_shared();
    let cancel = CancellationToken::new();

    let poller = if reminders && cfg.reminders.enabled {
        let poller = ReminderPoller::new(store.clone(), Arc::new(notify::ConsoleSink), cancel.clone())
            .with_interval(cfg.reminders.interval());
        Some(tokio::spawn(poller.run()))
    } else {
        info!("reminder poller disabled");
        None
    };

    let menu_store = store.clone();
    let menu = tokio::task::spawn_blocking(move || {
        menu::Menu::new(&menu_store, io::stdin().lock(), io::stdout()).run()
    });

    let ending = tokio::select! {
        res = menu => Ending::Menu(res),
        _ = shutdown_signal() => Ending::Signal,
    };

    if let Ending::Signal = ending {
        println!("\n{}", "Shutting down TaskTrackr...".yellow());
    }

    cancel.cancel();
    if let Some(handle) = poller {
        if let Err(e) = handle.await {
            warn!(error = %e, "reminder poller ended abnormally");
        }
    }

    if let Err(e) = menu::lock(&store).save() {
        println!("{}", format!("Error saving tasks: {e}").red());
    }

    match ending {
        // The menu thread is still blocked on stdin and cannot be joined.
        Ending::Signal => std::process::exit(0),
        Ending::Menu(res) => res.context("menu thread panicked")?,
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "could not listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "could not listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

fn list(data_file: &Path, pending: bool) -> Result<()> {
    let store = open_store(data_file);
    let tasks = store.list(!pending);
    if tasks.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }

    let mut out = io::stdout().lock();
    menu::write_tasks(&mut out, &tasks).context("write task list")?;
    Ok(())
}

fn remind(data_file: &Path) -> Result<()> {
    let store = open_store(data_file).into_shared();
    let poller = ReminderPoller::new(store, Arc::new(notify::ConsoleSink), CancellationToken::new());
    if poller.check_once() == 0 {
        println!("No reminders due.");
    }
    Ok(())
}
