//! Command-line shell over `quotebook_core`.
//!
//! # Responsibility
//! - Translate subcommands into store operations.
//! - Render results and errors as single user-facing lines.

use clap::{Parser, Subcommand};
use quotebook_core::db::{open_db, open_db_in_memory};
use quotebook_core::{
    category_label, default_log_level, init_logging, HttpRemoteSource, QuoteStore,
    QuotebookConfig, ReconcileOutcome, Reconciler, ReconcilerSettings, Selection,
    SqliteKvRepository, ThreadRandom,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};

const DEFAULT_CONFIG_FILE: &str = "quotebook.toml";

#[derive(Debug, Parser)]
#[command(name = "quotebook", version, about = "Random quote store")]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show one random quote for the selected category.
    ///
    /// Each invocation is a fresh session, so the last-shown cache starts
    /// empty and there is nothing earlier to re-display.
    Show {
        /// Switch the persisted filter before picking.
        #[arg(long)]
        category: Option<String>,
    },
    /// Add a quote.
    Add { text: String, category: String },
    /// List categories; the active filter is marked with `*`.
    Categories,
    /// Persist a category filter.
    Select { category: String },
    /// Write the collection as JSON to PATH, or stdout.
    Export { path: Option<PathBuf> },
    /// Append every quote from a JSON document.
    Import { path: PathBuf },
    /// Reconcile once against the remote mirror.
    Sync,
    /// Reconcile on the configured interval until interrupted.
    Watch,
    /// Drop an unreadable stored collection and persist the defaults.
    /// The raw value stays under `quotes.corrupt`.
    Discard,
    /// Print the core version.
    Version,
}

type Store = QuoteStore<SqliteKvRepository>;
type CliResult<T> = Result<T, Box<dyn Error>>;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = QuotebookConfig::load(&cli.config)?;
    if let Some(log_dir) = config.log_dir.as_ref() {
        let level = config.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir)?;
    }

    if let Command::Version = cli.command {
        println!("quotebook_core version={}", quotebook_core::core_version());
        return Ok(());
    }

    if matches!(cli.command, Command::Sync | Command::Watch) && !config.sync.enabled {
        return Err("remote sync is disabled in config".into());
    }

    let mut store = open_store(&config)?;
    match cli.command {
        Command::Show { category } => {
            if let Some(category) = category {
                store.select_category(&category)?;
            }
            match store.pick_quote(&mut ThreadRandom) {
                Selection::Quote(quote) => {
                    println!("\"{}\"", quote.text());
                    println!("- {}", category_label(quote.category()));
                }
                Selection::Empty => println!("No quotes found in this category."),
            }
        }
        Command::Add { text, category } => {
            let count = store.add(&text, &category)?;
            println!("Quote added ({count} total).");
        }
        Command::Categories => {
            let selected = store.selected_filter();
            for category in store.categories().iter() {
                let marker = if category == selected { "*" } else { " " };
                println!("{marker} {}", category_label(category));
            }
        }
        Command::Select { category } => {
            let resolved = store.select_category(&category)?;
            println!("Filter set to {}.", category_label(&resolved));
        }
        Command::Export { path } => {
            let document = store.export_document();
            match path {
                Some(path) => {
                    std::fs::write(&path, document)?;
                    println!("Exported {} quotes to {}.", store.len(), path.display());
                }
                None => println!("{document}"),
            }
        }
        Command::Import { path } => {
            let raw = std::fs::read_to_string(&path)?;
            let imported = store.import_document(&raw)?;
            println!("Imported {imported} quotes.");
        }
        Command::Sync => {
            let reconciler = build_reconciler(store, &config);
            report(reconciler.reconcile().await)?;
        }
        Command::Watch => {
            let reconciler = Arc::new(build_reconciler(store, &config));
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            let (reports_tx, mut reports_rx) = mpsc::unbounded_channel();
            let handle = Arc::clone(&reconciler).spawn_periodic(shutdown_rx, reports_tx);
            println!(
                "Syncing every {}s; press Ctrl-C to stop.",
                reconciler.settings().interval.as_secs()
            );
            loop {
                tokio::select! {
                    Some(outcome) = reports_rx.recv() => {
                        if let Err(err) = report(outcome) {
                            eprintln!("error: {err}");
                        }
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
            let _ = shutdown_tx.send(true);
            handle.await?;
        }
        Command::Discard => {
            if !store.snapshot_is_corrupt() {
                println!("Stored quotes are readable; nothing to discard.");
                return Ok(());
            }
            store.discard_corrupt_snapshot();
            let defaults = store.all().to_vec();
            let count = store.replace_all(defaults)?;
            println!("Discarded unreadable quotes; {count} defaults saved.");
        }
        Command::Version => {}
    }
    Ok(())
}

fn open_store(config: &QuotebookConfig) -> CliResult<Store> {
    let conn = match config.db_path.as_ref() {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let repo = SqliteKvRepository::try_new(conn)?;
    Ok(QuoteStore::open(repo)?)
}

fn build_reconciler(store: Store, config: &QuotebookConfig) -> Reconciler<SqliteKvRepository> {
    Reconciler::new(
        Arc::new(Mutex::new(store)),
        Arc::new(HttpRemoteSource::new()),
        ReconcilerSettings::from(&config.sync),
    )
}

fn report(outcome: quotebook_core::SyncReport) -> CliResult<()> {
    match outcome? {
        ReconcileOutcome::Applied { count } => {
            println!("Quotes synced with server ({count} total).");
        }
        ReconcileOutcome::Skipped => println!("Sync already in progress; skipped."),
    }
    Ok(())
}
