//! `shortkeys` - manage per-site keyboard shortcuts from the command line.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use shortkeys::config::{self, EngineConfig};
use shortkeys::error::ShortkeysError;
use shortkeys::logging;
use shortkeys::shortcuts::{
    builtin_packs, export_shortcuts, find_pack, parse_import, ConflictMode, FocusContext,
    LoadOutcome, MergeReport, SaveOutcome, ShortcutPersistence, ShortcutStore,
};
use shortkeys::storage::FileStorage;

/// shortkeys - per-site keyboard shortcuts with sync/local storage
#[derive(Parser)]
#[command(name = "shortkeys")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: ~/.shortkeys/config.json)
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Storage directory, overriding the config file
    #[arg(long, value_name = "DIR", global = true)]
    storage_dir: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List stored shortcuts
    List,
    /// Show which shortcuts are active on a page
    Resolve {
        url: String,
        /// Treat focus as inside an input, textarea or contenteditable
        #[arg(long)]
        focus_editable: bool,
    },
    /// Merge shortcuts from an exported JSON file
    Import {
        file: PathBuf,
        /// replace or skip shortcuts whose key is already bound
        #[arg(long, value_name = "MODE")]
        mode: Option<ConflictMode>,
    },
    /// Print stored shortcuts as pretty JSON
    Export,
    /// List built-in shortcut packs
    Packs,
    /// Install a built-in pack by name
    InstallPack {
        name: String,
        #[arg(long, value_name = "MODE")]
        mode: Option<ConflictMode>,
    },
    /// Run the one-time local-to-sync migration
    Migrate,
    /// Print changes made to stored shortcuts by other processes
    Watch,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match config::load_config_from(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}", ShortkeysError::from(e).user_message());
                return ExitCode::FAILURE;
            }
        },
        None => config::load_config(),
    };
    if let Some(dir) = cli.storage_dir.clone() {
        config.storage_dir = dir;
    }

    let _guard = logging::init(&config.log_filter);

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = ?e, "Command failed");
            match e.downcast_ref::<ShortkeysError>() {
                Some(err) => eprintln!("{}", err.user_message()),
                None => eprintln!("Error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

/// Opens storage without loading or migrating anything.
fn open_persistence(config: &EngineConfig) -> Result<(Arc<FileStorage>, ShortcutPersistence)> {
    let dir = config.storage_path();
    let storage = FileStorage::open(&dir)
        .map_err(ShortkeysError::from)
        .with_context(|| format!("opening storage at {}", dir.display()))?
        .with_sync_quota(config.sync_quota_bytes);
    let storage = Arc::new(storage);
    let persistence = ShortcutPersistence::new(storage.clone(), config.sync_quota_bytes);
    Ok((storage, persistence))
}

fn open_store(config: &EngineConfig) -> Result<(Arc<FileStorage>, ShortcutStore)> {
    let (storage, persistence) = open_persistence(config)?;
    let mut store = ShortcutStore::new(persistence);
    match store.initialize() {
        LoadOutcome::Corrupt { area } => {
            eprintln!("Stored shortcuts in {} storage are corrupt and were ignored", area)
        }
        outcome => info!(outcome = ?outcome, "Shortcut store ready"),
    }
    Ok((storage, store))
}

fn run(command: Commands, config: &EngineConfig) -> Result<()> {
    // Initializing the store already migrates, so this one runs on bare persistence.
    if let Commands::Migrate = command {
        let (_storage, persistence) = open_persistence(config)?;
        let outcome = persistence
            .migrate_local_to_sync()
            .map_err(ShortkeysError::from)?;
        println!("Migration: {:?}", outcome);
        return Ok(());
    }

    let (storage, mut store) = open_store(config)?;

    match command {
        Commands::List => {
            if store.shortcuts().is_empty() {
                println!("No shortcuts stored.");
            }
            for shortcut in store.shortcuts() {
                println!(
                    "{:<20} {:<22} {}{}",
                    shortcut.combo().display(),
                    shortcut.action,
                    shortcut.label.as_deref().unwrap_or(""),
                    if shortcut.enabled { "" } else { " (disabled)" }
                );
            }
        }
        Commands::Resolve {
            url,
            focus_editable,
        } => {
            let focus = if focus_editable {
                FocusContext::Editable
            } else {
                FocusContext::Page
            };
            let resolved = store.resolve(&url);
            for binding in resolved.bindings(config.binding_policy) {
                let firing = resolved.handlers_for(binding.combo, focus, config.binding_policy);
                for handler in binding.handlers {
                    let suppressed = !firing.iter().any(|s| std::ptr::eq(*s, handler));
                    println!(
                        "{:<20} {}{}",
                        binding.combo,
                        handler.action,
                        if suppressed { " (suppressed in inputs)" } else { "" }
                    );
                }
            }
            if resolved.is_empty() {
                println!("No shortcuts active on {}", url);
            }
        }
        Commands::Import { file, mode } => {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let incoming = parse_import(&text).map_err(ShortkeysError::Import)?;
            let report = store.import(incoming, mode.unwrap_or(config.import_conflict_mode));
            print_report(&report);
            if report.changed() {
                print_save(store.persist().map_err(ShortkeysError::from)?);
            }
        }
        Commands::Export => {
            let json = export_shortcuts(store.shortcuts())?;
            println!("{}", json);
        }
        Commands::Packs => {
            for pack in builtin_packs() {
                println!("{:<18} {:>2} shortcuts  {}", pack.name, pack.shortcuts.len(), pack.description);
            }
        }
        Commands::InstallPack { name, mode } => {
            let pack = find_pack(&name).ok_or_else(|| ShortkeysError::UnknownPack(name.clone()))?;
            let report = store.install_pack(&pack, mode.unwrap_or(config.pack_conflict_mode));
            print_report(&report);
            if report.changed() {
                print_save(store.persist().map_err(ShortkeysError::from)?);
            }
        }
        Commands::Migrate => unreachable!("handled before the store is opened"),
        Commands::Watch => {
            let _watcher = storage
                .watch()
                .with_context(|| format!("watching {}", storage.dir().display()))?;
            let changes = store.subscribe();
            println!("Watching {} (Ctrl+C to stop)", storage.dir().display());
            while let Some(change) = changes.recv_blocking() {
                let outcome = store.reload();
                println!("{} changed: {:?}", change.area, outcome);
            }
        }
    }
    Ok(())
}

fn print_report(report: &MergeReport) {
    println!(
        "{} added, {} replaced, {} skipped, {} rejected",
        report.added.len(),
        report.replaced.len(),
        report.skipped.len(),
        report.rejected
    );
}

fn print_save(outcome: SaveOutcome) {
    match outcome.fallback {
        None => println!("Saved to {} storage", outcome.area),
        Some(reason) => println!("Saved to {} storage ({:?})", outcome.area, reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shortkeys::shortcuts::{MigrationOutcome, SHORTCUTS_KEY};
    use shortkeys::storage::{KeyValueStore, StorageArea};
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> EngineConfig {
        EngineConfig {
            storage_dir: dir.path().to_string_lossy().into_owned(),
            ..Default::default()
        }
    }

    fn seed_local_list(config: &EngineConfig) {
        let storage = FileStorage::open(config.storage_path()).unwrap();
        storage
            .set(StorageArea::Local, SHORTCUTS_KEY, r#"[{"key":"j","action":"newtab"}]"#)
            .unwrap();
    }

    #[test]
    fn migrate_command_copies_a_local_only_list() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        seed_local_list(&config);

        let (storage, persistence) = open_persistence(&config).unwrap();
        assert_eq!(
            persistence.migrate_local_to_sync().unwrap(),
            MigrationOutcome::Copied
        );
        assert!(storage.get(StorageArea::Sync, SHORTCUTS_KEY).unwrap().is_some());
    }

    #[test]
    fn opening_the_store_has_already_migrated() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        seed_local_list(&config);

        let (_storage, store) = open_store(&config).unwrap();
        assert_eq!(store.shortcuts().len(), 1);
        assert_eq!(
            store.persistence().migrate_local_to_sync().unwrap(),
            MigrationOutcome::AlreadyDone
        );
    }
}
