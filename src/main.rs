//! CLI entry point for phrasebook
//!
//! Provides command-line interface for listing the phrase tree, checking
//! for trigger conflicts, importing legacy abbreviation files and showing
//! the effective settings.

use clap::{Parser, Subcommand};
use colored::*;
use phrasebook::app::NullRegistrar;
use phrasebook::config::{FileStore, DEFAULT_STORE_PATH};
use phrasebook::core::{ConfigTree, ConfigurationManager, FolderId, ItemId, TriggerOwner};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "phrasebook")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration snapshot
    #[arg(short, long, global = true, default_value = DEFAULT_STORE_PATH)]
    store: String,

    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all folders and phrases
    List,

    /// Check for abbreviation and hotkey conflicts
    Check,

    /// Import a legacy abbreviations file
    Import {
        /// Path to the legacy abbreviations file
        legacy_file: PathBuf,
    },

    /// Show the effective settings
    Settings,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let store = FileStore::new(&cli.store);
    println!("{} Using configuration: {}", "→".cyan(), store.path().display());
    let mut manager = ConfigurationManager::load_or_create(Box::new(store), Box::new(NullRegistrar))?;

    match cli.command {
        Commands::List => list_phrases(&manager),
        Commands::Check => check_conflicts(&manager),
        Commands::Import { legacy_file } => import_legacy(&mut manager, &legacy_file)?,
        Commands::Settings => show_settings(&manager),
    }

    Ok(())
}

/// Print every folder and phrase, indented by depth
fn list_phrases(manager: &ConfigurationManager) {
    let tree = manager.tree();

    for (id, _) in tree.root_folders() {
        print_folder(tree, id, 0);
    }

    println!("\n{}", "Global hotkeys:".bold());
    for global in manager.global_hotkeys().iter() {
        println!("  {}", global);
    }

    println!(
        "\n{} Total: {} folders, {} phrases",
        "✓".green(),
        manager.indexes().all_folders.len(),
        manager.indexes().all_phrases.len()
    );
}

fn print_folder(tree: &ConfigTree, id: FolderId, depth: usize) {
    let Some(folder) = tree.folder(id) else {
        return;
    };
    let indent = "  ".repeat(depth);

    let mut line = format!("{}{}", indent, folder.title.bold());
    if let Some(hotkey) = &folder.hotkey {
        line.push_str(&format!(" ({})", hotkey.to_string().cyan()));
    }
    println!("{}", line);

    for child in folder.folders() {
        print_folder(tree, *child, depth + 1);
    }

    for phrase in folder.phrases().iter().filter_map(|p| tree.phrase(*p)) {
        let mut line = format!("{}  - {}", indent, phrase.title);
        if let Some(abbreviation) = &phrase.abbreviation {
            line.push_str(&format!(" [{}]", abbreviation.green()));
        }
        if let Some(hotkey) = &phrase.hotkey {
            line.push_str(&format!(" ({})", hotkey.to_string().cyan()));
        }
        println!("{}", line);
    }
}

/// Check the configuration for triggers claimed more than once
fn check_conflicts(manager: &ConfigurationManager) {
    let conflicts = manager.conflicts();

    if conflicts.is_empty() {
        println!("{} {}", "✓".green().bold(), "No conflicts detected!".bold());
        return;
    }

    println!(
        "{} Found {} conflict{}:\n",
        "✗".red().bold(),
        conflicts.len(),
        if conflicts.len() == 1 { "" } else { "s" }
    );

    let tree = manager.tree();
    for (i, conflict) in conflicts.iter().enumerate() {
        println!(
            "{} {}",
            format!("Conflict {}", i + 1).yellow().bold(),
            conflict.trigger.to_string().cyan()
        );

        for (idx, owner) in conflict.owners.iter().enumerate() {
            let description = match owner {
                TriggerOwner::Item(ItemId::Folder(id)) => tree
                    .folder(*id)
                    .map(|f| format!("folder {}", f.title))
                    .unwrap_or_else(|| id.to_string()),
                TriggerOwner::Item(ItemId::Phrase(id)) => tree
                    .phrase(*id)
                    .map(|p| format!("phrase {}", p.title))
                    .unwrap_or_else(|| id.to_string()),
                TriggerOwner::Global(action) => format!("global hotkey: {}", action),
            };
            println!("  {} {}", format!("{}.", idx + 1).dimmed(), description);
        }
        println!();
    }

    println!("{}", "⚠ These triggers will collide at runtime!".yellow());
    std::process::exit(1);
}

/// Import a legacy file into a new root folder
fn import_legacy(manager: &mut ConfigurationManager, path: &Path) -> anyhow::Result<()> {
    println!("{} Importing legacy file: {}", "→".cyan(), path.display());

    let (folder, phrases) = manager.import_legacy(path)?;
    let title = folder.title.clone();
    let count = phrases.len();
    manager.attach_import(folder, phrases)?;

    println!("{} Imported {} phrases into '{}'", "✓".green(), count, title);
    Ok(())
}

fn show_settings(manager: &ConfigurationManager) {
    for (key, value) in manager.settings().entries() {
        println!("{} = {}", key.cyan(), value);
    }
}
