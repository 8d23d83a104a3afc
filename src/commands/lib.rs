//! Lib command - manage the configured album libraries

use crate::{AlbumrError, cli::LibCommands, config::AlbumrConfig};
use std::fs;

type Result<T> = std::result::Result<T, AlbumrError>;

/// Execute a lib subcommand
///
/// # Errors
/// Returns `AlbumrError` if the library name is unknown or duplicated, or the
/// configuration cannot be saved.
pub fn execute(mut config: AlbumrConfig, command: &LibCommands, quiet: bool) -> Result<()> {
    match command {
        LibCommands::Add { name, path } => {
            if config.libraries.contains_key(name) {
                return Err(AlbumrError::InvalidInput(format!("Library '{name}' already exists")));
            }
            let path = if path.is_absolute() {
                path.clone()
            } else {
                std::env::current_dir()?.join(path)
            };
            let was_empty = config.libraries.is_empty();
            config.add_library(name.clone(), path.clone())?;

            if !quiet {
                println!("Library '{name}' added at {}", path.display());
                if was_empty {
                    println!("Set '{name}' as default library");
                }
                if !path.is_dir() {
                    println!("Note: {} does not exist yet", path.display());
                }
            }
        }
        LibCommands::List => {
            if config.libraries.is_empty() {
                if !quiet {
                    println!("No libraries configured.");
                    println!("Add one with: albumr lib add <name> <path>");
                }
                return Ok(());
            }

            if !quiet {
                println!("Configured libraries:");
            }
            for name in config.list_libraries() {
                if quiet {
                    println!("{name}");
                } else if let Some(path) = config.libraries.get(name) {
                    let marker = if config.default_library.as_ref() == Some(name) { " (default)" } else { "" };
                    println!("  {name} -> {}{marker}", path.display());
                }
            }
        }
        LibCommands::Remove { name, delete_data } => {
            if !config.libraries.contains_key(name) {
                return Err(AlbumrError::InvalidInput(format!("Library '{name}' does not exist")));
            }
            let data_dir = config.data_root()?.join(name);
            let was_default = config.default_library.as_ref() == Some(name);
            config.remove_library(name)?;

            if !quiet {
                println!("Library '{name}' removed from configuration");
                if was_default {
                    println!("Warning: it was the default library. Set a new one with 'albumr lib set-default'.");
                }
            }

            if *delete_data && data_dir.exists() {
                match fs::remove_dir_all(&data_dir) {
                    Ok(()) => {
                        if !quiet {
                            println!("Deleted {}", data_dir.display());
                        }
                    }
                    Err(e) => eprintln!("Warning: Failed to delete {}: {e}", data_dir.display()),
                }
            } else if !quiet {
                println!("Note: album files in the library directory were NOT touched");
            }
        }
        LibCommands::SetDefault { name } => {
            config.set_default_library(name.clone())?;
            if !quiet {
                println!("Set '{name}' as default library");
            }
        }
    }
    Ok(())
}
