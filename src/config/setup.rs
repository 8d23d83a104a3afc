//! Interactive setup wizard for first-time configuration
//!
//! Runs the first time albumr is started without a config file.

use super::{AlbumrConfig, PathFormat};
use config::ConfigError;
use dialoguer::{Input, theme::ColorfulTheme};
use std::path::PathBuf;

/// Directory proposed for the first library
///
/// # Errors
///
/// Returns `ConfigError` if neither the documents nor the home directory can be
/// determined.
pub fn default_album_dir() -> Result<PathBuf, ConfigError> {
    dirs::document_dir()
        .or_else(dirs::home_dir)
        .map(|dir| dir.join("Album Epubs"))
        .ok_or_else(|| ConfigError::Message("Could not determine documents directory".to_string()))
}

/// Interactive first-time setup - prompts for a library name and directory
///
/// Guides the user through creating their first library:
/// 1. Prompts for a library name (default: "albums")
/// 2. Prompts for the album directory (default: `<documents>/Album Epubs`)
/// 3. Creates and saves the configuration
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - The documents directory cannot be determined
/// - User input cannot be read
/// - The configuration cannot be saved
pub fn first_time_setup() -> Result<AlbumrConfig, ConfigError> {
    println!("Welcome to albumr! Let's set up your first album library.\n");

    let name: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Library name")
        .default("albums".to_string())
        .interact_text()
        .map_err(|e| ConfigError::Message(format!("Failed to read input: {e}")))?;

    let album_dir: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Album directory")
        .default(default_album_dir()?.to_string_lossy().to_string())
        .interact_text()
        .map_err(|e| ConfigError::Message(format!("Failed to read input: {e}")))?;

    let mut config = AlbumrConfig::default();
    config.libraries.insert(name.clone(), PathBuf::from(album_dir));
    config.default_library = Some(name);
    config.path_format = PathFormat::Absolute;

    config.save()?;

    println!("\nConfiguration saved successfully!");
    Ok(config)
}
