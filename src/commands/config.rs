//! Config command - read and change settings

use crate::{AlbumrError, cli::ConfigCommands, config::AlbumrConfig};

type Result<T> = std::result::Result<T, AlbumrError>;

/// Execute a config subcommand
///
/// # Errors
/// Returns `AlbumrError` if the key is unknown, the value does not parse, or
/// the configuration cannot be saved.
pub fn execute(mut config: AlbumrConfig, command: &ConfigCommands, quiet: bool) -> Result<()> {
    match command {
        ConfigCommands::Set { setting } => {
            let (key, value) = setting.split_once('=').ok_or_else(|| {
                AlbumrError::InvalidInput("Invalid format. Use: albumr config set key=value".into())
            })?;
            let key = key.trim();
            config.set_value(key, value)?;
            config.save()?;
            if !quiet {
                println!("Set {key} = {}", config.get_value(key)?);
            }
        }
        ConfigCommands::Get { key } => {
            println!("{}", config.get_value(key.trim())?);
        }
        ConfigCommands::Path => {
            println!("{}", AlbumrConfig::config_path()?.display());
        }
    }
    Ok(())
}
