//! Command-line interface definitions and parsing
//!
//! This module defines the complete CLI structure for albumr using the `clap`
//! crate, plus helpers that turn parsed arguments into library types.
//!
//! # Commands
//!
//! - **scan**: Reconcile the index with the album directory
//! - **list**: List indexed albums (default)
//! - **search**: Find paragraphs by date, title, author, location and text
//! - **show** / **open** / **export**: Inspect a single album
//! - **clear-cache**: Delete derived data
//! - **lib** / **config**: Manage libraries and settings
//!
//! # Examples
//!
//! ```
//! use albumr::cli::{Cli, Commands};
//! use clap::Parser;
//!
//! let cli = Cli::parse_from(["albumr", "search", "--text", "beach"]);
//! let query = cli.get_command().get_search_query().unwrap();
//! assert_eq!(query.unwrap().text, "beach");
//! ```

use crate::config::PathFormat;
use crate::search::{SearchError, SearchQuery, parse_date_bound};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Configuration management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Set a configuration value
    Set {
        /// Configuration key=value (e.g., thumbnail.width=240)
        #[arg(value_name = "KEY=VALUE")]
        setting: String,
    },

    /// Get a configuration value
    Get {
        /// Configuration key to retrieve (e.g., quiet)
        #[arg(value_name = "KEY")]
        key: String,
    },

    /// Print the location of the config file
    Path,
}

/// Library management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum LibCommands {
    /// Add a library
    Add {
        /// Name of the library
        name: String,

        /// Directory holding the `*.album.epub` files
        path: PathBuf,
    },

    /// List all libraries
    #[command(visible_alias = "ls")]
    List,

    /// Remove a library from configuration
    #[command(visible_alias = "rm")]
    Remove {
        /// Name of the library to remove
        name: String,

        /// Also delete the library's index, thumbnails and caches
        #[arg(short = 'd', long = "delete-data")]
        delete_data: bool,
    },

    /// Set the default library
    #[command(name = "set-default")]
    SetDefault {
        /// Name of the library to set as default
        name: String,
    },
}

/// Main CLI structure for parsing command-line arguments
#[derive(Parser, Debug)]
#[command(name = "albumr")]
#[command(about = "Index and search photo album archives", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Suppress informational output (only print results)
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Library name to use (overrides default)
    #[arg(long = "lib", value_name = "NAME", global = true)]
    pub lib: Option<String>,

    /// Display absolute paths (overrides config)
    #[arg(long = "absolute", global = true, conflicts_with = "relative")]
    pub absolute: bool,

    /// Display relative paths (overrides config)
    #[arg(long = "relative", global = true, conflicts_with = "absolute")]
    pub relative: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Bring the index in line with the album directory
    #[command(visible_alias = "s")]
    Scan,

    /// List indexed albums
    #[command(visible_alias = "ls")]
    List,

    /// Search paragraphs across all albums
    #[command(visible_alias = "f")]
    Search {
        /// Earliest date to include (yyyy-MM-dd)
        #[arg(long = "from", value_name = "DATE")]
        from: Option<String>,

        /// Latest date to include (yyyy-MM-dd)
        #[arg(long = "to", value_name = "DATE")]
        to: Option<String>,

        /// Substring of the album title
        #[arg(long = "title", value_name = "TEXT")]
        title: Option<String>,

        /// Substring of the album author
        #[arg(long = "author", value_name = "TEXT")]
        author: Option<String>,

        /// Substring of a visible paragraph location
        #[arg(long = "location", value_name = "TEXT")]
        location: Option<String>,

        /// Substring of paragraph text, paragraph title or chapter title
        #[arg(long = "text", value_name = "TEXT")]
        text: Option<String>,

        /// Print one JSON object per match
        #[arg(long = "json")]
        json: bool,
    },

    /// Print an album's table of contents
    Show {
        /// Indexed file name, identifier, or path to an archive
        album: String,
    },

    /// Extract a chapter for reading and print its page path
    Open {
        /// Indexed file name, identifier, or path to an archive
        album: String,

        /// Position in the table of contents (0 is the preface)
        #[arg(short = 'c', long = "chapter", default_value_t = 0)]
        chapter: usize,
    },

    /// Extract a full-size photo
    Export {
        /// Indexed file name, identifier, or path to an archive
        album: String,

        /// Position of the chapter in the table of contents
        #[arg(short = 'c', long = "chapter")]
        chapter: usize,

        /// Photo file name, with or without extension
        #[arg(short = 'p', long = "photo", value_name = "NAME")]
        photo: String,

        /// Destination file
        #[arg(short = 'o', long = "output", value_name = "PATH")]
        output: PathBuf,
    },

    /// Delete extraction caches
    #[command(name = "clear-cache")]
    ClearCache {
        /// Also delete the index and every cover thumbnail
        #[arg(long = "all")]
        all: bool,
    },

    /// Manage libraries
    Lib {
        #[command(subcommand)]
        command: LibCommands,
    },

    /// Manage configuration settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

impl Commands {
    /// Build the search query from search command arguments
    ///
    /// Returns `Ok(None)` for any other command.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::InvalidDate` if `--from` or `--to` is not a
    /// `yyyy-MM-dd` date.
    pub fn get_search_query(&self) -> Result<Option<SearchQuery>, SearchError> {
        let Self::Search {
            from,
            to,
            title,
            author,
            location,
            text,
            ..
        } = self
        else {
            return Ok(None);
        };

        let defaults = SearchQuery::default();
        let begin = from.as_deref().map(parse_date_bound).transpose()?;
        let end = to.as_deref().map(parse_date_bound).transpose()?;
        let query = SearchQuery::new()
            .between(begin.unwrap_or(defaults.begin), end.unwrap_or(defaults.end))
            .title(title.clone().unwrap_or_default())
            .author(author.clone().unwrap_or_default())
            .location(location.clone().unwrap_or_default())
            .text(text.clone().unwrap_or_default());
        Ok(Some(query))
    }

    /// Whether search output should be JSON lines
    #[must_use]
    pub const fn json_output(&self) -> bool {
        matches!(self, Self::Search { json: true, .. })
    }
}

impl Cli {
    /// Parse command line arguments
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the command, defaulting to List if none specified
    #[must_use]
    pub fn get_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::List)
    }

    /// Helper method to get the path format override from global flags
    #[must_use]
    pub const fn get_path_format(&self) -> Option<PathFormat> {
        if self.absolute {
            Some(PathFormat::Absolute)
        } else if self.relative {
            Some(PathFormat::Relative)
        } else {
            None
        }
    }
}
