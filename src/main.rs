//! Albumr CLI application entry point
//!
//! Keeps an index of a directory of photo album archives and searches their
//! content.
//!
//! # Usage
//!
//! ```bash
//! # Index the default library
//! albumr scan
//!
//! # List indexed albums (default command)
//! albumr
//!
//! # Find paragraphs mentioning "beach" in May 2024
//! albumr search --from 2024-05-01 --to 2024-05-31 --text beach
//!
//! # Extract a chapter and print its page
//! albumr open trip.album.epub --chapter 2
//!
//! # More log output
//! albumr -vv scan
//! ```
//!
//! # Configuration
//!
//! On first run, albumr prompts for an initial library. Configuration is
//! stored in the user's config directory (`~/.config/albumr/config.toml` on
//! Linux).

use albumr::{
    AlbumrError,
    cli::{Cli, Commands},
    commands,
    config::AlbumrConfig,
    library::Library,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

type Result<T> = std::result::Result<T, AlbumrError>;

/// Install the log subscriber
///
/// `RUST_LOG` wins over the verbosity flags. Logs go to stderr so stdout
/// stays scriptable.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "albumr=warn",
        1 => "albumr=info",
        _ => "albumr=debug",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Main entry point for the albumr application
///
/// Parses command-line arguments, loads configuration and dispatches to the
/// appropriate command.
///
/// # Errors
///
/// Returns `AlbumrError` if configuration loading fails, the library cannot be
/// resolved, or the command fails.
fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.verbose);

    let config = AlbumrConfig::load_or_setup()?;
    let quiet = cli.quiet || config.quiet;
    let path_format = cli.get_path_format().unwrap_or(config.path_format);
    let library_name = cli.lib.clone();
    let select_library = || -> Result<Library> {
        let library = config.library(library_name.as_deref())?;
        tracing::debug!(library = %library.name, work_dir = %library.work_dir.display(), "library selected");
        Ok(library)
    };

    match cli.get_command() {
        Commands::Lib { command } => commands::lib(config.clone(), &command, quiet),
        Commands::Config { command } => commands::config(config.clone(), &command, quiet),
        Commands::Scan => commands::scan(select_library()?, quiet),
        Commands::List => commands::list(&select_library()?, quiet),
        command @ Commands::Search { .. } => {
            let query = command
                .get_search_query()?
                .ok_or_else(|| AlbumrError::InvalidInput("Failed to parse search parameters".into()))?;
            commands::search(&select_library()?, query, command.json_output(), quiet)
        }
        Commands::Show { album } => commands::show(&select_library()?, &album, quiet),
        Commands::Open { album, chapter } => commands::open(&select_library()?, &album, chapter, path_format, quiet),
        Commands::Export {
            album,
            chapter,
            photo,
            output,
        } => commands::export(&select_library()?, &album, chapter, &photo, &output, path_format, quiet),
        Commands::ClearCache { all } => commands::clear_cache(&select_library()?, all, quiet),
    }
}
