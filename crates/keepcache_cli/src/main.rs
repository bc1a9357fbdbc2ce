//! keepcache CLI - keeps a local cache of a remote bookmark manager.

mod commands;
mod config;
mod progress;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "keepcache")]
#[command(version)]
#[command(about = "A local cache of a remote bookmark manager")]
#[command(
    long_about = "keepcache mirrors the lists and link bookmarks of a remote bookmark \
manager into a local SQLite database. The daemon runs a full sync at startup and \
incremental syncs on a fixed interval; the query commands read the cache without \
contacting the remote."
)]
#[command(after_long_help = r#"EXAMPLES
    Run the sync daemon:
        $ keepcache daemon

    Sync once, rewriting every bookmark:
        $ keepcache sync --full

    Search the cache:
        $ keepcache search rust async

    Generate shell completions:
        $ keepcache completions bash > ~/.local/share/bash-completion/completions/keepcache

CONFIGURATION
    keepcache reads configuration from:
      1. ~/.config/keepcache/config.toml (or $XDG_CONFIG_HOME/keepcache/config.toml)
      2. ./keepcache.toml
      3. The file given with --config
      4. Environment variables (KEEPCACHE_* prefix, "__" between section and key)
      5. .env file in current directory

ENVIRONMENT VARIABLES
    KEEPCACHE_DATABASE__URL            Database connection string (default: ~/.local/state/keepcache/keepcache.db)
    KEEPCACHE_REMOTE__URL              Base URL of the remote
    KEEPCACHE_REMOTE__TOKEN            API key
    KEEPCACHE_REMOTE__ACCEPT_INVALID_CERTS
                                       Skip TLS certificate validation (default: false)
    KEEPCACHE_SYNC__ENABLED            Run the scheduler in daemon mode (default: true)
    KEEPCACHE_SYNC__INTERVAL_MINUTES   Minutes between incremental syncs (default: 5)
    KEEPCACHE_SYNC__RETRY_DELAY_SECONDS
                                       Delay before the first retry (default: 30)
    KEEPCACHE_SYNC__MAX_RETRIES        Retries per request (default: 3)
"#)]
struct Cli {
    /// Additional config file (TOML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full sync, then incremental syncs on the configured interval
    ///
    /// A first Ctrl+C stops after the cycle in flight; a second one quits
    /// immediately.
    Daemon,
    /// Run one sync cycle now
    Sync {
        /// Rewrite every bookmark instead of only those changed since the last sync
        #[arg(short, long)]
        full: bool,
    },
    #[command(flatten)]
    Query(QueryCommand),
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
    /// Generate man page(s)
    Man {
        /// Output directory for man pages (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Commands that print cached data as JSON.
#[derive(Subcommand)]
enum QueryCommand {
    /// Show the sync status
    Status,
    /// Show list and bookmark counts with the sync status
    Stats,
    /// Show all cached lists
    Lists,
    /// Show cached bookmarks
    Bookmarks {
        /// Only bookmarks of this list
        #[arg(short, long)]
        list: Option<String>,
    },
    /// Search bookmark titles, URLs and descriptions
    Search {
        /// Search terms, matched as one phrase
        #[arg(required = true)]
        query: Vec<String>,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Rollback the last migration
    Down,
    /// Show migration status
    Status,
    /// Fresh install - drop all tables and reapply migrations
    Fresh,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Structured logging unless progress bars own the terminal. The daemon
    // always logs.
    if !Term::stdout().is_term() || matches!(cli.command, Commands::Daemon) {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("keepcache=info,keepcache_cli=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    // Handle commands that don't require configuration first
    match &cli.command {
        Commands::Completions { shell } => {
            commands::meta::handle_completions(*shell)?;
            return Ok(());
        }
        Commands::Man { output } => {
            commands::meta::handle_man(output.clone())?;
            return Ok(());
        }
        _ => {}
    }

    // Load configuration (config files -> env vars -> defaults)
    let config = config::Config::load(cli.config.as_deref())?;
    let database_url = config.database_url()?;

    // Ensure the database directory exists for SQLite
    if database_url.starts_with("sqlite://") {
        let db_path = database_url.trim_start_matches("sqlite://");
        // Strip query parameters (e.g., ?mode=rwc) before path operations
        let db_path = db_path.split('?').next().unwrap_or(db_path);
        let db_path = std::path::Path::new(db_path);

        if db_path.is_relative() && !db_path.as_os_str().is_empty() {
            tracing::warn!(
                "Database path '{}' is relative - behavior depends on current directory. \
                 Consider using an absolute path.",
                db_path.display()
            );
        }

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
    }

    match cli.command {
        Commands::Daemon => {
            commands::sync::handle_daemon(&config, &database_url).await?;
        }
        Commands::Sync { full } => {
            commands::sync::handle_sync(full, &config, &database_url).await?;
        }
        Commands::Query(query) => {
            commands::query::handle_query(query, &database_url).await?;
        }
        Commands::Migrate { action } => {
            commands::migrate::handle_migrate(action, &database_url).await?;
        }
        Commands::Completions { .. } | Commands::Man { .. } => {}
    }

    Ok(())
}
