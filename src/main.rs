use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};
use upmig::commands::{self, ListFormat, UpOutcome};
use upmig::config::{self, ConfigBuilder, ConfigInput, MigrationsInput};
use upmig::constants::CONFIG_FILENAME;
use upmig::migrate::RunOptions;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(long, default_value = CONFIG_FILENAME, global = true)]
    config_file: String,

    /// Environment file to load before reading configuration
    #[arg(long, short = 'e', global = true)]
    env: Option<String>,

    /// Enable verbose output (info level)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Suppress all non-essential output (error level only)
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Enable debug output (debug level)
    #[arg(long, global = true)]
    debug: bool,

    #[command(flatten)]
    database_args: config::DatabaseArgs,

    #[command(flatten)]
    migrations_args: config::MigrationsArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply all pending migrations
    Up {
        /// Stop after the migration with this timestamp (or identifier)
        #[arg(long, short = 't', value_parser = parse_target_timestamp)]
        to: Option<u64>,

        /// Apply at most this many migrations
        #[arg(long, short = 's')]
        steps: Option<u64>,

        /// Commit each migration on its own instead of one transaction per run
        #[arg(long)]
        no_transaction: bool,
    },

    /// Create a new migration unit
    New {
        /// Migration name; words are joined with '-'
        name: Vec<String>,

        /// Do not create the SQL payload file
        #[arg(long, short = 'n')]
        nosql: bool,
    },

    /// List pending migrations
    List {
        /// Include the number of applied migrations
        #[arg(long, short = 'H')]
        history: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "human")]
        format: ListFormat,
    },
}

/// Parse a target given as a timestamp or a migration identifier such as
/// `1700000000000_add-users`.
fn parse_target_timestamp(value: &str) -> Result<u64, String> {
    let digits: String = value.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(format!("'{}' does not start with a timestamp", value));
    }
    digits
        .parse()
        .map_err(|e| format!("invalid timestamp '{}': {}", digits, e))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    load_env_file(cli.env.as_deref());
    initialize_logging(&cli);

    match run_main(cli).await? {
        UpOutcome::Completed => Ok(()),
        UpOutcome::Failed => std::process::exit(1),
    }
}

fn load_env_file(path: Option<&str>) {
    if let Some(path) = path {
        if dotenv::from_path(path).is_ok() {
            return;
        }
        eprintln!("Warning: could not load environment file {}, using .env", path);
    }
    dotenv::dotenv().ok();
}

fn initialize_logging(cli: &Cli) {
    let level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else if cli.quiet {
        "error"
    } else {
        "warn" // default level
    };

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(level)
    };

    fmt().with_env_filter(filter).with_target(false).init();
}

async fn run_main(cli: Cli) -> Result<UpOutcome> {
    let file_config = config::load_config(&cli.config_file)?;

    let transactional = match &cli.command {
        Commands::Up { no_transaction, .. } if *no_transaction => Some(false),
        _ => None,
    };

    let cli_config = ConfigInput {
        database: Some(cli.database_args.clone().into()),
        migrations: Some(MigrationsInput {
            transactional,
            ..cli.migrations_args.clone().into()
        }),
    };

    let config = ConfigBuilder::new()
        .with_file(file_config)
        .with_cli_args(cli_config)
        .resolve()?;
    debug!("Resolved configuration: {:?}", config.migrations);

    match cli.command {
        Commands::Up { to, steps, .. } => {
            info!("Running pending migrations");
            commands::cmd_up(&config, RunOptions { steps, to }, cli.quiet).await
        }
        Commands::New { name, nosql } => {
            commands::cmd_new(&config, &name, nosql).await?;
            Ok(UpOutcome::Completed)
        }
        Commands::List { history, format } => {
            commands::cmd_list(&config, history, format, cli.quiet).await?;
            Ok(UpOutcome::Completed)
        }
    }
}
