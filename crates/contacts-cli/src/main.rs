mod banner;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use contacts_config::{AppConfig, ConfigLoader};
use contacts_db::{Database, MigrationSource, migrations};
use contacts_gateway::GatewayServer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "contacts", version, about = "Contacts CRUD service")]
struct Cli {
    /// Path to config.yml / config.toml (default: ~/.contacts/config.yml)
    #[arg(short, long, env = "CONTACTS_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Override the SQLite database path
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Override the migrations directory
    #[arg(long, global = true)]
    migrations_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending migrations, then serve the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Apply pending migrations and exit
    Migrate {
        /// Show applied and pending migrations without applying anything
        #[arg(long)]
        status: bool,
    },
}

fn main() -> ExitCode {
    let dotenv_loaded = dotenvy::dotenv().is_ok();
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            init_tracing(None, cli.verbose, cli.json_logs);
            error!("{e:#}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(config.log_level.as_deref(), cli.verbose, cli.json_logs);

    if !dotenv_loaded {
        info!(".env file not found, using process environment");
    }

    match run(cli.command, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let path = cli.config.clone().unwrap_or_else(ConfigLoader::default_path);
    let mut config = ConfigLoader::new(path)
        .load()
        .context("failed to load configuration")?;

    if let Some(db_path) = &cli.db_path {
        config.database.path = db_path.clone();
    }
    if let Some(dir) = &cli.migrations_dir {
        config.migrations.dir = Some(dir.clone());
    }
    Ok(config)
}

/// `RUST_LOG` wins; otherwise `-v`, then the configured level, then `info`.
fn init_tracing(configured: Option<&str>, verbose: bool, json: bool) {
    let default_level = if verbose {
        "debug"
    } else {
        configured.unwrap_or("info")
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn run(command: Commands, mut config: AppConfig) -> Result<()> {
    match command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config)
        }
        Commands::Migrate { status: true } => print_status(&config),
        Commands::Migrate { status: false } => {
            migrate(&config)?;
            info!("migrations finished successfully");
            Ok(())
        }
    }
}

/// Open the database and bring its schema up to date. Any failure here is
/// fatal: nothing may serve against a partially migrated schema.
fn migrate(config: &AppConfig) -> Result<Arc<Database>> {
    let source = MigrationSource::resolve(config.migrations.dir.as_deref())
        .context("failed to locate migrations")?;
    let db = Database::open(&config.database.path).context("failed to open database")?;

    info!("running pending migrations");
    let report = db
        .apply_migrations(&source)
        .context("failed to run migrations")?;
    info!(
        "{} migration(s) applied, {} already present",
        report.applied.len(),
        report.skipped.len()
    );

    Ok(Arc::new(db))
}

fn serve(config: AppConfig) -> Result<()> {
    let db = migrate(&config)?;
    banner::print_banner(&config);

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime
        .block_on(GatewayServer::new(config, db).run())
        .context("server exited with an error")
}

fn print_status(config: &AppConfig) -> Result<()> {
    let source = MigrationSource::resolve(config.migrations.dir.as_deref())
        .context("failed to locate migrations")?;
    let db = Database::open(&config.database.path).context("failed to open database")?;
    let conn = db.connection().context("failed to acquire connection")?;

    let (applied, pending) =
        migrations::status(&conn, &source).context("failed to read migration status")?;

    println!("Migrations directory: {}", source.dir().display());
    println!("Database: {}", config.database.path.display());
    println!();
    if applied.is_empty() {
        println!("Applied: none");
    } else {
        println!("Applied:");
        for migration in &applied {
            println!(
                "  {}  {}",
                migration.applied_at.format("%Y-%m-%d %H:%M:%S"),
                migration.version
            );
        }
    }
    if pending.is_empty() {
        println!("Pending: none");
    } else {
        println!("Pending:");
        for file in &pending {
            println!("  {}", file.version);
        }
    }
    Ok(())
}
