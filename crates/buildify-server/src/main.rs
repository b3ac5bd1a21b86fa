mod api;
mod config;
mod serve_cmd;
#[cfg(test)]
mod test_util;

use clap::{Parser, Subcommand};

use buildify_db::pool;

use config::{BuildifyConfig, CliOverrides};

#[derive(Parser)]
#[command(
    name = "buildify",
    version,
    about = "Backend for AI-assisted business branding"
)]
struct Cli {
    /// Database URL (overrides BUILDIFY_DATABASE_URL / DATABASE_URL)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a buildify config file with a fresh token secret
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/buildify")]
        db_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create the database if needed and apply migrations
    DbInit,
    /// Run the HTTP API
    Serve {
        /// Address to bind (overrides BUILDIFY_BIND)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
    },
}

/// Execute `buildify init`: write the config file.
fn cmd_init(db_url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();
    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let token_secret = config::generate_token_secret();
    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: Some(db_url.to_string()),
        },
        auth: config::AuthSection {
            token_secret: Some(token_secret.clone()),
        },
        ..Default::default()
    };
    let path = config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!(
        "  auth.token_secret = {}...{}",
        &token_secret[..8],
        &token_secret[56..]
    );
    println!();
    println!(
        "Set {} and {} (or add them under [providers]), then run `buildify db-init`.",
        config::GEMINI_API_KEY_ENV,
        config::HUGGINGFACE_API_KEY_ENV
    );
    Ok(())
}

/// Execute `buildify db-init`: create the database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let db_config = config::resolve_database(cli_db_url)?;
    println!("Initializing buildify database...");

    if pool::ensure_database_exists(&db_config).await? {
        println!("Created database at {}", db_config.redacted_url());
    }
    let db_pool = pool::create_pool(&db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let inventory = pool::inventory(&db_pool).await?;
    println!("Database ready.");
    println!("  users:       {}", inventory.users);
    println!("  projects:    {}", inventory.projects);
    println!("  image_blobs: {}", inventory.image_blobs);
    db_pool.close().await;

    println!("buildify db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; real environment variables still apply.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { db_url, force } => cmd_init(&db_url, force)?,
        Commands::DbInit => cmd_db_init(cli.database_url.as_deref()).await?,
        Commands::Serve { bind, port } => {
            let resolved = BuildifyConfig::resolve(CliOverrides {
                database_url: cli.database_url.as_deref(),
                bind: bind.as_deref(),
                port,
            })?;
            serve_cmd::run_serve(resolved).await?;
        }
    }

    Ok(())
}
