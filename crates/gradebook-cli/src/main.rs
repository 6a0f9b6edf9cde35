use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gradebook_core::models::Group;
use gradebook_db::{Database, DatabaseConfig};

#[derive(Parser)]
#[command(name = "gradebook", version, about = "Gradebook operator tooling")]
struct Cli {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", global = true, hide_env_values = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,

    /// Register a subject teachers can be assigned to
    AddSubject {
        /// Subject ID
        #[arg(long)]
        id: i32,
    },

    /// Create a student group with a fixed capacity
    AddGroup {
        /// Group ID
        #[arg(long)]
        id: i32,

        /// Maximum number of students in the group
        #[arg(short, long)]
        quantity: i32,
    },

    /// Show how full a group is
    Group {
        /// Group ID
        #[arg(long)]
        id: i32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("gradebook=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db = connect_db(cli.database_url.as_deref()).await?;

    match cli.command {
        Commands::Migrate => {
            db.migrate().await?;
            println!("Migrations applied");
        }
        Commands::AddSubject { id } => {
            db.migrate().await?;
            db.catalog_repo().create_subject(id).await?;
            println!("Subject {id} added");
        }
        Commands::AddGroup { id, quantity } => {
            db.migrate().await?;
            db.catalog_repo()
                .create_group(Group {
                    group_id: id,
                    quantity,
                })
                .await?;
            println!("Group {id} added (capacity {quantity})");
        }
        Commands::Group { id } => {
            let occupancy = db
                .catalog_repo()
                .occupancy(id)
                .await?
                .with_context(|| format!("Group {id} does not exist"))?;
            println!(
                "Group {}: {}/{} students{}",
                occupancy.group.group_id,
                occupancy.students,
                occupancy.group.quantity,
                if occupancy.has_room() { "" } else { " (full)" }
            );
        }
    }

    Ok(())
}

/// Connect using `--database-url` (or `DATABASE_URL`) plus the pool settings from the environment.
async fn connect_db(url: Option<&str>) -> Result<Database> {
    let config = DatabaseConfig::from_lookup(|key| match key {
        "DATABASE_URL" => url.map(str::to_string),
        _ => std::env::var(key).ok(),
    })?;
    Database::connect(&config)
        .await
        .context("Failed to connect to database")
}
