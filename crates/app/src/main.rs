use clap::Parser;
use migration::{Migrator, MigratorTrait};

mod cli;
mod error;
mod handlers;
mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = cli::Cli::parse();
    let settings = settings::Settings::load(&cli)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "pocketbook={level},engine={level}",
            level = settings.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let db = connect_database(&settings.database_url).await?;
    let engine = engine::Engine::builder()
        .database(db)
        .owner(settings.owner.as_str())
        .build()
        .await?;

    if let Err(err) = handlers::run(&engine, cli.command, cli.json).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }

    Ok(())
}

async fn connect_database(url: &str) -> error::Result<sea_orm::DatabaseConnection> {
    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    tracing::debug!("database ready");
    Ok(database)
}
