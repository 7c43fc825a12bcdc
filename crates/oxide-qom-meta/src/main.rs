//! qom-inspect CLI
//!
//! Prints the column definitions of a SQLite table and the `SELECT` that
//! reads it, rendered for a chosen dialect.

use std::time::Duration;

use clap::Parser;
use oxide_qom::{Dialect, Renderer};
use sqlx::sqlite::SqlitePoolOptions;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_qom_meta::{ReadOptions, SqliteCatalog, SqliteTableReader, TableDefinition};

/// Inspect SQLite tables as typed query fields.
#[derive(Parser)]
#[command(name = "qom-inspect")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL (SQLite path or connection string).
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite:db.sqlite3")]
    database: String,

    /// Table or view to inspect (lists tables if not specified).
    #[arg(short, long)]
    table: Option<String>,

    /// Dialect to render the SELECT for.
    #[arg(long, default_value = "sqlite")]
    dialect: Dialect,

    /// Timeout for reading one table, in seconds.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Print the definition as JSON.
    #[arg(long)]
    json: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&cli.database)
        .await?;
    let catalog = SqliteCatalog::new(pool);

    let Some(table) = cli.table else {
        let tables = catalog.tables().await?;
        if tables.is_empty() {
            info!("No tables found.");
        }
        for name in tables {
            println!("{name}");
        }
        return Ok(());
    };

    let options = ReadOptions::default().with_timeout(Duration::from_secs(cli.timeout_secs));
    let reader = SqliteTableReader::new(catalog, options);
    let definition = reader.table(&table).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&definition)?);
        return Ok(());
    }

    print_definition(&definition);
    let rendered = Renderer::new(cli.dialect).render(&definition.select_all())?;
    println!("\n-- {}", cli.dialect);
    println!("{}", rendered.sql);
    Ok(())
}

fn print_definition(definition: &TableDefinition) {
    println!("\n{}:", definition.name());
    println!("{:-<60}", "");
    for column in definition.columns() {
        let data_type = &column.data_type;
        let mut flags = Vec::new();
        if !data_type.nullable {
            flags.push("NOT NULL".to_string());
        }
        if column.identity {
            flags.push("IDENTITY".to_string());
        }
        if let Some(generation) = data_type.generation {
            flags.push(format!("GENERATED {generation:?}").to_uppercase());
        }
        if let Some(default) = &data_type.default_value {
            flags.push(format!("DEFAULT {default}"));
        }
        println!(
            " {:>3} {:<24} {:<16} {}",
            column.position,
            column.name,
            data_type.data_type(),
            flags.join(" ")
        );
    }
}
