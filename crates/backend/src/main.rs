#![allow(
    clippy::useless_format,
    clippy::type_complexity,
    clippy::too_many_arguments,
    clippy::derivable_impls
)]

pub mod dashboards;
pub mod domain;
pub mod handlers;
pub mod routes;
pub mod shared;
pub mod system;
pub mod usecases;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;

use crate::shared::config::{self, Config};
use crate::shared::data::db;
use crate::usecases::u600_pipeline::{run_pipeline, RunOptions};
use crate::usecases::u602_gamification::{managers, GamificationEngine};

#[derive(Debug, Parser)]
#[command(name = "league", about = "Sales league: rankings, medals and WhatsApp reports")]
struct Cli {
    /// Path to config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the full pipeline once
    Run {
        /// Use this goal sheet instead of the BI export
        #[arg(long)]
        meta_file: Option<PathBuf>,
        /// Keep an existing export for today instead of downloading again
        #[arg(long)]
        no_force: bool,
        /// Build everything but send nothing
        #[arg(long)]
        no_whatsapp: bool,
    },
    /// Start the dashboard HTTP server
    Serve,
    /// Run the pipeline on the configured cron schedules
    Schedule,
    /// Delete trophies from a date and replay scoring
    Recalc {
        #[arg(long, value_parser = parse_date)]
        from: NaiveDate,
        #[arg(long, value_parser = parse_date)]
        to: Option<NaiveDate>,
    },
    /// Remove duplicate weekly and monthly trophies
    Dedupe,
    /// Register managers from a CSV file
    RegisterManagers {
        #[arg(long)]
        file: PathBuf,
    },
    /// Import store holidays from CSV
    ImportHolidays {
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

async fn open_database(config: &Config) -> anyhow::Result<sea_orm::DatabaseConnection> {
    db::initialize_database(&config::get_database_path(config)).await?;
    Ok(db::get_connection()?.clone())
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let conn = open_database(&config).await?;
    system::initialization::initialize_reference_data(&conn, &config).await?;

    let output_dir = config.output_dir();
    std::fs::create_dir_all(&output_dir)?;
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid server.bind '{}': {}", config.server.bind, e))?;
    config::init_config(config)?;

    let app = routes::configure_routes(&output_dir);

    tracing::info!("Attempting to bind server to http://{}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            tracing::info!("Server successfully bound to {}", addr);
            listener
        }
        Err(e) => {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!("Error: {} is already in use", addr);
            } else {
                tracing::error!("Failed to bind to {}. Error: {}", addr, e);
            }
            return Err(e.into());
        }
    };

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = config::load_config(cli.config.as_deref())?;
    system::tracing::initialize(&config.logs_dir())?;
    tracing::info!("PIPELINE | configuration: {}", config.source);

    match cli.command {
        Command::Run {
            meta_file,
            no_force,
            no_whatsapp,
        } => {
            let conn = open_database(&config).await?;
            let options = RunOptions {
                meta_file,
                force: !no_force,
                send_whatsapp: !no_whatsapp,
                ..Default::default()
            };
            let outcome = run_pipeline(&config, conn, options).await?;
            tracing::info!(
                "PIPELINE | execution {} finished with {} ({} images)",
                outcome.execution_id,
                outcome.status.code(),
                outcome.images
            );
        }
        Command::Serve => serve(config).await?,
        Command::Schedule => {
            let conn = open_database(&config).await?;
            let worker = system::tasks::initialization::initialize_scheduled_tasks(&config, conn)?;
            worker.run_loop().await;
        }
        Command::Recalc { from, to } => {
            let to = to.unwrap_or_else(|| Local::now().date_naive());
            if to < from {
                anyhow::bail!("--to {} is before --from {}", to, from);
            }
            let conn = open_database(&config).await?;
            system::initialization::initialize_reference_data(&conn, &config).await?;
            let engine = GamificationEngine::load(conn, &config).await?;
            let summary = engine.recalc(from, to).await?;
            tracing::info!(
                "GAMIFICATION | recalculated {} days: {} trophies and {} weekly results removed; {} bronze, {} silver, {} monthly awarded",
                summary.days,
                summary.trophies_deleted,
                summary.weekly_results_deleted,
                summary.bronze,
                summary.silver,
                summary.monthly
            );
        }
        Command::Dedupe => {
            let conn = open_database(&config).await?;
            let engine = GamificationEngine::load(conn, &config).await?;
            let removed = engine.dedupe().await?;
            tracing::info!("GAMIFICATION | removed {} duplicate trophies", removed);
        }
        Command::RegisterManagers { file } => {
            let conn = open_database(&config).await?;
            let count = managers::register_managers(&conn, &file).await?;
            tracing::info!("GAMIFICATION | {} managers registered from {}", count, file.display());
        }
        Command::ImportHolidays { file } => {
            let conn = open_database(&config).await?;
            let path = file.unwrap_or_else(|| config.holidays_file());
            let count = domain::a106_holiday::service::import_store_csv(&conn, &path).await?;
            tracing::info!("HOLIDAYS | {} new holidays from {}", count, path.display());
        }
    }

    Ok(())
}
