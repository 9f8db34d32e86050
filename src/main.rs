use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use matchday::api::state::AppState;
use matchday::builder::{schedule_event_with, ScheduleOptions};
use matchday::config::AppConfig;
use matchday::models::EntityId;
use matchday::standings::compute_standings;
use matchday::storage::EventStore;

#[derive(Parser)]
#[command(name = "matchday")]
#[command(about = "Sports event scheduler: brackets, round-robins, and field assignment")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: String,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },

    /// Build (or rebuild) the schedule for a stored event
    Build {
        /// Event id
        id: String,

        /// Projected participant count when rosters aren't full
        #[arg(long)]
        participants: Option<u32>,
    },

    /// Print the standings table for a stored event
    Standings {
        /// Event id
        id: String,

        /// Division id to scope the table to
        #[arg(long)]
        division: Option<String>,
    },

    /// Check a stored event's configuration and capacity without building
    Validate {
        /// Event id
        id: String,

        /// Projected participant count when rosters aren't full
        #[arg(long)]
        participants: Option<u32>,
    },

    /// List stored events
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = PathBuf::from(&cli.config);
    let mut config = if config_path.exists() {
        AppConfig::from_file(&config_path)
            .with_context(|| format!("failed to load {}", config_path.display()))?
    } else {
        AppConfig::default()
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = PathBuf::from(dir);
    }

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting matchday v{}", env!("CARGO_PKG_VERSION"));

    let store = EventStore::new(config.data_dir.clone());

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or(config.server.host);
            let port = port.unwrap_or(config.server.port);
            let state = AppState::new(store, config.scheduling.max_retries);
            let app = matchday::api::build_router(state);
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Build { id, participants } => {
            let event = store.load(&EntityId::from(id))?;
            let opts = ScheduleOptions {
                participant_count: participants,
                max_retries: config.scheduling.max_retries,
            };
            match schedule_event_with(event, &opts) {
                Ok(built) => {
                    store.save(&built)?;
                    println!("Scheduled {} matches for {}", built.matches.len(), built.name);
                    println!("Season runs {} to {}", built.start, built.end);
                }
                Err(failure) => bail!("schedule build failed: {}", failure),
            }
        }
        Commands::Standings { id, division } => {
            let event = store.load(&EntityId::from(id))?;
            let division = division.map(EntityId::from);
            let table = compute_standings(&event, division.as_ref());
            if table.is_empty() {
                println!("No teams registered.");
                return Ok(());
            }
            println!(
                "{:<4} {:<24} {:>3} {:>3} {:>3} {:>3} {:>5} {:>5} {:>7}",
                "#", "Team", "P", "W", "D", "L", "PF", "PA", "Pts"
            );
            for row in &table {
                println!(
                    "{:<4} {:<24} {:>3} {:>3} {:>3} {:>3} {:>5} {:>5} {:>7}",
                    row.rank,
                    row.team_name,
                    row.played,
                    row.wins,
                    row.draws,
                    row.losses,
                    row.points_for,
                    row.points_against,
                    row.points,
                );
            }
        }
        Commands::Validate { id, participants } => {
            let event = store.load(&EntityId::from(id))?;
            match matchday::builder::validate_event(&event, participants) {
                Ok(diag) => {
                    println!("Configuration OK for {}", event.name);
                    println!(
                        "Estimated {} matches needing {:.1} hours of field time",
                        diag.required_matches,
                        diag.needed_minutes as f64 / 60.0
                    );
                    let extra = diag.extra_weeks_needed();
                    if extra > 0 {
                        println!(
                            "Warning: the configured window is about {} week(s) short; \
                             a build will extend the season to fit",
                            extra
                        );
                    }
                }
                Err(failure) => bail!("validation failed: {}", failure),
            }
        }
        Commands::List => {
            let events = store.load_all()?;
            if events.is_empty() {
                println!("No events stored.");
                return Ok(());
            }
            for event in &events {
                println!(
                    "{}  {}  ({} teams, {} matches)",
                    event.id,
                    event.name,
                    event.teams.len(),
                    event.matches.len()
                );
            }
        }
    }

    Ok(())
}
