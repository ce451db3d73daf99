//! Main entry point for the padel ladder command line tool
//!
//! Loads configuration, opens the JSON ladder file and runs one command
//! against it: register players, record matches, or print rankings,
//! history, rating charts and match lists.

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use padel_ladder::config::AppConfig;
use padel_ladder::display::{render_history, render_matches, render_rankings};
use padel_ladder::error::ladder_error;
use padel_ladder::ledger::HistoryLimit;
use padel_ladder::metrics::LadderMetrics;
use padel_ladder::recording::{MatchSubmission, TeamSubmission};
use padel_ladder::service::LadderService;
use padel_ladder::storage::JsonFileLadderStore;
use padel_ladder::RequestContext;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Padel Ladder - doubles match recording and Elo rankings
#[derive(Parser)]
#[command(
    name = "padel-ladder",
    version,
    about = "Record doubles padel matches and keep an Elo ladder",
    long_about = "Padel Ladder records 2v2 match results, rates each team by the mean of its \
                 players, applies the same Elo change to both partners, and keeps an \
                 append-only rating history for every player."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Ladder data file override
    #[arg(long, value_name = "FILE", help = "Override the ladder data file")]
    data_file: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Admin password
    #[arg(long, help = "Admin password, required for writes when one is configured")]
    password: Option<String>,

    /// Print metrics after the command
    #[arg(long, help = "Print Prometheus metrics after the command completes")]
    print_metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a new player at the initial rating
    AddPlayer {
        name: String,
    },

    /// Record a doubles match result
    RecordMatch {
        #[arg(long, num_args = 2, value_names = ["PLAYER1", "PLAYER2"], required = true)]
        team1: Vec<String>,

        #[arg(long, num_args = 2, value_names = ["PLAYER1", "PLAYER2"], required = true)]
        team2: Vec<String>,

        /// Winning team, 1 or 2
        #[arg(long)]
        winner: u8,

        /// Match date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        team1_score: Option<String>,

        #[arg(long)]
        team2_score: Option<String>,
    },

    /// Show the leaderboard
    Rankings {
        /// Show only the top N players
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show a player's recent rating changes
    History {
        name: String,

        /// Number of rows, defaults to the configured history limit
        #[arg(long, conflicts_with = "all")]
        limit: Option<usize>,

        /// Show every row
        #[arg(long)]
        all: bool,
    },

    /// Show a player's rating over time
    Trajectory {
        name: String,
    },

    /// List matches, optionally for one player
    Matches {
        #[arg(long)]
        player: Option<String>,
    },
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load and merge configuration from environment, file and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if let Some(data_file) = &args.data_file {
        config.service.data_file = data_file.clone();
    }

    padel_ladder::config::validate_config(&config)?;
    Ok(config)
}

/// Admin when no password is configured or the supplied one matches
fn request_context(config: &AppConfig, password: Option<&str>) -> RequestContext {
    let actor = std::env::var("USER").unwrap_or_else(|_| "cli".to_string());

    match config.service.admin_password.as_deref() {
        None => RequestContext::admin(actor),
        Some(expected) if password == Some(expected) => RequestContext::admin(actor),
        Some(_) => RequestContext::viewer(actor),
    }
}

fn run(service: &LadderService, ctx: &RequestContext, command: Command) -> Result<()> {
    match command {
        Command::AddPlayer { name } => {
            let player = service.add_player(ctx, &name)?;
            println!(
                "Added {} with starting rating {}",
                player.name, player.current_rating
            );
        }
        Command::RecordMatch {
            team1,
            team2,
            winner,
            date,
            team1_score,
            team2_score,
        } => {
            let team = |names: Vec<String>, score: Option<String>| {
                let [p1, p2]: [String; 2] = names
                    .try_into()
                    .map_err(|_| anyhow::anyhow!("each team needs exactly two players"))?;
                Ok::<_, anyhow::Error>(TeamSubmission {
                    players: [p1, p2],
                    score,
                })
            };

            let submission = MatchSubmission {
                team1: team(team1, team1_score)?,
                team2: team(team2, team2_score)?,
                winning_team: winner,
                match_date: date.unwrap_or_else(|| Utc::now().date_naive()),
            };

            let recorded = service.record_match(ctx, &submission)?;
            println!(
                "Match recorded: Team {} won ({})",
                recorded.record.winning_team.number(),
                recorded.match_score()
            );
            for (player, row) in recorded.players.iter().zip(&recorded.history) {
                println!(
                    "  {:<25} {} -> {} ({:+})",
                    player.name, row.old_rating, row.new_rating, row.rating_change
                );
            }
        }
        Command::Rankings { limit } => {
            let rows = service.rankings(limit)?;
            let title = match limit {
                Some(n) => format!("TOP {} PLAYERS", n),
                None => "CURRENT RANKINGS".to_string(),
            };
            print!("{}", render_rankings(&rows, &title));
        }
        Command::History { name, limit, all } => {
            let limit = if all {
                Some(HistoryLimit::All)
            } else {
                limit.map(HistoryLimit::Recent)
            };
            let rows = service.player_history(&name, limit)?;
            print!("{}", render_history(&name, &rows));
        }
        Command::Trajectory { name } => {
            let points = service.trajectory(&name)?;
            if points.is_empty() {
                println!("No match history found for {}", name);
            }
            for point in points {
                println!("{}  {}", point.at.format("%Y-%m-%d %H:%M"), point.rating);
            }
        }
        Command::Matches { player } => {
            let rows = match player {
                Some(name) => service.matches_for(&name)?,
                None => service.all_matches()?,
            };
            print!("{}", render_matches(&rows));
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration (CLI args can override environment/config file)
    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    // Initialize logging early (before any other operations)
    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!(
        "{} v{} using {}",
        config.service.name,
        padel_ladder::VERSION,
        config.service.data_file.display()
    );

    let store = match JsonFileLadderStore::open(config.service.data_file.clone()) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("Failed to open ladder data: {:#}", e);
            std::process::exit(1);
        }
    };

    let metrics = Arc::new(LadderMetrics::new()?);
    let service = LadderService::new(config, store, metrics.clone())?;
    let ctx = request_context(service.config(), args.password.as_deref());

    let outcome = run(&service, &ctx, args.command);

    if args.print_metrics {
        print!("{}", metrics.encode_text()?);
    }

    if let Err(e) = outcome {
        match ladder_error(&e) {
            Some(err) if err.is_recoverable() => {
                warn!("{}", err);
                eprintln!("Error: {}", err);
            }
            _ => {
                error!("{:#}", e);
                eprintln!("Error: {:#}", e);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}
