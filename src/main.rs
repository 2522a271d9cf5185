use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vct_team_builder::agents::backend::create_backend;
use vct_team_builder::agents::prompt::PromptRequest;
use vct_team_builder::agents::team_builder::{GenerationSettings, TeamBuilderAgent};
use vct_team_builder::agents::Agent;
use vct_team_builder::api::{build_router, state::AppState};
use vct_team_builder::calculate::display_map_name;
use vct_team_builder::config::AppConfig;
use vct_team_builder::context::filter_context;
use vct_team_builder::models::{ParsedTeam, TeamCategory};
use vct_team_builder::parse::parse_team_response;
use vct_team_builder::storage::PlayerStore;

#[derive(Parser)]
#[command(name = "vct-team-builder")]
#[command(about = "VALORANT team composition assistant backed by a hosted LLM")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port number (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Generate a team and print it
    Generate {
        /// professional, semi_pro or game_changers
        #[arg(long, default_value = "professional")]
        category: TeamCategory,

        /// Number of players to consider
        #[arg(long)]
        limit: Option<usize>,

        /// Custom query; replaces the category preset
        #[arg(long)]
        query: Option<String>,

        /// Reject teams failing the role and IGL checks
        #[arg(long)]
        strict: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show the player pool a prompt would use
    Players {
        #[arg(long, default_value = "all")]
        category: TeamCategory,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Decode a saved model response
    ParseResponse {
        /// File holding the raw completion text
        path: PathBuf,
    },
}

fn init_tracing(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_team(team: &ParsedTeam) {
    for player in &team.players {
        println!(
            "{}{} - {} ({})",
            player.name,
            if player.igl { " [IGL]" } else { "" },
            player.role,
            player.team
        );
        println!("  Primary: {}", player.primary_agents.join(", "));
        if !player.backup_agents.is_empty() {
            println!("  Backup:  {}", player.backup_agents.join(", "));
        }
        println!("  KDA: {:.2}  Winrate: {:.1}%", player.kda, player.winrate);
        if !player.reasoning.is_empty() {
            println!("  {}", player.reasoning);
        }
        println!();
    }

    match &team.analysis {
        Some(analysis) => {
            println!("=== Team Analysis ===");
            println!("{}", analysis.summary);
            if !analysis.top_maps.is_empty() {
                println!("\nTop maps:");
                for pref in &analysis.top_maps {
                    println!("  {:<10} {:.1}%", display_map_name(&pref.map), pref.percentage);
                }
            }
        }
        None if team.is_empty() => {
            println!("No players recognised. Raw response:\n{}", team.raw_response);
        }
        None => {}
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    config.ai = config.ai.resolved();

    let level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    init_tracing(&level, cli.json_logs);

    tracing::info!("Starting vct-team-builder v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;

            let backend = create_backend(&config.ai)?;
            let store = PlayerStore::new(config.data_file.clone());
            let addr = format!("{}:{}", config.server.host, config.server.port);

            let app = build_router(AppState::new(config, store, backend));
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Team builder: http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Generate {
            category,
            limit,
            query,
            strict,
            json,
        } => {
            let backend = create_backend(&config.ai)?;
            let store = PlayerStore::new(config.data_file.clone());
            let mut settings = GenerationSettings::from(&config);
            settings.strict |= strict;

            let limit = config.player_limit.clamp(limit);
            let request = match query {
                Some(query) => PromptRequest::custom(query, limit),
                None => PromptRequest::preset(category, limit),
            };

            eprintln!("Analyzing players and building team...");
            let agent = TeamBuilderAgent::new(backend, std::sync::Arc::new(store), settings);
            let composition = agent.execute(request).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&composition)?);
            } else {
                print_team(&composition.team);
                if !composition.map_averages.is_empty() {
                    println!("\nRecorded team average per map:");
                    for (map, avg) in &composition.map_averages {
                        println!("  {:<10} {:.1}%", display_map_name(map), avg);
                    }
                }
            }
        }
        Commands::Players { category, limit } => {
            let store = PlayerStore::new(config.data_file.clone());
            let document = store.get()?;
            let context = filter_context(&document, category, config.player_limit.clamp(limit));

            for (rank, player) in context.players.iter().enumerate() {
                println!(
                    "{:>4}. {:<16} {:<12} {:<20} KDA {:.2}  WR {:.1}%",
                    rank + 1,
                    player.handle,
                    player.primary_role,
                    player.team,
                    player.kda,
                    player.overall_winrate
                );
            }
            println!(
                "\n{} shown, {} eligible, {} skipped, {} in file",
                context.len(),
                context.eligible_count,
                context.skipped_count,
                context.input_count
            );
        }
        Commands::ParseResponse { path } => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            if raw.trim().is_empty() {
                bail!("{} is empty", path.display());
            }
            print_team(&parse_team_response(&raw));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_json_flags() {
        let cli = Cli::try_parse_from([
            "vct-team-builder",
            "generate",
            "--category",
            "game_changers",
            "--json",
        ])
        .unwrap();

        match cli.command {
            Commands::Generate { category, json, .. } => {
                assert_eq!(category, TeamCategory::GameChangers);
                assert!(json);
            }
            _ => panic!("expected generate"),
        }
    }
}
