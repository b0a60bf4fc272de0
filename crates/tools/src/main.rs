use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tactics_core::{AutoResolver, ContentPack, EngineConfig, Game, MapConfig, SessionSnapshot};
use tactics_tools::autoplay::Autoplay;
use tactics_tools::summary::RunSummary;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Auto-play a session to an outcome", long_about = None)]
struct Args {
    /// Session snapshot JSON to start from
    #[arg(long, conflicts_with = "map")]
    session: Option<PathBuf>,

    /// TOML map to start from; the built-in skirmish when neither is given
    #[arg(long)]
    map: Option<PathBuf>,

    /// JSON combat content pack
    #[arg(long)]
    content: Option<PathBuf>,

    /// Give up after this many player turns
    #[arg(long, default_value_t = 40)]
    max_turns: u32,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

fn load_snapshot(args: &Args) -> Result<SessionSnapshot> {
    if let Some(path) = &args.session {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read session file: {}", path.display()))?;
        return serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse session JSON: {}", path.display()));
    }
    let map = match &args.map {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read map file: {}", path.display()))?;
            MapConfig::from_toml_str(&text)
                .with_context(|| format!("Invalid map: {}", path.display()))?
        }
        None => MapConfig::default_skirmish(),
    };
    Ok(map.into_snapshot("simulate"))
}

fn load_content(args: &Args) -> Result<ContentPack> {
    let Some(path) = &args.content else {
        return Ok(ContentPack::build_default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read content pack: {}", path.display()))?;
    ContentPack::from_json_str(&text)
        .with_context(|| format!("Invalid content pack: {}", path.display()))
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
    let args = Args::parse();

    let config = EngineConfig::default();
    let rounds = config.auto_resolver_rounds;
    let game = Game::new(load_snapshot(&args)?, config).context("Session layout is invalid")?;
    let mut game = game.with_combat(load_content(&args)?, AutoResolver::new(rounds));

    let mut autoplay = Autoplay::new();
    let outcome = autoplay.play(&mut game, args.max_turns);
    info!(?outcome, frames = autoplay.frames(), "simulation finished");

    let summary = RunSummary::collect(&game, autoplay.frames());
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }
    println!("Simulation complete.");
    println!("Outcome: {}", summary.outcome_label());
    println!("Turns: {}", summary.turns);
    println!("Battles: {}", summary.battles);
    println!("Deaths: {}", summary.deaths);
    println!("Players left: {}", summary.players_left.join(", "));
    println!("Enemies left: {}", summary.enemies_left.join(", "));
    println!("Snapshot Hash: {}", summary.snapshot_hash);
    Ok(())
}
