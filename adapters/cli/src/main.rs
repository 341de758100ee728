#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that drives whack-a-mole rounds headlessly.

mod autopilot;
mod bests;
mod settings;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use whack_core::{Command, Event, MoleKind, RoundSummary};
use whack_world::{apply, query, LevelTuning, World};

use crate::{autopilot::Autopilot, bests::BestsStore, settings::Settings};

const FRAME: Duration = Duration::from_millis(16);
const AUTOPILOT_SALT: u64 = 0xa070_9170_7000_0001;
const DEFAULT_MAX_LEVELS: u32 = 50;

/// Headless whack-a-mole driver.
#[derive(Debug, Parser)]
#[command(name = "whack", version, about)]
struct Cli {
    /// TOML settings file overriding the reference tuning.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Seed for mole placement and categories.
    #[arg(long, global = true)]
    seed: Option<u64>,
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Plays one round with the autopilot.
    Play(PlayArgs),
    /// Prints the resolved difficulty of the first levels.
    Levels {
        /// Number of levels to print.
        #[arg(long, default_value_t = 10)]
        count: u32,
    },
}

#[derive(Debug, Args)]
struct PlayArgs {
    /// Delay between a mole appearing and the autopilot whacking it.
    #[arg(long, default_value_t = 450)]
    reaction_ms: u64,
    /// Fraction of whacks that land on the intended hole.
    #[arg(long, default_value_t = 0.85)]
    accuracy: f64,
    /// Stops the round after passing this many levels.
    #[arg(long, default_value_t = DEFAULT_MAX_LEVELS)]
    max_levels: u32,
    /// Personal-bests file to update with the result.
    #[arg(long, value_name = "PATH")]
    bests: Option<PathBuf>,
}

/// Entry point for the whack-a-mole command-line interface.
fn main() -> Result<()> {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();

    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => Settings::load(path).context("invalid --config")?,
        None => Settings::default(),
    };

    match cli.mode {
        Mode::Play(args) => {
            play(&settings, cli.seed, &args);
            Ok(())
        }
        Mode::Levels { count } => {
            print_levels(&settings.levels, count);
            Ok(())
        }
    }
}

fn play(settings: &Settings, seed: Option<u64>, args: &PlayArgs) {
    let mut world = World::new(settings.world_config(seed));
    let pilot_seed = seed.or(settings.seed).unwrap_or_default() ^ AUTOPILOT_SALT;
    let mut pilot = Autopilot::new(
        Duration::from_millis(args.reaction_ms),
        args.accuracy,
        pilot_seed,
    );

    let summary = run_round(&mut world, &mut pilot, args.max_levels);
    print_summary(&summary);

    if let Some(path) = &args.bests {
        record_bests(&BestsStore::new(path.clone()), &summary);
    }
}

fn run_round(world: &mut World, pilot: &mut Autopilot, max_levels: u32) -> RoundSummary {
    let mut pending = vec![Command::StartRound];
    loop {
        let mut events = Vec::new();
        for command in pending.drain(..) {
            apply(world, command, &mut events);
        }
        apply(world, Command::Tick { dt: FRAME }, &mut events);

        for event in &events {
            match event {
                Event::LevelStarted { level, config } => info!(
                    "level {} started: {} points needed in {}s",
                    level.get(),
                    config.score_threshold,
                    config.duration.as_secs()
                ),
                Event::LevelPassed {
                    level,
                    level_score,
                    threshold,
                } => {
                    println!(
                        "level {:>2} passed  {level_score:>6} / {threshold}",
                        level.get()
                    );
                    if level.get() >= max_levels {
                        apply(world, Command::ReturnToMenu, &mut Vec::new());
                        return query::summary(world);
                    }
                }
                Event::RoundEnded { summary } => {
                    let threshold = query::level_config(world)
                        .map_or(0, |config| config.score_threshold);
                    println!(
                        "level {:>2} failed  {:>6} / {threshold}",
                        summary.level_reached.get(),
                        query::level_score(world)
                    );
                    return *summary;
                }
                _ => {}
            }
        }

        pending = pilot.observe(&events);
        pending.extend(pilot.due_commands(query::now(world)));
    }
}

fn print_summary(summary: &RoundSummary) {
    let stats = &summary.stats;
    println!("final score    {}", summary.final_score);
    println!("level reached  {}", summary.level_reached.get());
    println!(
        "hits / misses  {} / {} ({:.1}% accuracy)",
        stats.hits,
        stats.misses,
        stats.accuracy() * 100.0
    );
    println!("max combo      {}", stats.max_combo);
    let by_kind: Vec<String> = stats
        .hits_by_kind
        .iter()
        .map(|(kind, count)| format!("{} {count}", kind_label(kind)))
        .collect();
    println!("hits by kind   {}", by_kind.join(", "));
}

fn record_bests(store: &BestsStore, summary: &RoundSummary) {
    let mut bests = match store.load() {
        Ok(bests) => bests,
        Err(error) => {
            warn!("personal bests not updated: {:#}", anyhow::Error::new(error));
            return;
        }
    };

    if bests.record(summary) {
        println!("new high score!");
    }
    match store.save(&bests) {
        Ok(()) => info!(
            "personal bests saved to {}: best {} points, {:.1}% accuracy, combo {}, level {}, {} rounds",
            store.path().display(),
            bests.best_score,
            bests.best_accuracy * 100.0,
            bests.max_combo,
            bests.highest_level,
            bests.rounds_played
        ),
        Err(error) => warn!("personal bests not saved: {:#}", anyhow::Error::new(error)),
    }
}

fn print_levels(tuning: &LevelTuning, count: u32) {
    println!("level  threshold  spawn ms   active ms  moles  penalty");
    for level in 1..=count.max(1) {
        let config = tuning.config_for(level);
        println!(
            "{:>5}  {:>9}  {:>4}-{:<4}  {:>4}-{:<4}  {:>5}  {:>7}",
            level,
            config.score_threshold,
            config.spawn_interval.min().as_millis(),
            config.spawn_interval.max().as_millis(),
            config.active_duration.min().as_millis(),
            config.active_duration.max().as_millis(),
            config.max_simultaneous,
            config.penalty_weight
        );
    }
}

fn kind_label(kind: MoleKind) -> &'static str {
    match kind {
        MoleKind::Common => "common",
        MoleKind::Rare => "rare",
        MoleKind::Golden => "golden",
        MoleKind::Penalty => "penalty",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use whack_core::{Level, RoundPhase};
    use whack_world::{KindWeights, SpawnerConfig, WorldConfig};

    #[test]
    fn flat_difficulty_stops_at_the_level_cap() {
        let mut config = WorldConfig::new(8);
        config.spawner = SpawnerConfig::new(8).with_weights(KindWeights {
            common: 1,
            rare: 0,
            golden: 0,
            penalty: 0,
        });
        config.tuning.threshold_growth = 1.0;
        config.tuning.base_threshold = 100;
        config.tuning.penalty_weight = 0;

        let mut world = World::new(config);
        let mut pilot = Autopilot::new(Duration::from_millis(100), 1.0, 8);
        let summary = run_round(&mut world, &mut pilot, 3);

        assert_eq!(summary.level_reached, Level::new(3));
        assert_eq!(summary.stats.misses, 0);
        assert_eq!(query::phase(&world), RoundPhase::Menu);
        assert_eq!(query::pending_tasks(&world), 0);
    }
}
