use std::time::Duration;

use whack_core::{
    ComboMultiplier, Command, Event, HitOutcome, Level, MoleKind, MoleSnapshot, RoundPhase,
};
use whack_world::{apply, query, KindWeights, SpawnerConfig, World, WorldConfig};

const STEP: Duration = Duration::from_millis(50);

fn send(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    apply(world, command, &mut events);
    events
}

fn tick(world: &mut World, dt: Duration) -> Vec<Event> {
    send(world, Command::Tick { dt })
}

fn whack(world: &mut World, mole: &MoleSnapshot) -> Vec<Event> {
    let slot = u32::try_from(mole.slot.get()).expect("slot index fits in u32");
    send(world, Command::Whack { slot: Some(slot) })
}

fn spawned(events: &[Event]) -> Vec<MoleSnapshot> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::MoleSpawned { mole } => Some(*mole),
            _ => None,
        })
        .collect()
}

fn outcome(events: &[Event]) -> HitOutcome {
    events
        .iter()
        .find_map(|event| match event {
            Event::MoleWhacked { outcome, .. } => Some(*outcome),
            _ => None,
        })
        .expect("whack should land on a live mole")
}

fn weighted(seed: u64, weights: KindWeights, penalty_weight: u32) -> WorldConfig {
    let mut config = WorldConfig::new(seed);
    config.spawner = SpawnerConfig::new(seed).with_weights(weights);
    config.tuning.penalty_weight = penalty_weight;
    config
}

fn common_only(seed: u64) -> WorldConfig {
    let weights = KindWeights {
        common: 1,
        rare: 0,
        golden: 0,
        penalty: 0,
    };
    weighted(seed, weights, 0)
}

/// Whacks the first five common moles of level one and runs the clock out.
fn play_to_pass(seed: u64) -> (World, Vec<HitOutcome>, Vec<Event>) {
    let mut world = World::new(common_only(seed));
    let _ = send(&mut world, Command::StartRound);

    let mut outcomes = Vec::new();
    while outcomes.len() < 5 {
        assert_eq!(query::phase(&world), RoundPhase::Playing);
        let events = tick(&mut world, STEP);
        for mole in spawned(&events) {
            if outcomes.len() < 5 {
                outcomes.push(outcome(&whack(&mut world, &mole)));
            }
        }
    }

    let mut tail = Vec::new();
    while query::phase(&world) == RoundPhase::Playing {
        tail.extend(tick(&mut world, STEP));
    }
    (world, outcomes, tail)
}

#[test]
fn five_common_hits_pass_level_one() {
    let (world, outcomes, tail) = play_to_pass(7);

    let points: Vec<i32> = outcomes.iter().map(|outcome| outcome.points).collect();
    assert_eq!(points, vec![100, 100, 150, 150, 200]);
    let multipliers: Vec<ComboMultiplier> =
        outcomes.iter().map(|outcome| outcome.multiplier).collect();
    assert_eq!(
        multipliers,
        vec![
            ComboMultiplier::Single,
            ComboMultiplier::Single,
            ComboMultiplier::OneAndHalf,
            ComboMultiplier::OneAndHalf,
            ComboMultiplier::Double,
        ]
    );
    let milestones: Vec<Option<u32>> = outcomes.iter().map(|outcome| outcome.milestone).collect();
    assert_eq!(milestones, vec![None, None, None, None, Some(5)]);

    let expired = tail
        .iter()
        .position(|event| *event == Event::TimerExpired)
        .expect("countdown should expire");
    let passed = tail
        .iter()
        .position(|event| {
            *event
                == Event::LevelPassed {
                    level: Level::FIRST,
                    level_score: 700,
                    threshold: 500,
                }
        })
        .expect("level one should pass");
    assert!(expired < passed);

    assert_eq!(query::now(&world), Duration::from_secs(30));
    assert_eq!(query::phase(&world), RoundPhase::LevelTransition);
    assert_eq!(query::score(&world), 700);
    assert_eq!(query::moles(&world).count(), 0);
    assert_eq!(query::pending_tasks(&world), 1);
    assert!(!query::is_active(&world));
}

#[test]
fn transition_advances_after_its_delay() {
    let (mut world, _, _) = play_to_pass(21);

    let events = tick(&mut world, Duration::from_millis(2_950));
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::LevelStarted { .. })));
    assert!(send(&mut world, Command::Whack { slot: Some(0) }).is_empty());

    let events = tick(&mut world, STEP);
    let config = query::level_config(&world).expect("level two is configured");
    assert!(events.contains(&Event::LevelStarted {
        level: Level::new(2),
        config,
    }));
    assert_eq!(config.score_threshold, 650);
    assert_eq!(query::phase(&world), RoundPhase::Playing);
    assert_eq!(query::level_score(&world), 0);
    assert_eq!(query::score(&world), 700);
    assert_eq!(query::combo(&world), 5);
    assert_eq!(query::remaining_secs(&world), 30);
}

#[test]
fn dismissal_skips_the_transition_delay() {
    let (mut world, _, _) = play_to_pass(33);

    let events = send(&mut world, Command::DismissTransition);
    assert!(events.contains(&Event::PhaseChanged {
        phase: RoundPhase::Playing,
    }));
    assert_eq!(query::level(&world), Level::new(2));
    assert_eq!(query::pending_tasks(&world), 2);

    let events = tick(&mut world, Duration::from_secs(4));
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::LevelStarted { .. })));
    assert_eq!(query::level(&world), Level::new(2));
}

#[test]
fn penalty_hit_breaks_a_running_combo() {
    let weights = KindWeights {
        common: 1,
        rare: 0,
        golden: 0,
        penalty: 0,
    };
    let mut config = weighted(13, weights, 1);
    config.tuning.duration_secs = 300;
    let mut world = World::new(config);
    let _ = send(&mut world, Command::StartRound);

    let mut penalty = None;
    while penalty.is_none() {
        assert_eq!(query::phase(&world), RoundPhase::Playing);
        for mole in spawned(&tick(&mut world, STEP)) {
            let combo = query::combo(&world);
            match mole.kind {
                MoleKind::Common if combo < 6 => {
                    let _ = whack(&mut world, &mole);
                }
                MoleKind::Penalty if combo == 6 && penalty.is_none() => {
                    assert_eq!(query::score(&world), 900);
                    assert_eq!(query::multiplier(&world), ComboMultiplier::Double);
                    penalty = Some(outcome(&whack(&mut world, &mole)));
                }
                _ => {}
            }
        }
    }

    let penalty = penalty.expect("penalty mole was whacked");
    assert_eq!(penalty.points, -200);
    assert_eq!(penalty.combo, 0);
    assert_eq!(penalty.multiplier, ComboMultiplier::Single);
    assert_eq!(query::combo(&world), 0);
    assert_eq!(query::multiplier(&world), ComboMultiplier::Single);
    assert_eq!(query::score(&world), 700);
    assert_eq!(query::stats(&world).max_combo, 6);
}

#[test]
fn penalties_never_push_the_score_below_zero() {
    let weights = KindWeights {
        common: 0,
        rare: 0,
        golden: 0,
        penalty: 0,
    };
    let mut world = World::new(weighted(3, weights, 1));
    let _ = send(&mut world, Command::StartRound);

    let mut penalties = 0;
    for _ in 0..200 {
        for mole in spawned(&tick(&mut world, STEP)) {
            assert_eq!(mole.kind, MoleKind::Penalty);
            let _ = whack(&mut world, &mole);
            penalties += 1;
            assert_eq!(query::score(&world), 0);
            assert_eq!(query::level_score(&world), 0);
        }
    }
    assert!(penalties > 0);
}

#[test]
fn idle_round_fails_level_one() {
    let mut world = World::default();
    let _ = send(&mut world, Command::StartRound);

    let mut log = Vec::new();
    while query::phase(&world) == RoundPhase::Playing {
        log.extend(tick(&mut world, Duration::from_millis(100)));
    }

    let summary = log
        .iter()
        .find_map(|event| match event {
            Event::RoundEnded { summary } => Some(*summary),
            _ => None,
        })
        .expect("round should end");
    assert_eq!(summary.final_score, 0);
    assert_eq!(summary.level_reached, Level::FIRST);
    assert_eq!(summary.stats.hits, 0);
    assert_eq!(summary.stats.misses, 0);
    assert!(log
        .iter()
        .any(|event| matches!(event, Event::MoleRetreated { .. })));
    assert!(!log
        .iter()
        .any(|event| matches!(event, Event::LevelPassed { .. })));

    assert_eq!(query::phase(&world), RoundPhase::RoundOver);
    assert_eq!(query::pending_tasks(&world), 0);
    assert_eq!(query::moles(&world).count(), 0);

    let dt = Duration::from_secs(10);
    assert_eq!(tick(&mut world, dt), vec![Event::TimeAdvanced { dt }]);

    let events = send(&mut world, Command::StartRound);
    assert_eq!(events.first(), Some(&Event::RoundStarted));
    assert_eq!(query::phase(&world), RoundPhase::Playing);
    assert_eq!(query::level(&world), Level::FIRST);
}

#[test]
fn pause_freezes_the_round() {
    let mut world = World::default();
    assert!(send(&mut world, Command::Pause).is_empty());
    let _ = send(&mut world, Command::StartRound);
    let _ = tick(&mut world, Duration::from_secs(1));

    assert_eq!(
        send(&mut world, Command::Pause),
        vec![Event::PauseChanged { paused: true }]
    );
    let now = query::now(&world);
    let remaining = query::remaining_secs(&world);
    let moles: Vec<MoleSnapshot> = query::moles(&world).copied().collect();
    assert!(!query::is_active(&world));

    let dt = Duration::from_secs(10);
    assert_eq!(tick(&mut world, dt), vec![Event::TimeAdvanced { dt }]);
    assert!(send(&mut world, Command::Whack { slot: None }).is_empty());
    assert_eq!(query::now(&world), now);
    assert_eq!(query::remaining_secs(&world), remaining);
    assert_eq!(query::moles(&world).copied().collect::<Vec<_>>(), moles);

    assert_eq!(
        send(&mut world, Command::Resume),
        vec![Event::PauseChanged { paused: false }]
    );
    let events = tick(&mut world, Duration::from_millis(100));
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::TimerTicked { .. })));
    assert_eq!(query::now(&world), now + Duration::from_millis(100));
}

#[test]
fn misses_break_the_combo() {
    let mut world = World::new(common_only(17));
    let _ = send(&mut world, Command::StartRound);

    assert_eq!(
        send(&mut world, Command::Whack { slot: Some(9) }),
        vec![Event::Missed { broken_combo: 0 }]
    );

    let mut hits = 0;
    while hits < 2 {
        for mole in spawned(&tick(&mut world, STEP)) {
            if hits < 2 {
                let _ = whack(&mut world, &mole);
                hits += 1;
            }
        }
    }
    assert_eq!(query::combo(&world), 2);

    assert_eq!(
        send(&mut world, Command::Whack { slot: None }),
        vec![Event::Missed { broken_combo: 2 }]
    );
    assert_eq!(query::combo(&world), 0);
    let stats = query::stats(&world);
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.hits_by_kind.get(MoleKind::Common), 2);
}
