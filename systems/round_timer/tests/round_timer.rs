use std::time::Duration;

use whack_core::{Event, Task};
use whack_scheduler::TaskQueue;
use whack_system_round_timer::{RoundTimer, TickStatus, TimerConfig};

type Timeline = Vec<(Duration, Event)>;

fn pump(queue: &mut TaskQueue<Task>, timer: &mut RoundTimer, until: Duration) -> Timeline {
    let mut timeline = Vec::new();
    while let Some(due) = queue.pop_due(until) {
        assert_eq!(due.task, Task::TimerTick);
        let mut events = Vec::new();
        let _ = timer.on_tick(due.token, queue, &mut events);
        timeline.extend(events.into_iter().map(|event| (queue.now(), event)));
    }
    queue.advance_to(until);
    timeline
}

fn started(duration: Duration) -> (TaskQueue<Task>, RoundTimer) {
    let mut queue = TaskQueue::new();
    let mut timer = RoundTimer::new(TimerConfig::default());
    timer.start(duration, &mut queue);
    (queue, timer)
}

#[test]
fn publishes_remaining_time_rounded_up() {
    let (mut queue, mut timer) = started(Duration::from_secs(30));
    let timeline = pump(&mut queue, &mut timer, Duration::from_millis(100));

    assert_eq!(
        timeline,
        vec![(
            Duration::from_millis(100),
            Event::TimerTicked {
                remaining_secs: 30,
                warning: false,
            },
        )]
    );
    assert_eq!(timer.remaining(), Duration::from_millis(29_900));
    assert!(timer.is_running());
}

#[test]
fn warning_starts_at_ten_seconds_left() {
    let (mut queue, mut timer) = started(Duration::from_secs(30));

    let _ = pump(&mut queue, &mut timer, Duration::from_millis(19_900));
    assert_eq!(timer.remaining_secs(), 11);
    assert!(!timer.is_warning());

    let timeline = pump(&mut queue, &mut timer, Duration::from_secs(20));
    assert_eq!(
        timeline.last().map(|(_, event)| event.clone()),
        Some(Event::TimerTicked {
            remaining_secs: 10,
            warning: true,
        })
    );
    assert!(timer.is_warning());
}

#[test]
fn expires_once_when_the_countdown_reaches_zero() {
    let (mut queue, mut timer) = started(Duration::from_secs(30));
    let timeline = pump(&mut queue, &mut timer, Duration::from_secs(45));

    let expiries: Vec<Duration> = timeline
        .iter()
        .filter(|(_, event)| *event == Event::TimerExpired)
        .map(|(at, _)| *at)
        .collect();
    assert_eq!(expiries, vec![Duration::from_secs(30)]);

    let ticks = timeline
        .iter()
        .filter(|(_, event)| matches!(event, Event::TimerTicked { .. }))
        .count();
    assert_eq!(ticks, 300);
    assert_eq!(
        timeline.iter().rev().nth(1).map(|(_, event)| event.clone()),
        Some(Event::TimerTicked {
            remaining_secs: 0,
            warning: true,
        })
    );
    assert!(!timer.is_running());
    assert!(queue.is_empty());
}

#[test]
fn uneven_interval_saturates_at_zero() {
    let mut queue = TaskQueue::new();
    let mut timer = RoundTimer::new(TimerConfig {
        tick_interval_ms: 300,
        ..TimerConfig::default()
    });
    timer.start(Duration::from_secs(1), &mut queue);

    let timeline = pump(&mut queue, &mut timer, Duration::from_secs(5));
    assert_eq!(
        timeline.last(),
        Some(&(Duration::from_millis(1_200), Event::TimerExpired))
    );
    assert_eq!(timer.remaining(), Duration::ZERO);
}

#[test]
fn stopped_timer_never_expires() {
    let (mut queue, mut timer) = started(Duration::from_secs(2));
    let _ = pump(&mut queue, &mut timer, Duration::from_secs(1));

    timer.stop(&mut queue);
    assert!(!timer.is_running());
    assert!(queue.is_empty());
    assert!(pump(&mut queue, &mut timer, Duration::from_secs(10)).is_empty());
}

#[test]
fn restart_replaces_the_running_countdown() {
    let (mut queue, mut timer) = started(Duration::from_secs(5));
    let _ = pump(&mut queue, &mut timer, Duration::from_secs(4));

    timer.start(Duration::from_secs(5), &mut queue);
    assert_eq!(queue.len(), 1);
    assert_eq!(timer.remaining_secs(), 5);

    let timeline = pump(&mut queue, &mut timer, Duration::from_secs(20));
    let expiries: Vec<Duration> = timeline
        .iter()
        .filter(|(_, event)| *event == Event::TimerExpired)
        .map(|(at, _)| *at)
        .collect();
    assert_eq!(expiries, vec![Duration::from_secs(9)]);
}

#[test]
fn stale_tick_is_ignored() {
    let (mut queue, mut timer) = started(Duration::from_secs(5));
    let stale = queue
        .pop_due(Duration::from_millis(100))
        .expect("first tick is due")
        .token;
    timer.start(Duration::from_secs(5), &mut queue);

    let mut events = Vec::new();
    assert_eq!(timer.on_tick(stale, &mut queue, &mut events), TickStatus::Stale);
    assert!(events.is_empty());
    assert_eq!(timer.remaining(), Duration::from_secs(5));
}
