use std::time::Duration;

use anyhow::anyhow;
use grid_snake_core::{
    DeathCause, Direction, Event, Food, FoodKind, GameConfig, LevelNumber, Phase, Position,
};
use grid_snake_rendering::{NullBackend, Presentation, RecordingBackend, RenderingBackend};
use grid_snake_session::{
    HighScoreStore, Input, MemoryStore, Session, SessionError, StoreError,
};
use grid_snake_world::{query, scaffolding::Layout, World};

fn config() -> GameConfig {
    GameConfig {
        seed: Some(42),
        ..GameConfig::default()
    }
}

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn straight_snake() -> Vec<Position> {
    vec![
        Position::new(10, 9),
        Position::new(10, 8),
        Position::new(10, 7),
    ]
}

fn food_at(row: i32, col: i32) -> Option<Food> {
    Some(Food {
        cell: Position::new(row, col),
        kind: FoodKind::Normal,
    })
}

#[test]
fn crossing_the_threshold_celebrates_before_the_next_tick() {
    let world = World::with_layout(
        config(),
        Layout {
            score: 290,
            food: food_at(10, 10),
            ..Layout::with_snake(straight_snake())
        },
    );
    let mut session = Session::from_world(world, MemoryStore::default(), NullBackend);

    assert_eq!(session.advance(ms(150)).expect("null backend"), 1);

    let world = session.world();
    assert_eq!(query::phase(world), Phase::Celebrating);
    assert!(query::level_completed(world));
    assert_eq!(query::score(world), 300);
    assert!(session.clock().is_paused());
    assert_eq!(session.ledger().cached(1), 300);

    let events = session.drain_events();
    assert!(events.contains(&Event::LevelCompleted { level: 1, next: 2 }));
    assert!(events.contains(&Event::LevelUnlocked { level: 2 }));

    assert_eq!(session.advance(ms(1_000)).expect("null backend"), 0);
    assert_eq!(query::current_level(session.world()), 1);

    assert_eq!(session.advance(ms(1_500)).expect("null backend"), 0);
    let world = session.world();
    assert_eq!(query::current_level(world), 2);
    assert_eq!(query::phase(world), Phase::Playing);
    assert_eq!(query::score(world), 0);
    assert!(session.clock().is_running());

    assert_eq!(session.advance(ms(130)).expect("null backend"), 1);
}

#[test]
fn one_frame_is_presented_per_tick() {
    let mut session = Session::new(config(), MemoryStore::default(), RecordingBackend::default());

    session.input(Input::Start).expect("recording backend");
    assert_eq!(session.backend().frames().len(), 1);

    assert_eq!(session.advance(ms(450)).expect("recording backend"), 3);
    assert_eq!(session.backend().frames().len(), 4);

    let last = session.backend().last().expect("frames were presented");
    assert_eq!(last.hud.phase, Phase::Playing);
    assert_eq!(last.window_title, "Grid Snake - Level 1: Classic");
}

#[test]
fn ignored_inputs_do_not_present() {
    let mut session = Session::new(config(), MemoryStore::default(), RecordingBackend::default());

    session
        .input(Input::SwitchLevel(3))
        .expect("recording backend");
    session.input(Input::Pause).expect("recording backend");

    assert!(session.backend().frames().is_empty());
    assert!(session.drain_events().is_empty());
}

#[test]
fn toggling_pause_suspends_ticks() {
    let mut session = Session::new(config(), MemoryStore::default(), NullBackend);
    session.input(Input::Start).expect("null backend");

    session.input(Input::TogglePause).expect("null backend");
    assert_eq!(query::phase(session.world()), Phase::Paused);
    assert_eq!(session.advance(ms(1_000)).expect("null backend"), 0);

    session.input(Input::TogglePause).expect("null backend");
    assert_eq!(query::phase(session.world()), Phase::Playing);
    assert_eq!(session.advance(ms(150)).expect("null backend"), 1);
}

#[test]
fn steering_applies_on_the_next_tick() {
    let mut session = Session::new(config(), MemoryStore::default(), NullBackend);
    session.input(Input::Start).expect("null backend");

    session
        .input(Input::Steer(Direction::Left))
        .expect("null backend");
    session.input(Input::Steer(Direction::Up)).expect("null backend");
    let _ = session.advance(ms(150)).expect("null backend");

    assert_eq!(session.snapshot().head(), Some(Position::new(9, 11)));
}

#[test]
fn death_cancels_the_clock() {
    let world = World::with_layout(
        config(),
        Layout::with_snake(vec![
            Position::new(10, 19),
            Position::new(10, 18),
            Position::new(10, 17),
        ]),
    );
    let mut session = Session::from_world(world, MemoryStore::default(), NullBackend);

    assert_eq!(session.advance(ms(150)).expect("null backend"), 1);
    assert_eq!(query::phase(session.world()), Phase::GameOver);
    assert_eq!(session.clock().live_handle(), None);
    assert!(session.drain_events().contains(&Event::GameOver {
        cause: DeathCause::Boundary,
        final_score: 0,
    }));

    assert_eq!(session.advance(ms(5_000)).expect("null backend"), 0);

    session.input(Input::Reset).expect("null backend");
    assert_eq!(query::phase(session.world()), Phase::Ready);
    assert_eq!(session.advance(ms(5_000)).expect("null backend"), 0);
}

#[test]
fn stored_high_score_reaches_the_snapshot() {
    let session = Session::new(
        config(),
        MemoryStore::with_scores([(1, 640)]),
        NullBackend,
    );
    assert_eq!(session.snapshot().high_score, 640);
}

#[derive(Debug, Default)]
struct FlakyStore;

impl HighScoreStore for FlakyStore {
    fn load(&mut self, _level: LevelNumber) -> Result<u32, StoreError> {
        Ok(0)
    }

    fn save(&mut self, _level: LevelNumber, _score: u32) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("quota exceeded".to_owned()))
    }
}

#[test]
fn persistence_failure_keeps_the_session_running() {
    let world = World::with_layout(
        config(),
        Layout {
            food: food_at(10, 10),
            ..Layout::with_snake(straight_snake())
        },
    );
    let mut session = Session::from_world(world, FlakyStore, NullBackend);

    assert_eq!(session.advance(ms(150)).expect("null backend"), 1);

    assert!(session.ledger().is_degraded());
    assert_eq!(session.snapshot().high_score, 10);
    assert_eq!(query::phase(session.world()), Phase::Playing);
}

#[derive(Debug, Default)]
struct BrokenBackend;

impl RenderingBackend for BrokenBackend {
    fn present(&mut self, _presentation: &Presentation) -> anyhow::Result<()> {
        Err(anyhow!("display lost"))
    }
}

#[test]
fn renderer_failure_is_reported_after_the_state_change() {
    let mut session = Session::new(config(), MemoryStore::default(), BrokenBackend);

    let error = session.input(Input::Start).expect_err("backend fails");
    assert!(matches!(error, SessionError::Render(_)));
    assert_eq!(query::phase(session.world()), Phase::Playing);
}

fn replay() -> Vec<Event> {
    let mut session = Session::new(config(), MemoryStore::default(), NullBackend);
    session.input(Input::Start).expect("null backend");
    let script = [
        Input::Steer(Direction::Down),
        Input::Steer(Direction::Left),
        Input::Steer(Direction::Up),
        Input::Steer(Direction::Right),
    ];
    for (step, input) in script.iter().cycle().take(12).enumerate() {
        session.input(*input).expect("null backend");
        let dt = ms(40 + (step as u64 % 3) * 60);
        let _ = session.advance(dt).expect("null backend");
    }
    session.drain_events()
}

#[test]
fn sessions_with_equal_seeds_replay_identically() {
    let first = replay();
    let second = replay();
    assert!(first.iter().any(|event| matches!(event, Event::Ticked { .. })));
    assert_eq!(first, second);
}
