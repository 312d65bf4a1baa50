use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use einmaleins::app::{App, AppAction, AppState, SaveStatus};
use einmaleins::clock::ManualClock;
use einmaleins::config::Config;
use einmaleins::history::{open_repository, HistoryBackend};
use einmaleins::runtime::{AppEvent, FixedTicker, Runner, TestEventSource};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn key(code: KeyCode) -> AppEvent {
    AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

// Headless integration using the internal runtime + App without a TTY.
// Answers are sent one problem at a time because they depend on the draw.
#[test]
fn headless_game_is_played_and_saved() {
    let dir = tempfile::tempdir().unwrap();
    let repository = open_repository(HistoryBackend::Sqlite, dir.path()).unwrap();
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let settings = Config {
        problem_count: 5,
        ..Config::default()
    };
    let mut app = App::with_collaborators(
        settings,
        repository,
        clock.clone(),
        StdRng::seed_from_u64(2024),
    );

    let (tx, es) = TestEventSource::channel();
    let runner = Runner::new(es, FixedTicker::new(Duration::from_millis(5)));

    tx.send(key(KeyCode::Enter)).unwrap();
    let mut queued_for = None;

    for _ in 0..500u32 {
        if let Some(problem) = app.current_problem() {
            if queued_for.as_ref() != Some(&problem.id) {
                for c in problem.solution().to_string().chars() {
                    tx.send(key(KeyCode::Char(c))).unwrap();
                }
                tx.send(key(KeyCode::Enter)).unwrap();
                queued_for = Some(problem.id.clone());
            }
        }

        match runner.step() {
            AppEvent::Key(k) => {
                clock.advance(1_000);
                assert_eq!(app.on_key(k), AppAction::Continue);
            }
            AppEvent::Tick | AppEvent::Resize => {}
        }

        if matches!(app.state, AppState::Finished { .. }) {
            break;
        }
    }

    let AppState::Finished { result, save } = &app.state else {
        panic!("game should have finished, state is {:?}", app.state);
    };
    assert_eq!(save, &SaveStatus::Saved);
    assert_eq!(result.problem_count, 5);
    assert_eq!(result.correct_count, 5);
    assert_eq!(result.correct_rate, 1.0);
    assert!(result.duration > 0);

    // A fresh repository over the same directory sees the saved game
    let reopened = open_repository(HistoryBackend::Sqlite, dir.path()).unwrap();
    let history = reopened.load().unwrap();
    assert_eq!(history.games, vec![result.history_entry()]);
}

#[test]
fn headless_escape_quits() {
    let repository = open_repository(HistoryBackend::Off, std::path::Path::new(".")).unwrap();
    let mut app = App::new(Config::default(), repository);

    let (tx, es) = TestEventSource::channel();
    let runner = Runner::new(es, FixedTicker::new(Duration::from_millis(5)));
    tx.send(key(KeyCode::Enter)).unwrap();
    tx.send(key(KeyCode::Esc)).unwrap();

    let mut quit = false;
    for _ in 0..10u32 {
        if let AppEvent::Key(k) = runner.step() {
            if app.on_key(k) == AppAction::Quit {
                quit = true;
                break;
            }
        }
    }

    assert!(quit, "escape should quit from a running game");
    assert!(matches!(app.state, AppState::Running { .. }));
}
