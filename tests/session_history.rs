use std::sync::Arc;

use einmaleins::clock::ManualClock;
use einmaleins::game::Game;
use einmaleins::history::{
    codec, open_repository, GameHistoryRepository, HistoryBackend, HistoryError, JsonFileStore,
    KeyValueStore, StorageGameHistoryRepository,
};
use einmaleins::problem::{Operator, ProblemSpec};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Play a whole game with every answer correct, one second per problem
fn play_perfect_game(seed: u64, start: i64) -> einmaleins::game::GameResult {
    let clock = Arc::new(ManualClock::new(start));
    let spec = ProblemSpec::new([Operator::Multiply], 2, 9).unwrap();
    let mut game = Game::with_rng(spec, 20, &mut StdRng::seed_from_u64(seed), clock.clone()).unwrap();

    loop {
        let answer = game.current_problem().unwrap().solution();
        clock.advance(1_000);
        if let Some(result) = game.register_solution(answer).unwrap() {
            return result;
        }
    }
}

#[test]
fn perfect_game_is_saved_and_reloaded_from_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let result = play_perfect_game(7, 1_000_000);

    assert_eq!(result.problem_count, 20);
    assert_eq!(result.correct_count, 20);
    assert_eq!(result.correct_rate, 1.0);
    assert_eq!(result.duration, 20_000);
    assert_eq!(result.duration_per_problem, 1_000.0);

    {
        let mut repository = open_repository(HistoryBackend::Sqlite, dir.path()).unwrap();
        repository.save(&result.history_entry()).unwrap();
    }

    let repository = open_repository(HistoryBackend::Sqlite, dir.path()).unwrap();
    let history = repository.load().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history.games[0].started_at, 1_000_000);
    assert_eq!(history.games[0].finished_at, 1_020_000);
    assert_eq!(history.games[0].correct_rate, 1.0);
}

#[test]
fn saves_append_in_order_across_backends() {
    for backend in [HistoryBackend::Sqlite, HistoryBackend::File] {
        let dir = tempfile::tempdir().unwrap();
        let mut repository = open_repository(backend, dir.path()).unwrap();
        let starts = [10_000, 500_000, 90_000_000];
        for (seed, start) in starts.iter().enumerate() {
            let result = play_perfect_game(seed as u64, *start);
            repository.save(&result.history_entry()).unwrap();
        }

        let loaded: Vec<i64> = repository
            .load()
            .unwrap()
            .games
            .iter()
            .map(|g| g.started_at)
            .collect();
        assert_eq!(loaded, starts, "{backend}");
    }
}

#[test]
fn null_backend_keeps_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut repository = open_repository(HistoryBackend::Off, dir.path()).unwrap();
    repository
        .save(&play_perfect_game(1, 0).history_entry())
        .unwrap();
    assert!(repository.load().unwrap().is_empty());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn unsupported_version_on_disk_is_reported_not_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = JsonFileStore::new(dir.path());
    store
        .set(codec::STORAGE_KEY, r#"{"version":2,"games":[]}"#)
        .unwrap();

    let mut repository = StorageGameHistoryRepository::new(store);
    let err = repository.load().unwrap_err();
    assert!(matches!(err, HistoryError::UnsupportedVersion(ref v) if v == 2));
    assert_eq!(err.to_string(), "unsupported history data version: 2");

    assert!(repository
        .save(&play_perfect_game(3, 0).history_entry())
        .is_err());
    let raw = repository.store().get(codec::STORAGE_KEY).unwrap().unwrap();
    assert_eq!(raw, r#"{"version":2,"games":[]}"#);
}
