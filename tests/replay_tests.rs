// Replay engine tests
//
// The fixture walks one snake straight at a food item. The last tick records a move
// the planner would not make, so it must show up as a mismatch.

use snake3d_bot::config::Config;
use snake3d_bot::fallback::PlanOutcome;
use snake3d_bot::replay::ReplayEngine;
use snake3d_bot::types::{Cell, Direction};
use std::path::PathBuf;

/// Helper function to get the path to test fixtures
fn fixture_path(filename: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(filename)
}

#[test]
fn test_load_log_file() {
    let engine = ReplayEngine::new(Config::default_hardcoded(), false);

    let entries = engine
        .load_log_file(fixture_path("straight_line.jsonl"))
        .expect("Failed to load straight_line.jsonl");

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].turn, 1);
    assert_eq!(entries[0].state.map_size, [10, 10, 10]);
    assert_eq!(entries[0].state.snakes[0].head(), Some(Cell::new(0, 0, 0)));
    assert_eq!(entries[0].moves[0].direction, Direction::PosX);
    assert_eq!(entries[1].moves[0].outcome, PlanOutcome::Reused);
    assert_eq!(entries[2].state.enemies.len(), 1);
}

#[test]
fn test_missing_log_file_is_an_error() {
    let engine = ReplayEngine::new(Config::default_hardcoded(), false);
    let result = engine.load_log_file(fixture_path("no_such_file.jsonl"));
    assert!(result.is_err());
}

#[test]
fn test_replay_detects_divergence() {
    let engine = ReplayEngine::new(Config::default_hardcoded(), false);
    let entries = engine
        .load_log_file(fixture_path("straight_line.jsonl"))
        .expect("Failed to load straight_line.jsonl");

    let results = engine.replay_entries(&entries, None).expect("replay failed");

    assert_eq!(results.len(), 3);
    assert!(results[0].matches);
    assert!(results[1].matches);
    assert!(!results[2].matches);

    assert_eq!(results[0].replayed[0].outcome, PlanOutcome::Targeted);
    assert_eq!(results[1].replayed[0].outcome, PlanOutcome::Reused);
    assert_eq!(results[2].replayed[0].direction, Direction::PosX);

    let stats = ReplayEngine::compute_stats(&results);
    assert_eq!(stats.total_turns, 3);
    assert_eq!(stats.matches, 2);
    assert_eq!(stats.mismatches, 1);
    assert!((stats.match_rate - 2.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_turn_filter_still_replays_earlier_ticks() {
    let engine = ReplayEngine::new(Config::default_hardcoded(), false);
    let entries = engine
        .load_log_file(fixture_path("straight_line.jsonl"))
        .expect("Failed to load straight_line.jsonl");

    let results = engine
        .replay_entries(&entries, Some(&[3]))
        .expect("replay failed");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].turn, 3);
    // Path memory from turns 1 and 2 carried over
    assert_eq!(results[0].replayed[0].outcome, PlanOutcome::Reused);
}

#[test]
fn test_stats_of_empty_replay() {
    let stats = ReplayEngine::compute_stats(&[]);
    assert_eq!(stats.total_turns, 0);
    assert_eq!(stats.match_rate, 0.0);
}
