//! Integration tests for the shipped scenarios and file loading.

use std::io::Write;
use std::path::PathBuf;

use tanks_core::simulation::GameStatus;
use tanks_headless::{run_scenario, verify_determinism, Scenario, ScenarioError};
use tanks_test_utils::fixtures::{ARENA_AI_SPAWNS, ARENA_LAYOUT, ARENA_PLAYER_SPAWN};

fn scenario_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("scenarios")
        .join(name)
}

#[test]
fn test_shipped_scenarios_load_and_build() {
    for name in ["arena.ron", "duel.ron"] {
        let scenario = Scenario::load(scenario_path(name)).unwrap();
        let sim = scenario.build().unwrap();
        assert!(sim.player_id().is_some(), "{name} has no player");
        assert_eq!(sim.ai_count(), scenario.ai.len());
    }
}

#[test]
fn test_arena_matches_fixture_layout() {
    let scenario = Scenario::load(scenario_path("arena.ron")).unwrap();
    assert_eq!(scenario.layout, ARENA_LAYOUT);
    assert_eq!(scenario.player, Some(ARENA_PLAYER_SPAWN));
    let spawner = scenario.config.spawner.as_ref().unwrap();
    assert_eq!(spawner.spawn_points, ARENA_AI_SPAWNS.to_vec());
}

#[test]
fn test_arena_verifies_deterministic() {
    let mut scenario = Scenario::load(scenario_path("arena.ron")).unwrap();
    scenario.max_ticks = 900;
    let report = verify_determinism(&scenario, 2).unwrap();
    assert!(report.deterministic, "diverged at {:?}", report.first_divergence);
    assert!(report.ticks > 0);
}

#[test]
fn test_reseeding_changes_the_run() {
    let mut a = Scenario::load(scenario_path("arena.ron")).unwrap();
    a.max_ticks = 600;
    let mut b = a.clone();
    b.reseed(a.seed + 1);

    let first = run_scenario(a).unwrap();
    let second = run_scenario(b).unwrap();
    assert_ne!(first.final_hash, second.final_hash);
}

#[test]
fn test_summary_serializes_to_json() {
    let mut scenario = Scenario::load(scenario_path("duel.ron")).unwrap();
    scenario.max_ticks = 120;
    let summary = run_scenario(scenario).unwrap();

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["scenario"], "Duel");
    assert_eq!(json["ticks"], 120);
    assert_eq!(json["status"], "Running");
    assert!(json["totals"]["shots"].as_u64().unwrap() > 0);
}

#[test]
fn test_load_from_temp_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"Scenario(
            name: "Temp",
            layout: ["...", ".B.", "..."],
            player: Some((x: 0, y: 0)),
            max_ticks: 10,
        )"#
    )
    .unwrap();

    let scenario = Scenario::load(file.path()).unwrap();
    let summary = run_scenario(scenario).unwrap();
    assert_eq!(summary.ticks, 10);
    assert_eq!(summary.status, GameStatus::Running);
    assert!(summary.player_alive);
}

#[test]
fn test_malformed_file_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.ron");
    std::fs::write(&path, "Scenario(name: \"Broken\", layout: [").unwrap();
    assert!(matches!(
        Scenario::load(&path),
        Err(ScenarioError::ParseError(_))
    ));
}

#[test]
fn test_invalid_config_is_rejected_at_build() {
    let scenario = Scenario::from_ron_str(
        r#"Scenario(
            name: "Bad",
            layout: ["..."],
            config: (arrival_threshold: 0.0),
        )"#,
    )
    .unwrap();
    assert!(matches!(scenario.build(), Err(ScenarioError::Game(_))));
}
