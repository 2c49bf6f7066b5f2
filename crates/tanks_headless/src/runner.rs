//! Headless scenario runner.
//!
//! Drives a [`Simulation`] built from a [`Scenario`] at a fixed step,
//! feeding the scripted player input, and condenses the run into a
//! serializable [`RunSummary`].

use serde::{Deserialize, Serialize};
use tanks_core::collision::ImpactKind;
use tanks_core::components::DamageOutcome;
use tanks_core::math::{ratio, Fixed};
use tanks_core::simulation::{GameStatus, Simulation, TickEvents};

use crate::scenario::{Scenario, ScenarioError};

/// Event totals accumulated over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTotals {
    /// Projectiles launched.
    pub shots: u64,
    /// Projectile hits on actors.
    pub hits: u64,
    /// Hits soaked by armor.
    pub absorbed: u64,
    /// Actors removed.
    pub deaths: u64,
    /// Pickups collected.
    pub pickups: u64,
    /// AI tanks spawned by the reinforcement timer.
    pub spawned: u64,
    /// Actor pairs pushed apart.
    pub pushes: u64,
    /// Brick walls destroyed.
    pub bricks_destroyed: u64,
    /// Facing changes.
    pub facing_changes: u64,
}

impl EventTotals {
    /// Fold one tick's events into the totals.
    pub fn record(&mut self, events: &TickEvents) {
        self.shots += events.shots.len() as u64;
        self.hits += events.hits.len() as u64;
        self.absorbed += events
            .hits
            .iter()
            .filter(|hit| hit.outcome == DamageOutcome::Absorbed)
            .count() as u64;
        self.deaths += events.deaths.len() as u64;
        self.pickups += events.pickups.len() as u64;
        self.spawned += events.spawned.len() as u64;
        self.pushes += events.pushes as u64;
        self.bricks_destroyed += events
            .impacts
            .iter()
            .filter(|impact| matches!(impact.kind, ImpactKind::Brick { destroyed: true }))
            .count() as u64;
        self.facing_changes += events.facing_changes.len() as u64;
    }
}

/// Outcome of a headless run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Scenario name.
    pub scenario: String,
    /// Base seed the run used.
    pub seed: u64,
    /// Ticks simulated.
    pub ticks: u64,
    /// Final game status.
    pub status: GameStatus,
    /// Final score.
    pub score: u64,
    /// Whether the player tank is still alive.
    pub player_alive: bool,
    /// AI tanks alive at the end.
    pub ai_remaining: usize,
    /// Event totals.
    pub totals: EventTotals,
    /// Final state hash, hex encoded.
    pub final_hash: String,
}

/// Runs one scenario to completion.
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    scenario: Scenario,
    sim: Simulation,
    dt: Fixed,
    totals: EventTotals,
    hash_trace: Vec<u64>,
    record_trace: bool,
}

impl ScenarioRunner {
    /// Build the scenario's simulation.
    pub fn new(scenario: Scenario) -> Result<Self, ScenarioError> {
        let sim = scenario.build()?;
        let rate = i32::try_from(scenario.tick_rate)
            .map_err(|_| ScenarioError::Invalid("tick_rate too large".into()))?;
        Ok(Self {
            dt: ratio(1, rate),
            scenario,
            sim,
            totals: EventTotals::default(),
            hash_trace: Vec::new(),
            record_trace: false,
        })
    }

    /// Keep every tick's state hash for divergence reports.
    #[must_use]
    pub fn with_hash_trace(mut self) -> Self {
        self.record_trace = true;
        self
    }

    /// The simulation being driven.
    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Per-tick state hashes, if tracing was enabled.
    pub fn hash_trace(&self) -> &[u64] {
        &self.hash_trace
    }

    /// Whether the run has ended (game over or tick limit).
    pub fn is_finished(&self) -> bool {
        self.sim.status() != GameStatus::Running || self.sim.get_tick() >= self.scenario.max_ticks
    }

    /// Advance one tick with the scripted input.
    pub fn step(&mut self) -> TickEvents {
        if let Some(player) = self.sim.player_id() {
            let input = self.scenario.input_at(self.sim.get_tick());
            if let Err(e) = self.sim.set_player_input(player, input) {
                tracing::warn!(error = %e, "Dropped scripted input");
            }
        }

        let events = self.sim.tick(self.dt);
        self.totals.record(&events);

        let hash = self.sim.state_hash();
        tracing::trace!(tick = self.sim.get_tick(), hash = %format_args!("{hash:016x}"), "Tick");
        if self.record_trace {
            self.hash_trace.push(hash);
        }

        if let Some(status) = events.status_changed {
            tracing::info!(
                tick = self.sim.get_tick(),
                status = ?status,
                score = self.sim.score(),
                "Game ended"
            );
        }
        events
    }

    /// Run until the game ends or the tick limit is hit.
    pub fn run(mut self) -> RunSummary {
        while !self.is_finished() {
            self.step();
        }
        self.summary()
    }

    /// Summary of the run so far.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            scenario: self.scenario.name.clone(),
            seed: self.scenario.seed,
            ticks: self.sim.get_tick(),
            status: self.sim.status(),
            score: self.sim.score(),
            player_alive: self.sim.player_id().is_some(),
            ai_remaining: self.sim.ai_count(),
            totals: self.totals,
            final_hash: format!("{:016x}", self.sim.state_hash()),
        }
    }
}

/// Run a scenario once and summarize it.
pub fn run_scenario(scenario: Scenario) -> Result<RunSummary, ScenarioError> {
    tracing::info!(
        scenario = %scenario.name,
        seed = scenario.seed,
        max_ticks = scenario.max_ticks,
        "Running scenario"
    );
    Ok(ScenarioRunner::new(scenario)?.run())
}

/// Result of replaying a scenario several times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Scenario name.
    pub scenario: String,
    /// Number of runs compared.
    pub runs: u32,
    /// Ticks in the first run.
    pub ticks: u64,
    /// Whether every run matched the first.
    pub deterministic: bool,
    /// First tick (1-based) at which some run diverged from the first.
    pub first_divergence: Option<u64>,
    /// Final hash of each run, hex encoded.
    pub final_hashes: Vec<String>,
}

/// Replay `scenario` `runs` times and compare tick-by-tick state hashes.
pub fn verify_determinism(scenario: &Scenario, runs: u32) -> Result<VerifyReport, ScenarioError> {
    let mut traces: Vec<Vec<u64>> = Vec::with_capacity(runs as usize);
    for run in 0..runs {
        let mut runner = ScenarioRunner::new(scenario.clone())?.with_hash_trace();
        while !runner.is_finished() {
            runner.step();
        }
        tracing::debug!(run, ticks = runner.hash_trace().len(), "Verification run complete");
        traces.push(runner.hash_trace);
    }

    let first_divergence = traces.first().and_then(|reference| {
        traces[1..]
            .iter()
            .filter_map(|trace| first_difference(reference, trace))
            .min()
    });

    let report = VerifyReport {
        scenario: scenario.name.clone(),
        runs,
        ticks: traces.first().map_or(0, |t| t.len() as u64),
        deterministic: first_divergence.is_none(),
        first_divergence,
        final_hashes: traces
            .iter()
            .map(|t| t.last().map_or_else(String::new, |h| format!("{h:016x}")))
            .collect(),
    };

    if report.deterministic {
        tracing::info!(runs, ticks = report.ticks, "All runs identical");
    } else {
        tracing::warn!(tick = ?report.first_divergence, "Non-determinism detected");
    }
    Ok(report)
}

fn first_difference(a: &[u64], b: &[u64]) -> Option<u64> {
    let common = a.len().min(b.len());
    if let Some(index) = (0..common).find(|&i| a[i] != b[i]) {
        return Some(index as u64 + 1);
    }
    // One run ended early.
    (a.len() != b.len()).then_some(common as u64 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tanks_core::grid::TileCoord;
    use tanks_core::movement::pixel_center;

    fn duel() -> Scenario {
        Scenario::from_ron_str(
            r#"
            Scenario(
                name: "Duel",
                layout: [
                    "@@@@@@@",
                    "@.....@",
                    "@.....@",
                    "@.....@",
                    "@..B..@",
                    "@@@@@@@",
                ],
                seed: 4,
                player: Some((x: 1, y: 3)),
                ai: [(archetype: Standard, tile: (x: 5, y: 1))],
                inputs: [
                    (start: 0, ticks: 30, direction: Some(Up)),
                    (start: 30, ticks: 300, direction: Some(Right), fire: true),
                ],
                max_ticks: 240,
            )
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_run_stops_at_tick_limit() {
        let summary = run_scenario(duel()).unwrap();
        assert!(summary.ticks <= 240);
        if summary.status == GameStatus::Running {
            assert_eq!(summary.ticks, 240);
        }
        assert_eq!(summary.scenario, "Duel");
        assert_eq!(summary.final_hash.len(), 16);
        assert!(summary.totals.shots > 0);
    }

    #[test]
    fn test_zero_tick_limit_runs_nothing() {
        let mut scenario = duel();
        scenario.max_ticks = 0;
        let summary = run_scenario(scenario).unwrap();
        assert_eq!(summary.ticks, 0);
        assert_eq!(summary.totals, EventTotals::default());
    }

    #[test]
    fn test_verify_is_deterministic() {
        let report = verify_determinism(&duel(), 3).unwrap();
        assert!(report.deterministic);
        assert_eq!(report.first_divergence, None);
        assert_eq!(report.final_hashes.len(), 3);
        assert!(report.final_hashes.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_summary_matches_verify_hash() {
        let summary = run_scenario(duel()).unwrap();
        let report = verify_determinism(&duel(), 1).unwrap();
        assert_eq!(report.final_hashes[0], summary.final_hash);
        assert_eq!(report.ticks, summary.ticks);
    }

    #[test]
    fn test_player_can_be_omitted() {
        let mut scenario = duel();
        scenario.player = None;
        scenario.inputs.clear();
        let summary = run_scenario(scenario).unwrap();
        assert!(!summary.player_alive);
        // No player to lose, so only the base can end the game.
        assert_ne!(summary.status, GameStatus::PlayerDestroyed);
    }

    #[test]
    fn test_first_difference() {
        assert_eq!(first_difference(&[1, 2, 3], &[1, 2, 3]), None);
        assert_eq!(first_difference(&[1, 2, 3], &[1, 9, 3]), Some(2));
        assert_eq!(first_difference(&[1, 2], &[1, 2, 3]), Some(3));
    }

    #[test]
    fn test_runner_exposes_simulation() {
        let runner = ScenarioRunner::new(duel()).unwrap();
        let player = runner.simulation().player_id().unwrap();
        let actor = runner.simulation().actor(player).unwrap();
        let expected = pixel_center(runner.simulation().grid(), TileCoord::new(1, 3));
        assert_eq!(actor.position, expected);
    }
}
