//! Determinism harness.
//!
//! Runs a setup and step function several times (sequentially, or on
//! scoped threads) and compares [`Simulation::state_hash`] values, either
//! at the end of the run or tick by tick.
//!
//! Things that would break replay in the tank core and how they are kept
//! out:
//!
//! - **Floats**: all positions, speeds and timers are
//!   [`tanks_core::math::Fixed`].
//! - **Ordering**: actors live in ascending id order and modifiers in a
//!   `BTreeMap`, so every pass visits them the same way.
//! - **Randomness**: each AI tank carries its own seeded
//!   [`tanks_core::rng::SimRng`]; nothing reads the system clock or OS entropy.

use std::thread;

use tanks_core::simulation::Simulation;

/// Final hashes from repeated runs of the same setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// True when every run ended on the same hash.
    pub is_deterministic: bool,
    /// One final hash per run, in run order.
    pub hashes: Vec<u64>,
    /// Ticks each run was stepped.
    pub ticks: u64,
}

impl DeterminismResult {
    fn from_hashes(hashes: Vec<u64>, ticks: u64) -> Self {
        let is_deterministic = hashes.iter().all(|h| Some(h) == hashes.first());
        Self {
            is_deterministic,
            hashes,
            ticks,
        }
    }

    /// Distinct final hashes, sorted. A single entry means the runs agreed.
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut distinct = self.hashes.clone();
        distinct.sort_unstable();
        distinct.dedup();
        distinct
    }

    /// Panic with every run's hash when the runs disagreed.
    ///
    /// # Panics
    ///
    /// Panics when more than one distinct final hash was seen.
    pub fn assert_deterministic(&self) {
        assert!(
            self.is_deterministic,
            "{} runs of {} ticks ended on {} different states: {:016x?}",
            self.hashes.len(),
            self.ticks,
            self.unique_hashes().len(),
            self.hashes
        );
    }
}

/// Step fresh copies of some state `runs` times and compare the final hashes.
///
/// Generic over the state so the harness itself can be tested without a
/// simulation.
///
/// ```
/// use tanks_core::simulation::Simulation;
/// use tanks_test_utils::determinism::verify_determinism;
/// use tanks_test_utils::fixtures::{arena_sim, scripted_step};
///
/// verify_determinism(3, 120, || arena_sim(11), scripted_step, |sim: &Simulation| {
///     sim.state_hash()
/// })
/// .assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let hashes = (0..runs)
        .map(|_| {
            let mut state = setup();
            (0..ticks).for_each(|_| step(&mut state));
            hash(&state)
        })
        .collect();
    DeterminismResult::from_hashes(hashes, ticks)
}

/// Two runs of a [`Simulation`]; `true` when they end on the same hash.
pub fn verify_simulation_determinism<F, Step>(setup: F, step: Step, ticks: u64) -> bool
where
    F: Fn() -> Simulation,
    Step: Fn(&mut Simulation),
{
    verify_determinism(2, ticks, setup, step, |sim: &Simulation| sim.state_hash()).is_deterministic
}

/// State hash after every tick of one run, starting with the initial state.
pub fn hash_trace<F, Step>(setup: F, step: Step, ticks: u64) -> Vec<u64>
where
    F: Fn() -> Simulation,
    Step: Fn(&mut Simulation),
{
    let mut sim = setup();
    let mut trace = Vec::with_capacity(ticks as usize + 1);
    trace.push(sim.state_hash());
    for _ in 0..ticks {
        step(&mut sim);
        trace.push(sim.state_hash());
    }
    trace
}

/// Run `sims` copies on scoped threads and compare their final hashes.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn run_parallel_simulations<F, Step>(
    setup: F,
    step: Step,
    sims: usize,
    ticks: u64,
) -> DeterminismResult
where
    F: Fn() -> Simulation + Sync,
    Step: Fn(&mut Simulation) + Sync,
{
    let (setup, step) = (&setup, &step);
    let hashes: Vec<u64> = thread::scope(|scope| {
        let workers: Vec<_> = (0..sims)
            .map(|_| {
                scope.spawn(move || {
                    let mut sim = setup();
                    (0..ticks).for_each(|_| step(&mut sim));
                    sim.state_hash()
                })
            })
            .collect();
        workers
            .into_iter()
            .map(|worker| worker.join().expect("simulation thread panicked"))
            .collect()
    });
    DeterminismResult::from_hashes(hashes, ticks)
}

/// First tick at which two runs disagree (`0` is the initial state), or
/// `None` if they agree for all `ticks`.
pub fn find_first_divergence<F, Step>(setup: F, step: Step, ticks: u64) -> Option<u64>
where
    F: Fn() -> Simulation,
    Step: Fn(&mut Simulation),
{
    let a = hash_trace(&setup, &step, ticks);
    let b = hash_trace(&setup, &step, ticks);
    a.iter().zip(&b).position(|(x, y)| x != y).map(|tick| tick as u64)
}

/// Proptest strategies for simulation inputs.
pub mod strategies {
    use proptest::prelude::*;
    use tanks_core::components::{Direction, PlayerInput};
    use tanks_core::grid::{TileCoord, TileKind};
    use tanks_core::math::Fixed;
    use tanks_core::modifiers::ModifierKind;

    /// Any facing.
    pub fn arb_direction() -> impl Strategy<Value = Direction> {
        prop::sample::select(Direction::ALL.to_vec())
    }

    /// Any modifier kind.
    pub fn arb_modifier_kind() -> impl Strategy<Value = ModifierKind> {
        prop::sample::select(vec![
            ModifierKind::SpeedMultiplier,
            ModifierKind::SpeedIncrease,
            ModifierKind::AttackMultiplier,
            ModifierKind::FireRateMultiplier,
        ])
    }

    /// Any tile kind, weighted toward open ground.
    pub fn arb_tile_kind() -> impl Strategy<Value = TileKind> {
        prop_oneof![
            6 => Just(TileKind::Open),
            2 => Just(TileKind::Brick),
            1 => Just(TileKind::Steel),
            1 => Just(TileKind::Water),
            1 => Just(TileKind::Forest),
        ]
    }

    /// A tile inside a `width` x `height` map.
    pub fn arb_tile_in(width: i32, height: i32) -> impl Strategy<Value = TileCoord> {
        (0..width, 0..height).prop_map(|(x, y)| TileCoord::new(x, y))
    }

    /// A fixed-point value in `[lo, hi)` with 1/100 resolution.
    pub fn arb_fixed_between(lo: i32, hi: i32) -> impl Strategy<Value = Fixed> {
        (lo * 100..hi * 100).prop_map(|n| Fixed::from_num(n) / Fixed::from_num(100))
    }

    /// A frame time between 1/120 s and 1/20 s.
    pub fn arb_dt() -> impl Strategy<Value = Fixed> {
        (20i32..=120).prop_map(|fps| Fixed::ONE / Fixed::from_num(fps))
    }

    /// One tick of player input.
    pub fn arb_player_input() -> impl Strategy<Value = PlayerInput> {
        (proptest::option::of(arb_direction()), any::<bool>())
            .prop_map(|(direction, fire)| PlayerInput { direction, fire })
    }

    /// A player input timeline.
    pub fn arb_input_timeline(max_len: usize) -> impl Strategy<Value = Vec<PlayerInput>> {
        proptest::collection::vec(arb_player_input(), 0..max_len)
    }

    /// Random layout rows of `width` x `height` glyphs.
    pub fn arb_layout(width: usize, height: usize) -> impl Strategy<Value = Vec<String>> {
        proptest::collection::vec(
            proptest::collection::vec(arb_tile_kind(), width)
                .prop_map(|row| row.into_iter().map(TileKind::glyph).collect::<String>()),
            height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{arena_sim, empty_sim, scripted_step};
    use proptest::prelude::*;
    use tanks_core::components::{AiArchetype, PlayerInput};
    use tanks_core::grid::TileCoord;
    use tanks_core::math::ratio;

    fn plain_step(sim: &mut Simulation) {
        sim.tick(ratio(1, 60));
    }

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_empty_simulation_determinism() {
        assert!(verify_simulation_determinism(|| empty_sim(8, 8), plain_step, 100));
    }

    #[test]
    fn test_arena_determinism() {
        let result = verify_determinism(3, 600, || arena_sim(42), scripted_step, |sim: &Simulation| {
            sim.state_hash()
        });
        result.assert_deterministic();
    }

    #[test]
    fn test_find_divergence_on_deterministic_sim() {
        assert_eq!(find_first_divergence(|| arena_sim(3), scripted_step, 300), None);
    }

    #[test]
    fn test_hash_trace_starts_with_initial_state() {
        let trace = hash_trace(|| arena_sim(5), scripted_step, 10);
        assert_eq!(trace.len(), 11);
        assert_eq!(trace[0], arena_sim(5).state_hash());
    }

    #[test]
    fn test_divergence_is_located() {
        use std::cell::Cell;

        // Calls 1..=50 are the first run; the second run double-steps
        // from its 21st tick on.
        let calls = Cell::new(0u64);
        let step = |sim: &mut Simulation| {
            calls.set(calls.get() + 1);
            scripted_step(sim);
            if calls.get() > 70 {
                sim.tick(ratio(1, 60));
            }
        };
        assert_eq!(find_first_divergence(|| arena_sim(3), step, 50), Some(21));
    }

    #[test]
    fn test_different_seeds_diverge() {
        assert_ne!(arena_sim(1).state_hash(), arena_sim(2).state_hash());
    }

    #[test]
    fn test_parallel_arena_simulations() {
        run_parallel_simulations(|| arena_sim(9), scripted_step, 4, 300).assert_deterministic();
    }

    proptest! {
        /// Arbitrary input timelines replay identically.
        #[test]
        fn prop_input_timelines_are_deterministic(
            timeline in strategies::arb_input_timeline(120),
            seed in any::<u64>(),
        ) {
            let setup = || {
                let mut sim = empty_sim(10, 10);
                sim.spawn_player(TileCoord::new(2, 8));
                sim.spawn_ai(AiArchetype::Fast, TileCoord::new(7, 1), seed);
                sim
            };
            let run = |inputs: &[PlayerInput]| {
                let mut sim = setup();
                for input in inputs {
                    if let Some(player) = sim.player_id() {
                        sim.set_player_input(player, *input).unwrap();
                    }
                    sim.tick(ratio(1, 60));
                }
                sim.state_hash()
            };
            prop_assert_eq!(run(&timeline), run(&timeline));
        }
    }
}
