//! Headless scenario runner for tank AI testing and CI verification.
//!
//! Loads a RON [`Scenario`], runs the deterministic simulation without
//! graphics and reports the outcome as JSON. This enables:
//!
//! - **AI testing**: Watch AI tanks play out a scripted engagement
//! - **CI verification**: Replay a scenario several times and compare
//!   per-tick state hashes
//!
//! # Output
//!
//! - **stdout**: The run summary or verification report (JSON)
//! - **stderr**: Logs (human-readable)
//!
//! # Example
//!
//! ```bash
//! # Run a scenario
//! cargo run -p tanks_headless -- run crates/tanks_headless/scenarios/arena.ron
//!
//! # Verify determinism
//! cargo run -p tanks_headless -- verify crates/tanks_headless/scenarios/arena.ron --runs 5
//! ```

pub mod runner;
pub mod scenario;

pub use runner::{run_scenario, verify_determinism, RunSummary, ScenarioRunner, VerifyReport};
pub use scenario::{Scenario, ScenarioError};
