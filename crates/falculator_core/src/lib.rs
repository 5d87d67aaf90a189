//! Falculator: a deterministic, discrete-time financial simulator.
//!
//! A [`config::Config`] describes a portfolio of financial items
//! (incomes, expenses, savings, assets, liabilities, loans, shares,
//! credit cards) plus the triggers and events that move money between
//! them. The [`simulation::Simulator`] advances a simulated clock in
//! fixed steps and emits an immutable [`model::SimFrame`] per tick.
//!
//! The engine is strictly sequential and bit-reproducible: identical
//! configs produce identical frame sequences. All money math is exact
//! decimal arithmetic; there are no stochastic inputs.
//!
//! ```ignore
//! use falculator_core::config::Config;
//! use falculator_core::simulation::Simulator;
//!
//! let (mut config, report) = falculator_core::io::load_config(path)?;
//! assert!(!report.has_fatal());
//! let mut sim = Simulator::new(config)?;
//! while let Some(frame) = sim.tick() {
//!     let (done, total) = sim.progress();
//!     // render frame, report progress...
//! }
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod date_math;
pub mod error;
pub mod io;
pub mod logging;
pub mod money;
pub mod sanitize;
pub mod simulation;
pub mod simulation_state;
pub mod taxes;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod config;
pub mod model;

mod serde_util;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use config::{Config, StepIncrement};
pub use error::{SanitizeError, SimulatorError};
pub use logging::{DebugLogger, LogLevel};
pub use model::{
    AmountFreq, AmountSchedule, EventItem, FinancialItem, ItemId, ItemType, SimEvent, SimFrame,
    TriggerConditions, ValueTrigger,
};
pub use sanitize::SanitizeReport;
pub use simulation::Simulator;
pub use taxes::TaxMode;
