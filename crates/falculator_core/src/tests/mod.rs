//! Integration tests for the simulation engine
//!
//! Tests are organized by topic:
//! - `sanitize` - normalization pipeline, invariants, legacy migration
//! - `triggers` - value triggers, tag predicates, composite conditions
//! - `simulation` - end-to-end scenarios (interest, payoff, transfers,
//!   overdraw, determinism)
//! - `persistence` - JSON format, legacy enum integers, round-trips

mod simulation;
mod triggers;
