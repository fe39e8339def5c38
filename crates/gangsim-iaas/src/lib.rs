//! Gang migration simulation.
//!
//! Models the migration of groups of interdependent virtual machines between
//! physical hosts as single batched operations: a placement policy selects
//! destination hosts under resource constraints and in-flight reservations,
//! and a batch coordinator reserves capacity, computes migration durations
//! (live vs non-live), admits whole sub-batches atomically and resolves their
//! completion after the simulated delay.

pub mod core;
pub mod simulation;
