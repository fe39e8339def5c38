//! Implementations of placement strategies.

pub mod best_fit;
pub mod brute_force;
pub mod first_fit;
pub mod power_aware_best_fit;
pub mod random;
pub mod round_robin;
pub mod worst_fit;
