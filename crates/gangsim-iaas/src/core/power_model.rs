//! Physical host power consumption models.

use dyn_clone::{clone_trait_object, DynClone};

/// Power model is a function, which computes the power consumption of a physical host
/// based on its current CPU utilization.
pub trait PowerModel: DynClone {
    /// Returns the power consumption in watts for the given CPU utilization in `[0, 1]`.
    fn get_power(&self, utilization: f64) -> f64;
}

clone_trait_object!(PowerModel);

/// Linear power model.
///
/// Computes host power consumption as `static_power + (max_power - static_power) * utilization`.
#[derive(Clone)]
pub struct LinearPowerModel {
    max_power: f64,
    static_power: f64,
}

impl LinearPowerModel {
    /// Creates linear power model.
    /// - `max_power` - host power when CPU is fully utilized.
    /// - `static_power` - host power when CPU is idle.
    pub fn new(max_power: f64, static_power: f64) -> Self {
        Self { max_power, static_power }
    }
}

impl PowerModel for LinearPowerModel {
    fn get_power(&self, utilization: f64) -> f64 {
        self.static_power + (self.max_power - self.static_power) * utilization.clamp(0., 1.)
    }
}

/// Power model which always returns the same value regardless of the utilization.
#[derive(Clone)]
pub struct ConstantPowerModel {
    power: f64,
}

impl ConstantPowerModel {
    pub fn new(power: f64) -> Self {
        Self { power }
    }
}

impl PowerModel for ConstantPowerModel {
    fn get_power(&self, _utilization: f64) -> f64 {
        self.power
    }
}
