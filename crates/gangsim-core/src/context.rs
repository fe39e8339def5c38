//! Component-side access to the simulation.

use std::cell::RefCell;
use std::rc::Rc;

use crate::event::{EventData, EventId, Id};
use crate::state::SimulationCore;

/// Handle a component uses to read the clock, draw random numbers and queue
/// events for itself or for other components.
pub struct SimulationContext {
    id: Id,
    name: String,
    core: Rc<RefCell<SimulationCore>>,
    names: Rc<RefCell<Vec<String>>>,
}

impl SimulationContext {
    pub(crate) fn new(
        id: Id,
        name: &str,
        core: Rc<RefCell<SimulationCore>>,
        names: Rc<RefCell<Vec<String>>>,
    ) -> Self {
        Self {
            id,
            name: name.to_owned(),
            core,
            names,
        }
    }

    /// Identifier of the component owning this context.
    pub fn id(&self) -> Id {
        self.id
    }

    /// Name of the component owning this context.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current simulated time.
    pub fn time(&self) -> f64 {
        self.core.borrow().time()
    }

    /// Draws from the simulation-wide random source, uniformly over `[0, 1)`.
    pub fn rand(&mut self) -> f64 {
        self.core.borrow_mut().rand()
    }

    /// Queues an event for the specified destination after the given delay.
    pub fn emit<T>(&mut self, data: T, dest: Id, delay: f64) -> EventId
    where
        T: EventData,
    {
        self.core.borrow_mut().add_event(data, self.id, dest, delay)
    }

    /// Queues an event addressed back to this component after the given delay.
    pub fn emit_self<T>(&mut self, data: T, delay: f64) -> EventId
    where
        T: EventData,
    {
        self.core.borrow_mut().add_event(data, self.id, self.id, delay)
    }

    /// Cancels a pending event if it was not delivered yet.
    pub fn cancel_event(&mut self, id: EventId) {
        self.core.borrow_mut().cancel_event(id);
    }

    /// Resolves a component identifier to its registered name.
    pub fn lookup_name(&self, id: Id) -> String {
        self.names.borrow()[id as usize].clone()
    }
}
