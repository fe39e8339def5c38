//! Simulation setup and the event loop.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::log_enabled;
use log::Level::Trace;
use serde_json::json;
use serde_type_name::type_name;

use crate::context::SimulationContext;
use crate::event::Id;
use crate::handler::EventHandler;
use crate::log::log_undelivered_event;
use crate::state::SimulationCore;

/// Owns the component registry and drives event delivery.
pub struct Simulation {
    core: Rc<RefCell<SimulationCore>>,
    name_to_id: HashMap<String, Id>,
    names: Rc<RefCell<Vec<String>>>,
    handlers: Vec<Option<Rc<RefCell<dyn EventHandler>>>>,
}

impl Simulation {
    /// Creates a simulation whose random source is seeded with the given value.
    pub fn new(seed: u64) -> Self {
        Self {
            core: Rc::new(RefCell::new(SimulationCore::new(seed))),
            name_to_id: HashMap::new(),
            names: Rc::new(RefCell::new(Vec::new())),
            handlers: Vec::new(),
        }
    }

    fn register(&mut self, name: &str) -> Id {
        if let Some(&id) = self.name_to_id.get(name) {
            return id;
        }
        let id = self.name_to_id.len() as Id;
        self.name_to_id.insert(name.to_owned(), id);
        self.names.borrow_mut().push(name.to_owned());
        self.handlers.push(None);
        id
    }

    /// Resolves a component identifier to its registered name.
    ///
    /// Panics if no component with such id exists.
    pub fn lookup_name(&self, id: Id) -> String {
        self.names.borrow()[id as usize].clone()
    }

    /// Registers a component name and returns a context bound to it.
    ///
    /// Identifiers are assigned sequentially starting from 0.
    pub fn create_context<S>(&mut self, name: S) -> SimulationContext
    where
        S: AsRef<str>,
    {
        SimulationContext::new(
            self.register(name.as_ref()),
            name.as_ref(),
            self.core.clone(),
            self.names.clone(),
        )
    }

    /// Installs the event handler implementation for the named component and
    /// returns the component id.
    ///
    /// The id assigned by an earlier `create_context` call for the same name
    /// is reused.
    pub fn add_handler<S>(&mut self, name: S, handler: Rc<RefCell<dyn EventHandler>>) -> Id
    where
        S: AsRef<str>,
    {
        let id = self.register(name.as_ref());
        self.handlers[id as usize] = Some(handler);
        id
    }

    /// Current simulated time.
    pub fn time(&self) -> f64 {
        self.core.borrow().time()
    }

    /// Draws from the simulation-wide random source, uniformly over `[0, 1)`.
    pub fn rand(&mut self) -> f64 {
        self.core.borrow_mut().rand()
    }

    /// Delivers the next pending event, advancing the clock to its time.
    ///
    /// An event addressed to a component without an installed handler is
    /// logged as undelivered and dropped. Returns whether a pending event was
    /// found, no matter how its delivery went.
    pub fn step(&mut self) -> bool {
        let next = self.core.borrow_mut().next_event();
        let event = match next {
            Some(event) => event,
            None => return false,
        };
        if log_enabled!(Trace) {
            let dest = self.lookup_name(event.dest);
            log::trace!(
                target: &dest,
                "[{:.3} {} {}] {}",
                event.time,
                crate::log::get_colored("EVENT", colored::Color::BrightBlack),
                dest,
                json!({"type": type_name(&event.data).unwrap(), "data": event.data, "src": self.lookup_name(event.src)})
            );
        }
        match self.handlers.get(event.dest as usize) {
            Some(Some(handler)) => handler.clone().borrow_mut().on(event),
            _ => log_undelivered_event(event),
        }
        true
    }

    /// Delivers up to `step_count` events.
    ///
    /// Returns whether there could be more pending events.
    pub fn steps(&mut self, step_count: u64) -> bool {
        for _ in 0..step_count {
            if !self.step() {
                return false;
            }
        }
        true
    }

    /// Delivers events until the queue is empty.
    pub fn step_until_no_events(&mut self) {
        while self.step() {}
    }

    /// Delivers all events due within `duration` from the current time.
    ///
    /// Returns whether events remain queued past that horizon.
    pub fn step_for_duration(&mut self, duration: f64) -> bool {
        let horizon = self.core.borrow().time() + duration;
        loop {
            let next_time = self.core.borrow_mut().next_event_time();
            match next_time {
                None => return false,
                Some(time) if time > horizon => return true,
                Some(_) => {
                    self.step();
                }
            }
        }
    }

    /// Total number of events created so far, including canceled ones.
    pub fn event_count(&self) -> u64 {
        self.core.borrow().event_count()
    }
}
