use std::collections::{BinaryHeap, HashSet};

use rand::prelude::*;
use rand_pcg::Pcg64;

use crate::event::{Event, EventData, EventId, Id};

/// Clock, event queue and random source shared by all components of one
/// simulation.
pub struct SimulationCore {
    clock: f64,
    events: BinaryHeap<Event>,
    canceled: HashSet<EventId>,
    created_events: u64,
    rand: Pcg64,
}

impl SimulationCore {
    pub fn new(seed: u64) -> Self {
        Self {
            clock: 0.,
            events: BinaryHeap::new(),
            canceled: HashSet::new(),
            created_events: 0,
            rand: Pcg64::seed_from_u64(seed),
        }
    }

    pub fn time(&self) -> f64 {
        self.clock
    }

    pub fn rand(&mut self) -> f64 {
        self.rand.gen_range(0.0..1.0)
    }

    pub fn add_event<T>(&mut self, data: T, src: Id, dest: Id, delay: f64) -> EventId
    where
        T: EventData,
    {
        assert!(delay >= 0., "cannot add event with negative delay {}", delay);
        let id = self.created_events;
        self.created_events += 1;
        self.events.push(Event {
            id,
            time: self.clock + delay,
            src,
            dest,
            data: Box::new(data),
        });
        id
    }

    /// Pops the earliest pending event and advances the clock to its time.
    pub fn next_event(&mut self) -> Option<Event> {
        while let Some(event) = self.events.pop() {
            if self.canceled.remove(&event.id) {
                continue;
            }
            self.clock = event.time;
            return Some(event);
        }
        None
    }

    /// Returns the delivery time of the earliest pending event without
    /// advancing the clock.
    pub fn next_event_time(&mut self) -> Option<f64> {
        while let Some(event) = self.events.peek() {
            if !self.canceled.contains(&event.id) {
                return Some(event.time);
            }
            let id = event.id;
            self.events.pop();
            self.canceled.remove(&id);
        }
        None
    }

    pub fn cancel_event(&mut self, id: EventId) {
        self.canceled.insert(id);
    }

    pub fn event_count(&self) -> u64 {
        self.created_events
    }
}
