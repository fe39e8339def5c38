//! Events and their delivery order.

use std::cmp::Ordering;

use downcast_rs::{impl_downcast, Downcast};
use serde::ser::Serialize;

/// Identifier of a simulation component, assigned sequentially at registration.
pub type Id = u32;

/// Identifier of an event, assigned sequentially at creation.
pub type EventId = u64;

/// Payload carried by an event.
///
/// Implemented automatically for every serializable type. The receiving
/// handler recovers the concrete payload type by downcasting, usually through
/// the [`cast!`](crate::cast!) macro.
pub trait EventData: Downcast + erased_serde::Serialize {}

impl_downcast!(EventData);

erased_serde::serialize_trait_object!(EventData);

impl<T: Serialize + 'static> EventData for T {}

/// A payload queued for delivery to a component at a point of simulated time.
pub struct Event {
    pub id: EventId,
    /// Simulated time of delivery.
    pub time: f64,
    pub src: Id,
    pub dest: Id,
    pub data: Box<dyn EventData>,
}

impl Eq for Event {}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

// Comparison is reversed so that BinaryHeap pops the earliest event first;
// equal times fall back to the id, i.e. to insertion order.
impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        other.time.total_cmp(&self.time).then(other.id.cmp(&self.id))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
