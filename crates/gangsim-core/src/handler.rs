//! Consuming events in components.

use crate::event::Event;

/// Implemented by components that receive events.
pub trait EventHandler {
    /// Reacts to a single delivered event.
    fn on(&mut self, event: Event);
}

/// Dispatches an event to one of several typed match arms by downcasting its
/// payload.
///
/// The arms do not have to cover every payload type reaching the component:
/// an event matching none of them is reported through the unhandled-event log
/// at `ERROR` level and dropped.
#[macro_export]
macro_rules! cast {
    ( match $event:ident.data { $( $type:ident { $($tt:tt)* } => { $($expr:tt)* } )+ } ) => {
        $(
            if $event.data.is::<$type>() {
                if let Ok(__payload) = $event.data.downcast::<$type>() {
                    let $type { $($tt)* } = *__payload;
                    $($expr)*
                }
            } else
        )*
        {
            $crate::log::log_unhandled_event($event);
        }
    }
}
