//! Simulation log output.
//!
//! Messages produced through the `log_*` macros are prefixed with the current
//! simulated time and the name of the component that emitted them, so one
//! combined log of a run reads as a timeline.

use atty::Stream;
use colored::{Color, ColoredString, Colorize};
use log::error;
use serde_json::json;
use serde_type_name::type_name;

use crate::event::Event;

/// Colors the level tag when the log goes to a console.
pub fn get_colored(s: &str, color: Color) -> ColoredString {
    if atty::is(Stream::Stderr) {
        s.color(color)
    } else {
        s.normal()
    }
}

// Shared body of the per-level logging macros below.
#[doc(hidden)]
#[macro_export]
macro_rules! __sim_log {
    ($level:ident, $tag:expr, $color:ident, $ctx:expr, $msg:expr) => (
        log::$level!(
            target: $ctx.name(),
            "[{:.3} {} {}] {}",
            $ctx.time(), $crate::log::get_colored($tag, $crate::colored::Color::$color), $ctx.name(), $msg
        )
    );
    ($level:ident, $tag:expr, $color:ident, $ctx:expr, $($arg:tt)+) => (
        log::$level!(
            target: $ctx.name(),
            "[{:.3} {} {}] {}",
            $ctx.time(), $crate::log::get_colored($tag, $crate::colored::Color::$color), $ctx.name(),
            format!($($arg)+)
        )
    );
}

/// Logs a message at the info level, prefixed with the simulated time and the
/// name of the component whose context is passed as the first argument.
///
/// The macros for the remaining levels differ only in the level tag.
#[macro_export]
macro_rules! log_info {
    ($ctx:expr, $($arg:tt)+) => ($crate::__sim_log!(info, "INFO ", Green, $ctx, $($arg)+));
}

/// Logs a message at the debug level.
#[macro_export]
macro_rules! log_debug {
    ($ctx:expr, $($arg:tt)+) => ($crate::__sim_log!(debug, "DEBUG", Blue, $ctx, $($arg)+));
}

/// Logs a message at the trace level.
#[macro_export]
macro_rules! log_trace {
    ($ctx:expr, $($arg:tt)+) => ($crate::__sim_log!(trace, "TRACE", Cyan, $ctx, $($arg)+));
}

/// Logs a message at the warn level.
#[macro_export]
macro_rules! log_warn {
    ($ctx:expr, $($arg:tt)+) => ($crate::__sim_log!(warn, "WARN ", Yellow, $ctx, $($arg)+));
}

/// Logs a message at the error level.
#[macro_export]
macro_rules! log_error {
    ($ctx:expr, $($arg:tt)+) => ($crate::__sim_log!(error, "ERROR", Red, $ctx, $($arg)+));
}

/// Reports an event whose payload matched no arm of a [`cast!`](crate::cast!)
/// dispatch.
pub fn log_unhandled_event(event: Event) {
    error!(
        target: "simulation",
        "[{:.3} {} simulation] Unhandled event: {}",
        event.time,
        get_colored("ERROR", Color::Red),
        json!({"type": type_name(&event.data).unwrap(), "data": event.data, "src": event.src, "dest": event.dest})
    );
}

/// Reports an event addressed to a component that has no handler installed.
pub(crate) fn log_undelivered_event(event: Event) {
    error!(
        target: "simulation",
        "[{:.3} {} simulation] Undelivered event: {}",
        event.time,
        get_colored("ERROR", Color::Red),
        json!({"type": type_name(&event.data).unwrap(), "data": event.data, "src": event.src, "dest": event.dest})
    );
}
