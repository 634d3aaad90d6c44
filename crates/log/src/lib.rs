//! A simple logging library for the needs of Endless City.
//!
//! Messages go to the standard error stream. The maximum verbosity is global and can be set
//! programmatically or from the `EC_LOG` environment variable.

use std::fmt::{self, Arguments};
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

mod std_impl;

/// A verbosity level for a [`Message`].
///
/// # Remarks
///
/// The ordering of the verbosity levels is in *increasing verbosity*, meaning that
/// [`Error`] is the *least verbose*, and [`Trace`] is the *most verbose*.
///
/// This is useful for filtering messages based on their verbosity level.
///
/// [`Error`]: Verbosity::Error
/// [`Trace`]: Verbosity::Trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Verbosity {
    /// A situation that prevents at least part of the program from working correctly.
    Error,
    /// Something the program recovered from by itself, but which may indicate that something
    /// is wrong.
    Warning,
    /// Information that is useful most of the time.
    Info,
    /// Debugging information, not useful for the end-user.
    Trace,
}

impl Verbosity {
    fn from_u8(x: u8) -> Self {
        match x {
            0 => Self::Error,
            1 => Self::Warning,
            2 => Self::Info,
            _ => Self::Trace,
        }
    }
}

/// The error returned when parsing an unknown [`Verbosity`] name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVerbosity(pub String);

impl fmt::Display for UnknownVerbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown verbosity '{}' (expected error, warning, info or trace)",
            self.0
        )
    }
}

impl std::error::Error for UnknownVerbosity {}

impl FromStr for Verbosity {
    type Err = UnknownVerbosity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warning" | "warn" => Ok(Self::Warning),
            "info" => Ok(Self::Info),
            "trace" | "debug" => Ok(Self::Trace),
            _ => Err(UnknownVerbosity(s.to_owned())),
        }
    }
}

/// The most verbose level that is currently printed.
static MAX_VERBOSITY: AtomicU8 = AtomicU8::new(Verbosity::Info as u8);

/// Sets the most verbose level that will be printed.
pub fn set_max_verbosity(verbosity: Verbosity) {
    MAX_VERBOSITY.store(verbosity as u8, Ordering::Relaxed);
}

/// Returns the most verbose level that is currently printed.
#[inline]
pub fn max_verbosity() -> Verbosity {
    Verbosity::from_u8(MAX_VERBOSITY.load(Ordering::Relaxed))
}

/// Returns whether messages of the provided verbosity are currently printed.
#[inline]
pub fn enabled(verbosity: Verbosity) -> bool {
    verbosity <= max_verbosity()
}

/// Reads the maximum verbosity from the `EC_LOG` environment variable.
///
/// When the variable is absent, the current level is kept. When it holds an unknown value, a
/// warning is logged and the current level is kept.
pub fn init_from_env() {
    let Ok(value) = std::env::var("EC_LOG") else {
        return;
    };

    match value.parse() {
        Ok(verbosity) => set_max_verbosity(verbosity),
        Err(err) => crate::warning!("EC_LOG: {err}"),
    }
}

/// A message that can be logged.
pub struct Message<'a> {
    /// The name of the file in which the message was logged.
    pub file: &'static str,
    /// The line at which the message was logged.
    pub line: u32,
    /// The verbosity level of the message.
    pub verbosity: Verbosity,
    /// The module in which the message was logged.
    pub module: &'static str,
    /// The message itself.
    pub message: Arguments<'a>,
}

impl<'a> Message<'a> {
    /// Logs this message, unless its verbosity is filtered out.
    pub fn log(self) {
        if enabled(self.verbosity) {
            std_impl::log(self);
        }
    }
}

/// Creates a [`Message`] instance with the current invoking location.
#[macro_export]
macro_rules! message {
    ($verbosity:expr, $($args:tt)*) => {
        $crate::Message {
            file: ::core::file!(),
            line: ::core::line!(),
            verbosity: $verbosity,
            module: ::core::module_path!(),
            message: ::core::format_args!($($args)*),
        }
    };
}

/// Logs a message with the current invoking location.
///
/// # Remarks
///
/// This macro is basically equivalent to calling [`Message::log`] on the result of
/// [`message!`].
#[macro_export]
macro_rules! log {
    ($verbosity:expr, $($args:tt)*) => {
        $crate::Message::log($crate::message!($verbosity, $($args)*))
    };
}

/// Logs a message with a verbosity level of [`Verbosity::Error`].
#[macro_export]
macro_rules! error {
    ($($args:tt)*) => {
        $crate::log!($crate::Verbosity::Error, $($args)*)
    };
}

/// Logs a message with a verbosity level of [`Verbosity::Warning`].
#[macro_export]
macro_rules! warning {
    ($($args:tt)*) => {
        $crate::log!($crate::Verbosity::Warning, $($args)*)
    };
}

/// Logs a message with a verbosity level of [`Verbosity::Info`].
#[macro_export]
macro_rules! info {
    ($($args:tt)*) => {
        $crate::log!($crate::Verbosity::Info, $($args)*)
    };
}

/// Logs a message with a verbosity level of [`Verbosity::Trace`].
#[macro_export]
macro_rules! trace {
    ($($args:tt)*) => {
        $crate::log!($crate::Verbosity::Trace, $($args)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_verbosity() {
        assert_eq!("info".parse::<Verbosity>(), Ok(Verbosity::Info));
        assert_eq!(" WARN ".parse::<Verbosity>(), Ok(Verbosity::Warning));
        assert_eq!("debug".parse::<Verbosity>(), Ok(Verbosity::Trace));
        assert!("loud".parse::<Verbosity>().is_err());
    }

    #[test]
    fn ordering_matches_filtering() {
        assert!(Verbosity::Error < Verbosity::Warning);
        assert!(Verbosity::Info < Verbosity::Trace);
        for x in 0..4 {
            assert_eq!(Verbosity::from_u8(x) as u8, x);
        }
    }
}
