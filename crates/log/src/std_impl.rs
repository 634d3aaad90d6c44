use std::io::Write;

use crate::{Message, Verbosity};

/// Logs a message to the standard error stream.
pub fn log(
    Message {
        file,
        line,
        verbosity,
        module,
        message,
    }: Message,
) {
    let prefix = match verbosity {
        Verbosity::Error => "\x1B[1;31mERROR\x1B[0m  ",
        Verbosity::Warning => "\x1B[1;33mWARNING\x1B[0m",
        Verbosity::Info => "\x1B[1;34mINFO\x1B[0m   ",
        Verbosity::Trace => "\x1B[1;30mTRACE\x1B[0m  ",
    };

    // Trace messages are noisy enough already; only they carry the module path.
    let _ = if verbosity == Verbosity::Trace {
        writeln!(
            std::io::stderr().lock(),
            "{prefix}{message} \x1B[2;90m({module}, {file}:{line})\x1B[0m"
        )
    } else {
        writeln!(
            std::io::stderr().lock(),
            "{prefix}{message} \x1B[2;90m(at {file}:{line})\x1B[0m"
        )
    };
}
