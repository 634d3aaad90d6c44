use std::panic::PanicInfo;

/// The custom panic hook.
///
/// Prints the panic message on the standard error, along with the thread that panicked. Worker
/// threads are named, so this tells whether the controlling thread or a prefetch worker failed.
fn custom_panic_hook(info: &PanicInfo) {
    // Get the panic message out of the payload.
    let mut message = info
        .payload()
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| info.payload().downcast_ref::<String>().map(String::as_str))
        .unwrap_or("no further information")
        .to_owned();

    if let Some(location) = info.location() {
        use std::fmt::Write;

        let _ = write!(
            message,
            " (at {}:{}:{})",
            location.file(),
            location.line(),
            location.column()
        );
    }

    let thread = std::thread::current();
    let thread = thread.name().unwrap_or("<unnamed>");

    use std::io::Write;
    let _ = writeln!(
        std::io::stderr(),
        "\x1B[1;31mpanic\x1B[0m in '{thread}': {message}"
    );
}

/// Installs the custom panic hook.
pub fn install_custom_panic_hook() {
    ec_log::trace!("installing custom panic hook...");
    std::panic::set_hook(Box::new(custom_panic_hook));
}
