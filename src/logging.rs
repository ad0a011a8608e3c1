/// Conditional logging for development builds
///
/// The `dev_log!` macro provides informational logging that is compiled out
/// in production (release) builds by default. Errors and warnings should keep
/// using `leptos::logging::error!` and `leptos::logging::warn!` directly.
///
/// Logging is enabled when either:
/// - Building in debug mode (`cfg(debug_assertions)`)
/// - The `console_logging` feature is explicitly enabled
///
/// # Examples
///
/// ```rust
/// use train_reveal::dev_log;
///
/// let train_id = "2150";
/// dev_log!("Selected train {}", train_id);
/// ```
/// Conditionally log in development builds
///
/// Expands to `leptos::logging::log!`, which writes to the browser console on
/// wasm and to stdout elsewhere. In production release builds it compiles to
/// nothing.
#[macro_export]
macro_rules! dev_log {
    ($($arg:tt)+) => {
        #[cfg(any(debug_assertions, feature = "console_logging"))]
        {
            leptos::logging::log!($($arg)+);
        }
    };
}

pub use dev_log;
