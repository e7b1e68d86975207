//! Logging abstraction
//!
//! Provides logging macros that work across the different builds:
//! - with the `defmt` feature: forwards to `defmt`
//! - host tests: uses `println!`/`eprintln!`
//! - firmware without `defmt`: no-op (the arguments are still type-checked)
//!
//! The sensor board has no serial console, so the macros compile to nothing
//! by default and logging costs no flash.

#[doc(hidden)]
#[macro_export]
macro_rules! __log {
    ($defmt:ident, $print:ident, $level:literal, $($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::$defmt!($($arg)*);

        #[cfg(all(not(feature = "defmt"), test))]
        $print!("[{}] {}", $level, format!($($arg)*));

        #[cfg(all(not(feature = "defmt"), not(test)))]
        let _ = format_args!($($arg)*);
    }};
}

/// Log error message
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => { $crate::__log!(error, eprintln, "ERROR", $($arg)*) };
}

/// Log warning message
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => { $crate::__log!(warn, println, "WARN", $($arg)*) };
}

/// Log informational message
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => { $crate::__log!(info, println, "INFO", $($arg)*) };
}

/// Log debug message
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => { $crate::__log!(debug, println, "DEBUG", $($arg)*) };
}

/// Log trace message
#[macro_export]
macro_rules! log_trace {
    ($($arg:tt)*) => { $crate::__log!(trace, println, "TRACE", $($arg)*) };
}
