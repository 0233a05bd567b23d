//! Logging macros
//!
//! The same call sites serve every target:
//! - `defmt` feature: forwarded to `defmt` (RTT or whatever transport the
//!   firmware links in)
//! - unit tests: printed to stdout/stderr
//! - otherwise: compiled out, arguments are still type-checked
//!
//! Format strings must stay within the subset both `defmt` and `core::fmt`
//! accept: plain `{}` placeholders.

#[doc(hidden)]
#[macro_export]
macro_rules! __log_sink {
    ($level:literal, $defmt:ident, $($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::$defmt!($($arg)*);

        #[cfg(all(not(feature = "defmt"), test))]
        println!("[{}] {}", $level, format!($($arg)*));

        #[cfg(all(not(feature = "defmt"), not(test)))]
        {
            let _ = format_args!($($arg)*);
        }
    }};
}

/// Log an informational message
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => { $crate::__log_sink!("INFO", info, $($arg)*) };
}

/// Log a warning
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => { $crate::__log_sink!("WARN", warn, $($arg)*) };
}

/// Log an error
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => { $crate::__log_sink!("ERROR", error, $($arg)*) };
}

/// Log a debug message
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => { $crate::__log_sink!("DEBUG", debug, $($arg)*) };
}
