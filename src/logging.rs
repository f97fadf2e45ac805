//! Logging macros
//!
//! With the `defmt` feature enabled the macros forward to `defmt`; otherwise
//! they compile to nothing while still type-checking their arguments. Format
//! strings must stick to plain `{}` placeholders so both paths accept them.

macro_rules! log_debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::debug!($($arg)*);
        #[cfg(not(feature = "defmt"))]
        {
            let _ = ::core::format_args!($($arg)*);
        }
    }};
}

macro_rules! log_info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::info!($($arg)*);
        #[cfg(not(feature = "defmt"))]
        {
            let _ = ::core::format_args!($($arg)*);
        }
    }};
}

macro_rules! log_warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::warn!($($arg)*);
        #[cfg(not(feature = "defmt"))]
        {
            let _ = ::core::format_args!($($arg)*);
        }
    }};
}

pub(crate) use log_debug;
pub(crate) use log_info;
pub(crate) use log_warn;
