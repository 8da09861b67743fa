// Global trace flag - set via environment variable SCHEMER_TRACE=1
pub(crate) static TRACE: std::sync::LazyLock<bool> =
    std::sync::LazyLock::new(|| std::env::var("SCHEMER_TRACE").is_ok());

macro_rules! debug_trace {
    ($($arg:tt)*) => {
        if *$crate::trace::TRACE {
            eprintln!("[SCHEMER TRACE] {}", format!($($arg)*));
        }
    };
}

pub(crate) use debug_trace;
