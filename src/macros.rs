//! Macros: call-site capture for the stats allocator, plus internal
//! logging shims.

/// Captures the current file, enclosing function, and line as a
/// [`CallSite`](crate::stats::CallSite).
///
/// # Examples
/// ```
/// use brickalloc::call_site;
///
/// let site = call_site!();
/// assert!(site.file.ends_with(".rs"));
/// ```
#[macro_export]
macro_rules! call_site {
    () => {{
        fn here() {}
        fn name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let function = name_of(here);
        let function = function.strip_suffix("::here").unwrap_or(function);
        $crate::stats::CallSite { file: file!(), function, line: line!() }
    }};
}

// Trace-level logging that compiles away when the `logging` feature is off.
macro_rules! trace_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "logging")]
        tracing::trace!($($arg)*);
    };
}

pub(crate) use trace_log;
