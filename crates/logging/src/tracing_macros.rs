//! crates/logging/src/tracing_macros.rs
//! Convenience macros for subsystem tracing.
//!
//! These macros wrap the standard tracing macros with the target of each
//! subsystem. Synchronization and store events carry lifecycle information
//! and log at `info`; patch and query events are chatty and log at `debug`.

/// Emit a synchronization loop trace.
///
/// # Example
/// ```ignore
/// trace_sync!(source = %source, delay_secs = 60, "cycle failed");
/// ```
#[macro_export]
macro_rules! trace_sync {
    ($($arg:tt)*) => {
        ::tracing::info!(target: "symdex::sync", $($arg)*);
    };
}

/// Emit a synchronization warning. Used for failures caught at the loop
/// boundary.
///
/// # Example
/// ```ignore
/// warn_sync!(error = %err, "full download failed");
/// ```
#[macro_export]
macro_rules! warn_sync {
    ($($arg:tt)*) => {
        ::tracing::warn!(target: "symdex::sync", $($arg)*);
    };
}

/// Emit a snapshot store trace.
///
/// # Example
/// ```ignore
/// trace_store!(path = %path.display(), bytes = len, "snapshot persisted");
/// ```
#[macro_export]
macro_rules! trace_store {
    ($($arg:tt)*) => {
        ::tracing::info!(target: "symdex::store", $($arg)*);
    };
}

/// Emit a patch application trace.
///
/// # Example
/// ```ignore
/// trace_delta!("applied patch: {} tokens", count);
/// ```
#[macro_export]
macro_rules! trace_delta {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "symdex::delta", $($arg)*);
    };
}

/// Emit a query or index publication trace.
///
/// # Example
/// ```ignore
/// trace_query!(version = %version, "index installed");
/// ```
#[macro_export]
macro_rules! trace_query {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "symdex::query", $($arg)*);
    };
}

/// Emit a registry trace.
///
/// # Example
/// ```ignore
/// trace_registry!(source = %source, "sync loop started");
/// ```
#[macro_export]
macro_rules! trace_registry {
    ($($arg:tt)*) => {
        ::tracing::info!(target: "symdex::registry", $($arg)*);
    };
}
