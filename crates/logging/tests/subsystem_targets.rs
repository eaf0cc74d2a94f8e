//! Integration tests for subsystem macro targets and verbosity filtering.
//!
//! Test coverage:
//! 1. Each subsystem macro emits under its documented target
//! 2. Verbosity directives filter debug-level subsystems
//! 3. Subscriber installation is idempotent

use std::io;
use std::sync::{Arc, Mutex};

use logging::{
    InitOutcome, Subsystem, Verbosity, init_tracing, trace_delta, trace_query, trace_registry,
    trace_store, trace_sync, warn_sync,
};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().expect("capture lock").clone()).expect("utf8 output")
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("capture lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn with_capture(directive: &str, body: impl FnOnce()) -> String {
    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directive))
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_target(true)
        .finish();
    tracing::subscriber::with_default(subscriber, body);
    capture.contents()
}

// ============================================================================
// Targets
// ============================================================================

#[test]
fn macros_emit_under_subsystem_targets() {
    let output = with_capture(Verbosity::Trace.directive(), || {
        trace_sync!("sync event");
        warn_sync!("sync warning");
        trace_store!("store event");
        trace_delta!("delta event");
        trace_query!("query event");
        trace_registry!("registry event");
    });

    for subsystem in Subsystem::ALL {
        assert!(
            output.contains(subsystem.target()),
            "missing {subsystem} in {output}"
        );
    }
    assert!(output.contains("WARN"));
}

#[test]
fn structured_fields_are_rendered() {
    let output = with_capture("symdex=info", || {
        trace_sync!(source = "feed", delay_secs = 60u64, "cycle failed");
    });
    assert!(output.contains("source=\"feed\""));
    assert!(output.contains("delay_secs=60"));
}

// ============================================================================
// Verbosity filtering
// ============================================================================

#[test]
fn normal_verbosity_hides_debug_subsystems() {
    let output = with_capture(Verbosity::Normal.directive(), || {
        trace_sync!("visible");
        trace_delta!("hidden delta");
        trace_query!("hidden query");
    });
    assert!(output.contains("visible"));
    assert!(!output.contains("hidden"));
}

#[test]
fn quiet_verbosity_hides_lifecycle_events() {
    let output = with_capture(Verbosity::Quiet.directive(), || {
        trace_sync!("lifecycle");
        warn_sync!("warning");
    });
    assert!(output.is_empty(), "unexpected output: {output}");
}

// ============================================================================
// Installation
// ============================================================================

#[test]
fn init_tracing_is_idempotent() {
    let _ = init_tracing(Verbosity::Normal);
    assert_eq!(init_tracing(Verbosity::Debug), InitOutcome::AlreadyInstalled);
}
