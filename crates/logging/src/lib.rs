#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` carries the diagnostics plumbing shared by the symbol index
//! crates. Every crate logs through [`tracing`]; this crate fixes the event
//! targets each subsystem uses, provides one macro per subsystem so call
//! sites never spell a target by hand, and installs the process subscriber.
//!
//! # Design
//!
//! - [`Subsystem`] enumerates the emitting subsystems and maps each to its
//!   `symdex::*` target string.
//! - [`Verbosity`] turns a numeric verbosity level into an
//!   [`EnvFilter`](tracing_subscriber::EnvFilter) directive.
//! - [`init_tracing`] installs a fmt subscriber filtered by the
//!   [`LOG_ENV_VAR`] environment variable when present, falling back to the
//!   requested verbosity otherwise.
//!
//! # Invariants
//!
//! - Initialisation is idempotent: the second and later calls report
//!   [`InitOutcome::AlreadyInstalled`] instead of panicking, so embedders and
//!   tests may call it freely.
//!
//! # Examples
//!
//! ```
//! use logging::{Subsystem, Verbosity, trace_sync};
//!
//! assert_eq!(Subsystem::Sync.target(), "symdex::sync");
//! assert_eq!(Verbosity::from_verbose_level(2), Verbosity::Debug);
//!
//! // Without an installed subscriber this is a no-op.
//! trace_sync!(source = "nuget.org", "cycle finished");
//! ```

mod levels;
mod subscriber;
mod tracing_macros;

pub use levels::{Subsystem, Verbosity};
pub use subscriber::{InitOutcome, LOG_ENV_VAR, init_tracing, init_tracing_with_filter};
