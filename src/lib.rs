//! # cbuild - Incremental C Build Driver
//!
//! cbuild orchestrates a C toolchain (compiler and archiver) to produce
//! object files, static libraries, and executables, reliably skipping any
//! unit of work whose inputs have not changed.
//!
//! ## Features
//!
//! - **Reliable skips**: timestamps plus the recorded command line are the
//!   fingerprint; a changed flag or a touched header forces a rebuild
//! - **Parallel compilation**: bounded by CPU count, first error cancels
//!   the rest of the batch
//! - **Accurate archives and links**: object lists are mapped from the
//!   source list, never globbed, so stale objects stay out
//! - **No project model**: every input arrives as a command parameter
//!
//! ## Quick Start
//!
//! ```bash
//! # Compile a set of sources and link them
//! cb exe --cc cc --cfiles "src/main.c src/util.c" --objdir build --exe-path build/app
//!
//! # Re-running is a no-op until something changes
//! cb exe --cc cc --cfiles "src/main.c src/util.c" --objdir build --exe-path build/app
//! ```
//!
//! ## Module Organization
//!
//! - [`job`] - The closed set of build jobs
//! - [`compile`] - Single-source and parallel many-source compilation
//! - [`archive`] - Static library production
//! - [`link`] - Executable linking
//! - [`fresh`] - Freshness oracles for objects, libraries, and executables
//! - [`depfile`] - Make-style depfile reader
//! - [`exec`] - Bounded task groups, cancellation, process running

/// Encoded artifact names and path derivation.
pub mod artifact;

/// Static library job.
pub mod archive;

/// Compile jobs.
pub mod compile;

/// Make-style depfile reader.
pub mod depfile;

/// Error taxonomy.
pub mod error;

/// Bounded parallel execution and cancellation.
pub mod exec;

/// Freshness oracles.
pub mod fresh;

/// The closed set of build jobs.
pub mod job;

/// Executable link job.
pub mod link;

/// Process-wide verbose gate.
pub mod verbose;
