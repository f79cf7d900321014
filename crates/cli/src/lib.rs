//! ocirel - publish build-release archives to OCI registries and fetch them back
//!
//! The binary is a thin shell over this library: [`cli`] defines the argument
//! surface and error reporting, [`commands`] validates arguments into typed
//! configuration and drives [`ocirel_oci`], and [`tracing`] sets up logging.

// CLI output goes to stdout/stderr on purpose
#![allow(clippy::print_stdout, clippy::print_stderr)]

/// CLI argument parsing, errors and exit codes.
pub mod cli;
/// Command implementations (upload, download, login, logout).
pub mod commands;
/// Tracing and logging configuration.
pub mod tracing;
