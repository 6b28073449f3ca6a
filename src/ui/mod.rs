//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! Diagnostics go through `tracing`; this module is for the results a
//! command reports to the operator.

pub mod output;
