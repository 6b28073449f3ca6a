//! core
//!
//! Core domain types and configuration for maintainerd.
//!
//! # Modules
//!
//! - [`identity`] - Canonical comparable form of maintainer identities
//! - [`types`] - Registry records: projects, maintainers, services, audit events
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing
//! - Nothing in `core` performs network I/O

pub mod config;
pub mod identity;
pub mod types;
