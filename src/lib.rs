//! maintainerd
//!
//! Maintainer registry and FOSSA team reconciliation for CNCF projects.
//!
//! # Modules
//!
//! - [`core`] - identities, domain types, configuration
//! - [`reconcile`] - pure membership reconciliation
//! - [`store`] - SQLite maintainer registry
//! - [`fossa`] - membership provider trait, FOSSA client and mock
//! - [`bootstrap`] - worksheet ingestion and first-run seeding
//! - [`engine`] - reconciliation passes and invitations
//! - [`onboarding`] - GitHub webhook for FOSSA sign-up
//! - [`cli`] - command-line interface
//! - [`ui`] - user-facing output

pub mod bootstrap;
pub mod cli;
pub mod core;
pub mod engine;
pub mod fossa;
pub mod onboarding;
pub mod reconcile;
pub mod store;
pub mod ui;
