//! Linkvault — bookmark deduplication engine.
//!
//! Consumes bookmark rows and tag associations from a SQLite-backed record
//! store, discovers duplicate groups (exact key matches and approximate
//! similarity matches), and resolves each group into a single surviving
//! record with the rest archived.
//!
//! This library crate exposes all modules for use by automation layers and
//! integration tests.

pub mod database;
pub mod managers;
pub mod services;
pub mod types;
