// Linkvault shared type definitions
// Each submodule defines types used across the crate.

pub mod bookmark;
pub mod dedup;
pub mod errors;
