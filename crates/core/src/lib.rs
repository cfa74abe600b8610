//! Domain types for the map generator gateway.
//!
//! Everything in here is pure: parsing, validation and the settings to payload
//! transformation. Network and file-system access live in other crates.

pub mod domain;

pub use domain::*;
