//! # Shiftboard Core
//!
//! Domain types and business rules for the call-center shift planner. Nothing in
//! this crate touches the database or the network, so every rule can be exercised
//! directly from tests.

pub mod approval;
pub mod contrast;
pub mod errors;
pub mod import;
pub mod layers;
pub mod lockout;
pub mod models;
pub mod presets;
pub mod temp_presets;
pub mod timeline;
