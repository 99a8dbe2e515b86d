pub mod auth;
pub mod health;
pub mod holidays;
pub mod import;
pub mod pending;
pub mod presets;
pub mod schedule;
pub mod staff;
