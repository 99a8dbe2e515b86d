pub mod audit;
pub mod auth;
pub mod contract;
pub mod import;
pub mod pending;
pub mod preset;
pub mod schedule;
pub mod staff;
