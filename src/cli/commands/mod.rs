//! Command implementations.

pub mod provision;
pub mod rebuild;
