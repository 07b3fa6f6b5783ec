//! Configuration and lookup tables.

pub mod catalog;
pub mod config;
