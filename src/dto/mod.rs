//! DTOs that bridge services with templates and the JSON API.

pub mod customers;
pub mod dashboard;
pub mod resources;
pub mod settings;
