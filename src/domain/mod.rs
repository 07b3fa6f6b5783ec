//! Domain types shared by forms, services and the API client.

pub mod resource;
pub mod types;
pub mod user;
