//! Configuration management for the relay server

mod loader;
mod schema;

pub use loader::ConfigLoader;
pub use schema::*;
