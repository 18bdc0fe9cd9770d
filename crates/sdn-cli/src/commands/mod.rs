//! CLI commands

pub mod lifecycle;
pub mod schema;

pub use lifecycle::ZoneCommand;
pub use schema::SchemaCommand;
