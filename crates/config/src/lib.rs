//! Configuration management for the iPXE distributor
//!
//! This crate parses and validates the boot document (images, nodes and the
//! default boot policy) and holds the process settings read from the
//! environment.

pub mod loader;
pub mod schema;
pub mod settings;
pub mod validation;

pub use loader::ConfigLoader;
pub use schema::*;
pub use settings::ServiceSettings;
pub use validation::*;
