//! Boot script resolution
//!
//! This crate answers boot requests: it maps an identity onto a node label,
//! the node onto an image, and assembles the final iPXE script from the
//! image body and the default boot policy.

pub mod engine;
pub mod script;

pub use engine::*;
pub use script::*;
