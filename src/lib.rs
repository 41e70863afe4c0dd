//! Bookshelf application library
//!
//! Hosts the application modules and the bootstrap that wires them to storage and HTTP.

pub mod app;
pub mod modules;

pub use modules::*;
