//! JSON configuration for the demo tool.
pub mod demo;
