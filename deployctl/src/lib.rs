//! deployctl library
//!
//! Resolves image coordinates per environment, verifies them against their registries and
//! submits the rendered Marathon group.

pub mod app;
pub mod config;
pub mod errors;
pub mod filesys;
pub mod images;
pub mod logs;
pub mod marathon;
pub mod registry;
pub mod template;
pub mod utils;
