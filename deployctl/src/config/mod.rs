//! Deploy configuration

pub mod headers;
pub mod settings;
