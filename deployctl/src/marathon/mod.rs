//! Marathon manifests and deployment

pub mod client;
pub mod manifest;
pub mod models;
pub mod validate;
