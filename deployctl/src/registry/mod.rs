//! Container registry verification

pub mod challenge;
pub mod client;
