//! Image resolution

pub mod descriptor;
pub mod git;
pub mod resolver;
pub mod tag_vars;
