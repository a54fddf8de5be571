//! Command-line application

pub mod options;
pub mod prompt;
pub mod run;
