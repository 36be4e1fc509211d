//! CLI command implementations.

pub mod join;
pub mod relay;
pub mod start;
pub mod vim_setup;
