//! Command implementations for the pacer CLI

pub mod config;
pub mod run;

pub use run::{Policy, RunArgs};
