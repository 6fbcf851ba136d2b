//! EDACC daemon library.
//!
//! This library exposes internal modules for integration testing.
//! In production, `edacc` is used as a binary (main.rs).

pub mod assistant;
pub mod cli;
pub mod logging;
