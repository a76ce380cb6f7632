//! Shared primitives used by all `kvmock` crates.
//!
//! This crate stays dependency-light so it can sit at the bottom of the dependency graph.

pub mod config;
pub mod error;
pub mod ids;
