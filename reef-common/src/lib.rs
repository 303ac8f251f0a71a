//! Shared primitives used by all `reef` crates.
//!
//! This crate is intentionally minimal and dependency-light, so it can sit at the bottom of the
//! dependency graph.

pub mod config;
pub mod error;
pub mod telemetry;
