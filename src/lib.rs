//! UNDERCUT — Marketplace listing price monitor
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod error;
pub mod types;
pub mod marketplace;
pub mod notify;
pub mod engine;
