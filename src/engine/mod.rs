//! Core engine — the snapshot → decide → update loop.

pub mod monitor;
pub mod pricing;
pub mod snapshot;
