//! Integration tests: full monitoring cycles against an in-memory
//! marketplace and notifier.

mod cycle;
