//! Shared types for SessionKeep: configuration, errors, diagnostics and
//! trace events.

pub mod clock;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod trace;
