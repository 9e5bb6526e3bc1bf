//! Integration test utilities for the sync engine
//!
//! This crate provides helpers for running end-to-end scenarios against an
//! in-process engine with paused tokio time.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
