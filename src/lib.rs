//! Crank library — re-exports internal modules for integration testing.
//!
//! Integration tests in `tests/` cannot access items from a binary crate.
//! This `lib.rs` creates a library target alongside the binary so that
//! `tests/interactive_flows.rs` can import `crank::menu::select::SelectMenu`,
//! drive it with scripted keys, and assert on captured frames.
//!
//! **All application logic lives in the module files (src/menu/, src/cancel.rs, …).**
//! This file merely makes those modules reachable to external test crates.

#![allow(dead_code)]

pub mod cancel;
pub mod cli;
pub mod config;
pub mod interrupt;
pub mod menu;
pub mod output;
pub mod prompt;
pub mod session;
pub mod term;
