//! Shared test utilities for the png-proj workspace.
//!
//! This crate provides common testing infrastructure including:
//! - A scriptable in-process engine ([`FakeEngine`]) that materialises
//!   workspaces on disk the way the real engine does
//! - A source workspace fixture with its context file
//! - Temporary directory helpers
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{FakeEngine, SourceFixture};
//! ```

pub mod fake_engine;
pub mod fixtures;
pub mod paths;

// Re-export commonly used items at the crate root
pub use fake_engine::{FakeEngine, RecordedCall, CREATE_LOCATION, STRAY_FILE};
pub use fixtures::*;
pub use paths::*;
