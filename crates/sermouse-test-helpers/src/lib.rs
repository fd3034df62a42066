//! Shared test utilities for the serial mouse crates.
//!
//! # Modules
//!
//! - [`mod@must`] - Unwrap helpers with good error messages and `#[track_caller]`
//! - [`fixtures`] - Canned packet streams for every protocol
//! - [`sync`] - Polling helpers for tests that complete on other threads
//! - [`prelude`] - Convenience re-exports
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! sermouse-test-helpers = { workspace = true }
//! ```
//!
//! ```rust,ignore
//! use sermouse_test_helpers::prelude::*;
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![allow(clippy::unwrap_used, clippy::panic)]

pub mod fixtures;
pub mod must;
pub mod prelude;
pub mod sync;

pub use must::{must, must_parse, must_some, must_with};
