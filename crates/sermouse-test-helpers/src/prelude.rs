//! Convenience re-exports for common test utilities.
//!
//! ```rust,ignore
//! use sermouse_test_helpers::prelude::*;
//! ```

pub use crate::fixtures::{PacketStream, packets};
pub use crate::must::{must, must_parse, must_some, must_with};
pub use crate::sync::wait_until;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
