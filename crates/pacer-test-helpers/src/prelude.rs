//! Convenience re-exports for common test utilities.
//!
//! ```rust,ignore
//! use pacer_test_helpers::prelude::*;
//! ```

pub use crate::must::{must, must_some, must_with};
pub use crate::recorder::SignalRecorder;
pub use crate::timeline::{from_intervals, uniform};
pub use crate::{assert_approx_eq, assert_spaced_beyond};

/// Result type for tests that propagate errors with `?`.
pub type TestResult = Result<(), Box<dyn std::error::Error>>;
