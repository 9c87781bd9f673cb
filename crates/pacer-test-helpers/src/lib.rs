//! Shared test utilities for the pacer workspace.
//!
//! # Modules
//!
//! - [`mod@must`] - Unwrap helpers with good error messages and `#[track_caller]`
//! - [`assertions`] - Assertion macros for float and tick-timing checks
//! - [`recorder`] - [`SignalRecorder`], an ordered log of engine signals
//! - [`timeline`] - Frame timestamp builders for driving a `ManualHost`
//! - [`prelude`] - Convenience re-exports
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! pacer-test-helpers = { path = "crates/pacer-test-helpers" }
//! ```
//!
//! ```rust,ignore
//! use pacer_test_helpers::prelude::*;
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![allow(clippy::unwrap_used, clippy::panic)]

pub mod assertions;
pub mod must;
pub mod prelude;
pub mod recorder;
pub mod timeline;

pub use must::*;
pub use recorder::SignalRecorder;
