//! Unwrap helpers with good error messages.
//!
//! These replace `unwrap()` and `expect()` in test code, with
//! `#[track_caller]` so a failure points at the calling test.

use std::fmt::Debug;

/// Unwrap a `Result`, panicking with the error value on `Err`.
///
/// # Example
///
/// ```rust
/// use pacer_engine::EngineConfig;
/// use pacer_test_helpers::must;
///
/// let config = must(EngineConfig::builder().limit_hz(30.0).build());
/// assert_eq!(config.limit_hz, Some(30.0));
/// ```
///
/// # Panics
///
/// Panics if the result is `Err`, with a message including the error value.
#[track_caller]
pub fn must<T, E: Debug>(result: Result<T, E>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("must: unexpected Err: {e:?}"),
    }
}

/// Unwrap an `Option`, panicking with `msg` if `None`.
///
/// # Panics
///
/// Panics if the option is `None`, with the provided message.
#[track_caller]
pub fn must_some<T>(option: Option<T>, msg: &str) -> T {
    match option {
        Some(v) => v,
        None => panic!("must_some: {msg}"),
    }
}

/// Unwrap a `Result` with a context message.
///
/// # Panics
///
/// Panics if the result is `Err`, with the context and error value.
#[track_caller]
pub fn must_with<T, E: Debug>(result: Result<T, E>, context: &str) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("must_with: {context}: {e:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pacer_engine::EngineError;

    #[test]
    fn test_must_ok() {
        let result: Result<i32, EngineError> = Ok(42);
        assert_eq!(must(result), 42);
    }

    #[test]
    #[should_panic(expected = "must: unexpected Err: Disposed")]
    fn test_must_err() {
        let result: Result<i32, EngineError> = Err(EngineError::Disposed);
        let _ = must(result);
    }

    #[test]
    fn test_must_some_present() {
        assert_eq!(must_some(Some(60_u32), "expected limit"), 60);
    }

    #[test]
    #[should_panic(expected = "must_some: expected limit")]
    fn test_must_some_none() {
        let option: Option<f64> = None;
        let _ = must_some(option, "expected limit");
    }

    #[test]
    #[should_panic(expected = "must_with: building engine: InvalidLimit")]
    fn test_must_with_err() {
        let result: Result<(), EngineError> = Err(EngineError::invalid_limit(-1.0));
        must_with(result, "building engine");
    }
}
