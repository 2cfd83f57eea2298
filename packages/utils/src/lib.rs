//! A collection of utilities for the light client crates.

#![doc = include_str!("../README.md")]
#![deny(
    clippy::nursery,
    clippy::pedantic,
    warnings,
    missing_docs,
    unused_crate_dependencies
)]

#[cfg(test)]
use serde_json as _;

pub mod serde;

/// Ensure that a condition is true, otherwise return an error.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
}

#[cfg(test)]
mod tests {
    #[derive(Debug, PartialEq, Eq)]
    struct Rejected;

    fn guarded(value: u64) -> Result<u64, Rejected> {
        ensure!(value != 0, Rejected);
        Ok(value)
    }

    #[test]
    fn ensure_returns_error_on_false_condition() {
        assert_eq!(guarded(0), Err(Rejected));
        assert_eq!(guarded(7), Ok(7));
    }
}
