// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types shared by every part of the harness.

use crate::browser::DriverError;
use thiserror::Error;

/// Errors raised by contexts, entities, the retry engine and the
/// configuration store.
#[derive(Error, Debug)]
pub enum Error {
    /// A programmer error: a subcontext used out of sequence, or a
    /// configuration file operation without a path.
    #[error("usage error: {0}")]
    Usage(&'static str),

    /// The "condition not met yet" signal understood by
    /// [`TryTimeout`](crate::retry::TryTimeout).
    #[error("try again")]
    TryAgain,

    /// Bounded retrying ran out of time.
    #[error("timeout reached")]
    TimedOut,

    #[error("config file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A REST response outside the `[200, 400)` status range.
    #[error("[{status}] {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("driver error: {0}")]
    Driver(#[from] DriverError),
}

/// Outcome of a failed [`TryTimeout`](crate::retry::TryTimeout) run.
///
/// Keeps the timeout distinguishable from whatever error type the retried
/// action uses.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RetryError<E> {
    #[error("timeout reached")]
    TimedOut,

    #[error("{0}")]
    Failed(E),
}

impl<E> RetryError<E> {
    pub fn is_timed_out(&self) -> bool {
        matches!(self, RetryError::TimedOut)
    }

    /// Returns the action's own error, if that is what stopped the retries.
    pub fn into_failed(self) -> Option<E> {
        match self {
            RetryError::TimedOut => None,
            RetryError::Failed(e) => Some(e),
        }
    }
}

impl From<RetryError<Error>> for Error {
    fn from(value: RetryError<Error>) -> Self {
        match value {
            RetryError::TimedOut => Error::TimedOut,
            RetryError::Failed(e) => e,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_error_flattens_into_error() {
        let timed_out: Error = RetryError::<Error>::TimedOut.into();
        assert!(matches!(timed_out, Error::TimedOut));

        let failed: Error = RetryError::Failed(Error::Usage("nope")).into();
        assert!(matches!(failed, Error::Usage("nope")));
    }

    #[test]
    fn messages() {
        assert_eq!(Error::TimedOut.to_string(), "timeout reached");
        assert_eq!(
            Error::Status {
                status: 404,
                body: "missing".to_string()
            }
            .to_string(),
            "[404] missing"
        );
        assert_eq!(RetryError::Failed("boom").to_string(), "boom");
        assert_eq!(
            Error::from(DriverError::StaleElement("//div".to_string())).to_string(),
            "driver error: stale element reference: //div"
        );
    }

    #[test]
    fn into_failed() {
        assert_eq!(RetryError::<&str>::TimedOut.into_failed(), None);
        assert_eq!(RetryError::Failed("boom").into_failed(), Some("boom"));
    }
}
