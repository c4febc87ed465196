//! Failure reasons for remote values.

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use crate::defect::Cause;
use crate::meta::Tag;
use crate::tagged::Tagged;

/// Why a [`RemoteValue`](super::RemoteValue) did not produce a value.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteError {
    /// Nobody settled the value before the configured timeout.
    Timeout {
        /// The configured delay.
        after: Duration,
    },
    /// Settled with [`RemoteValue::fail`](super::RemoteValue::fail).
    Failed(Cause),
}

impl RemoteError {
    /// Whether this is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, RemoteError::Timeout { .. })
    }
}

impl Tagged for RemoteError {
    fn tag(&self) -> Tag {
        match self {
            RemoteError::Timeout { .. } => "Timeout",
            RemoteError::Failed(_) => "RemoteFailed",
        }
    }

    fn variants() -> &'static [Tag] {
        &["Timeout", "RemoteFailed"]
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::Timeout { after } => {
                write!(f, "remote value not settled within {:?}", after)
            }
            RemoteError::Failed(cause) => write!(f, "remote value failed: {}", cause),
        }
    }
}

impl StdError for RemoteError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            RemoteError::Timeout { .. } => None,
            RemoteError::Failed(cause) => Some(cause),
        }
    }
}
