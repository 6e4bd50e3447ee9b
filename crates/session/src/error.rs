use std::fmt;

use crate::capture::CaptureError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Camera could not be acquired; the session did not start.
    Capture(CaptureError),
    /// `start` while a scan is already running.
    AlreadyScanning,
    /// Operation only valid while scanning.
    NotScanning,
    /// Operation only valid once a scan has completed.
    NotCompleted,
    /// Feedback for an id that is neither missing nor extra.
    UnknownEntry(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Capture(e) => write!(f, "cannot start scan: {e}"),
            Self::AlreadyScanning => write!(f, "a scan is already in progress"),
            Self::NotScanning => write!(f, "no scan in progress"),
            Self::NotCompleted => write!(f, "scan has not completed"),
            Self::UnknownEntry(id) => write!(f, "no missing or extra entry with id '{id}'"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Capture(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CaptureError> for SessionError {
    fn from(e: CaptureError) -> Self {
        Self::Capture(e)
    }
}
