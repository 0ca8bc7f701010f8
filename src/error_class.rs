//! Coarse error classes used to decide how a failure reaches the user.
//!
//! Every [`BookingError`](crate::BookingError) maps to exactly one class. Screens
//! branch on the class rather than on individual variants: validation problems
//! are shown inline, request failures get a retry prompt, storage failures are
//! never shown, and stale drafts restart the flow at seat selection.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The four error families of the booking client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorClass {
    /// A required selection is missing. No network call was made.
    Validation,
    /// A backend request failed. Never retried automatically.
    Request,
    /// Device storage failed. Logged only.
    Storage,
    /// A stored draft outlived its time-to-live and was ignored.
    Stale,
}

impl ErrorClass {
    /// Returns a short message suitable for display to the guest.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Validation => "Please complete your selection before continuing.",
            Self::Request => "Something went wrong talking to the cinema. Please try again.",
            Self::Storage => "Your progress could not be saved on this device.",
            Self::Stale => "Your previous booking expired. Please choose your seats again.",
        }
    }

    /// Whether the user should be offered a retry action.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Request)
    }

    /// Whether the error should be surfaced to the user at all.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, Self::Storage)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validation => "validation",
            Self::Request => "request",
            Self::Storage => "storage",
            Self::Stale => "stale",
        };
        f.write_str(name)
    }
}
