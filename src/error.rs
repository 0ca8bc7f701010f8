//! Error types for the cinema booking client.

use thiserror::Error;

use crate::error_class::ErrorClass;

/// Errors that can occur when using the cinema booking client.
#[derive(Debug, Error)]
pub enum BookingError {
    /// An operation needs a bound showtime, but none was set.
    #[error("no showtime selected")]
    NoShowtime,

    /// An operation needs at least one selected seat.
    #[error("no seats selected")]
    NoSeatsSelected,

    /// The seat is taken according to the server and cannot be selected.
    #[error("seat {0} is not available")]
    SeatUnavailable(String),

    /// Payment was requested before a reservation exists.
    #[error("no reservation to pay for")]
    NoReservation,

    /// The operation needs an authenticated user.
    #[error("this operation requires a signed-in account")]
    AccountRequired,

    /// The payment form failed local validation.
    #[error("invalid payment details: {0}")]
    InvalidPayment(String),

    /// A concession order was submitted with no items.
    #[error("the food cart is empty")]
    EmptyCart,

    /// The backend answered with a non-success HTTP status.
    #[error("request failed with status {status}: {message}")]
    Http {
        /// HTTP status code returned by the backend.
        status: u16,
        /// Error message extracted from the response body, if any.
        message: String,
    },

    /// The request could not be delivered or the response could not be read.
    #[error("request failed: {0}")]
    Transport(String),

    /// The response body did not match the expected shape.
    #[error("unexpected response payload: {0}")]
    Decode(String),

    /// The device key-value storage failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Failed to serialize or deserialize a stored record.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The client configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl BookingError {
    /// Classify this error for user-facing handling.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NoShowtime
            | Self::NoSeatsSelected
            | Self::SeatUnavailable(_)
            | Self::NoReservation
            | Self::AccountRequired
            | Self::InvalidPayment(_)
            | Self::EmptyCart
            | Self::Config(_) => ErrorClass::Validation,
            Self::Http { .. } | Self::Transport(_) | Self::Decode(_) => ErrorClass::Request,
            Self::Storage(_) | Self::Serialization(_) | Self::Io(_) => ErrorClass::Storage,
        }
    }

    /// Returns `true` for errors raised before any network call was made.
    pub fn is_validation(&self) -> bool {
        self.class() == ErrorClass::Validation
    }

    /// Returns `true` for failed backend requests.
    pub fn is_request_failure(&self) -> bool {
        self.class() == ErrorClass::Request
    }

    /// The HTTP status carried by the error, if the backend produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A specialized [`Result`] type for cinema booking client operations.
pub type Result<T> = std::result::Result<T, BookingError>;
