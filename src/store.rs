//! Device key-value storage abstraction.
//!
//! The [`DraftStore`] trait is a plain string-to-string store, the shape of
//! mobile async storage or browser local storage. It offers no transactions;
//! each key has a single writer in this crate and every write is a full
//! overwrite.
//!
//! # Implementing a Custom Store
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use cinema_booking_client::error::BookingError;
//! use cinema_booking_client::store::DraftStore;
//!
//! struct KeychainStore { /* ... */ }
//!
//! #[async_trait]
//! impl DraftStore for KeychainStore {
//!     async fn get(&self, key: &str) -> Result<Option<String>, BookingError> {
//!         // Return the stored value, or None if the key is absent
//!         # unimplemented!()
//!     }
//!
//!     async fn set(&self, key: &str, value: String) -> Result<(), BookingError> {
//!         // Overwrite the value for `key`
//!         # unimplemented!()
//!     }
//!
//!     async fn remove(&self, key: &str) -> Result<(), BookingError> {
//!         // Delete `key`; removing a missing key is not an error
//!         # unimplemented!()
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::BookingError;

/// Storage keys used by this crate.
pub mod keys {
    /// Booking draft of an authenticated user.
    pub const BOOKING_PROGRESS: &str = "bookingProgress";
    /// Standalone concession cart.
    pub const FOOD_CART: &str = "foodCart";
    /// Delivery type of the standalone concession cart.
    pub const FOOD_DELIVERY_TYPE: &str = "foodDeliveryType";
    /// Booking draft of a guest.
    pub const GUEST_SELECTION: &str = "guestSelection";
    /// Guest purchase history.
    pub const GUEST_TICKETS: &str = "guestTickets";
    /// Guest concession history.
    pub const GUEST_FOOD_ORDERS: &str = "guestFoodOrders";
    /// Username remembered on the sign-in screen.
    pub const SAVED_USERNAME: &str = "savedUsername";
    /// Light/dark preference.
    pub const USER_COLOR_SCHEME: &str = "userColorScheme";
    /// Customer or staff mode.
    pub const SELECTED_ROLE: &str = "selectedRole";
    /// Identifier of the signed-in user.
    pub const USER_ID: &str = "userId";
    /// Username of the signed-in user.
    pub const USERNAME: &str = "username";
    /// Bearer token of the signed-in user, when the backend issues one.
    pub const AUTH_TOKEN: &str = "authToken";
}

/// A string key-value store on the device.
#[async_trait]
pub trait DraftStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Storage`] or [`BookingError::Io`] when the
    /// storage backend is unavailable.
    async fn get(&self, key: &str) -> Result<Option<String>, BookingError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Storage`] or [`BookingError::Io`] when the
    /// write fails.
    async fn set(&self, key: &str, value: String) -> Result<(), BookingError>;

    /// Delete `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Storage`] or [`BookingError::Io`] when the
    /// delete fails.
    async fn remove(&self, key: &str) -> Result<(), BookingError>;
}

/// Read and decode a JSON value.
pub(crate) async fn get_json<T: DeserializeOwned>(
    store: &dyn DraftStore,
    key: &str,
) -> Result<Option<T>, BookingError> {
    match store.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encode and write a JSON value.
pub(crate) async fn set_json<T: Serialize + ?Sized>(
    store: &dyn DraftStore,
    key: &str,
    value: &T,
) -> Result<(), BookingError> {
    let raw = serde_json::to_string(value)?;
    store.set(key, raw).await
}
