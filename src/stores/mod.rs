//! [`DraftStore`](crate::DraftStore) implementations.
//!
//! | Store          | Backing                                  |
//! |----------------|------------------------------------------|
//! | [`MemoryStore`] | process memory, lost on exit            |
//! | [`FileStore`]   | one file per key under a directory      |
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), cinema_booking_client::BookingError> {
//! use cinema_booking_client::{DraftStore, FileStore};
//!
//! let store = FileStore::open("/var/lib/cinema-kiosk/storage").await?;
//! store.set("savedUsername", "ada".to_string()).await?;
//! assert_eq!(store.get("savedUsername").await?.as_deref(), Some("ada"));
//! # Ok(())
//! # }
//! ```

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;
