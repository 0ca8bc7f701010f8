//! [`Gateway`](crate::Gateway) implementations.
//!
//! Concrete gateways live behind feature gates. Enable the corresponding
//! Cargo feature to pull one in:
//!
//! | Feature        | Gateway         |
//! |----------------|-----------------|
//! | `gateway-http` | [`HttpGateway`] |
//!
//! # Example
//!
//! ```rust,ignore
//! # async fn example() -> Result<(), cinema_booking_client::BookingError> {
//! use cinema_booking_client::{ClientConfig, Gateway, HttpGateway};
//!
//! let gateway = HttpGateway::new(&ClientConfig::new("http://localhost:4000/api"))?;
//! for movie in gateway.list_movies().await? {
//!     println!("{}", movie.title);
//! }
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "gateway-http")]
pub mod http;

#[cfg(feature = "gateway-http")]
pub use http::HttpGateway;
