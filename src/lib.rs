//! # Cinema Booking Client
//!
//! Async client library for a movie-theater ticketing backend.
//!
//! The crate coordinates a multi-step checkout (seat selection, concessions,
//! payment) between a locally persisted booking draft and the reservation
//! held by the backend. The backend and the device storage are both reached
//! through traits, so the booking logic runs unchanged against the built-in
//! HTTP gateway, an in-memory test double, or any custom implementation.
//!
//! ## Features
//!
//! - **Backend-agnostic**: implement [`Gateway`] for any backend
//! - **HTTP built-in**: the default `gateway-http` feature provides [`HttpGateway`]
//! - **Resumable**: drafts survive restarts via [`DraftStore`] and expire after 30 minutes
//! - **Guest checkout**: guests pay in one step and keep their tickets on the device
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cinema_booking_client::{
//!     BookingOrchestrator, ClientConfig, FileStore, HttpGateway, Session, TicketType,
//! };
//!
//! let config = ClientConfig::from_env()?;
//! let gateway = Arc::new(HttpGateway::new(&config)?);
//! let store = Arc::new(FileStore::open("./storage").await?);
//! let session = Session::new(gateway.clone(), store.clone());
//! session.restore().await;
//!
//! let mut booking = BookingOrchestrator::new(gateway.clone(), store, session.identity().await, config);
//! booking.set_showtime(gateway.get_showtime("42").await?);
//! booking.load_seats().await?;
//! booking.toggle_seat("A1")?;
//! booking.set_ticket_type("A1", TicketType::Child);
//! let receipt = booking.checkout(&payment).await?;
//! ```

pub mod cart;
pub mod clock;
pub mod concessions;
pub mod config;
pub mod draft;
pub mod error;
pub mod error_class;
pub mod gateway;
pub mod gateways;
pub mod guest;
pub mod models;
pub mod money;
pub mod orchestrator;
pub mod preferences;
pub mod session;
pub mod store;
pub mod stores;

// Re-export primary types for ergonomic imports.
pub use cart::FoodLines;
pub use clock::{Clock, ManualClock, SystemClock};
pub use concessions::{ConcessionOrder, ConcessionReceipt};
pub use config::ClientConfig;
pub use draft::{BookingDraft, StoredDraft};
pub use error::{BookingError, Result};
pub use error_class::ErrorClass;
pub use gateway::Gateway;
pub use guest::GuestLedger;
pub use models::{
    DeliveryType, FoodItem, FoodLineItem, PaymentDetails, Reservation, Seat, SeatStatus, Showtime,
    TicketSelection, TicketType,
};
pub use money::Money;
pub use orchestrator::{BookingOrchestrator, BookingReceipt, BookingStage, LoadOutcome, SeatToggle};
pub use preferences::{ColorScheme, Preferences, Role};
pub use session::{BookingIdentity, Session};
pub use store::DraftStore;
pub use stores::{FileStore, MemoryStore};

#[cfg(feature = "gateway-http")]
pub use gateways::HttpGateway;
