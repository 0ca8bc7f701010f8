//! Backend abstraction for the cinema booking client.
//!
//! The [`Gateway`] trait is the async interface of the cinema backend's REST
//! API: catalog lookups, seat maps, reservations, concessions, and
//! authentication. Every method either resolves to a typed payload or fails
//! with a request-class [`BookingError`] (`Http`, `Transport`, or `Decode`).
//! Callers do not branch on status codes; any failure means "the operation
//! failed, offer a retry".
//!
//! Credential handling (cookie or bearer token) is the implementation's
//! concern. The built-in `HttpGateway` captures the token from
//! [`login`](Gateway::login) and attaches it to later calls.
//!
//! # Implementing a Custom Gateway
//!
//! Tests and offline demos usually implement the trait over in-memory data;
//! see `demos/guest_checkout.rs` for a complete example.

use async_trait::async_trait;

use crate::error::BookingError;
use crate::models::{
    CreateReservationRequest, Credentials, FoodCategory, FoodItem, FoodOrder, FoodOrderRequest,
    LoginResponse, Movie, MovieDetails, PaymentRequest, Registration, Reservation, Seat, Showtime,
    Theater, User,
};

/// Async interface of the cinema backend.
///
/// # Object Safety
///
/// This trait is object-safe; the orchestrator and session hold it as
/// `Arc<dyn Gateway>`.
#[async_trait]
pub trait Gateway: Send + Sync {
    // ── Movies ──────────────────────────────────────────────────────

    /// `GET /movies`.
    async fn list_movies(&self) -> Result<Vec<Movie>, BookingError>;

    /// `GET /movies/{id}`.
    async fn get_movie(&self, id: &str) -> Result<Movie, BookingError>;

    /// Extended metadata and trailer link from the movie metadata provider.
    async fn get_movie_details(&self, id: &str) -> Result<MovieDetails, BookingError>;

    // ── Theaters and showtimes ──────────────────────────────────────

    /// `GET /theaters`.
    async fn list_theaters(&self) -> Result<Vec<Theater>, BookingError>;

    /// `GET /theaters/{id}`.
    async fn get_theater(&self, id: &str) -> Result<Theater, BookingError>;

    /// `GET /showtimes`, optionally filtered by movie.
    async fn list_showtimes(&self, movie_id: Option<&str>) -> Result<Vec<Showtime>, BookingError>;

    /// `GET /showtimes/{id}`.
    async fn get_showtime(&self, id: &str) -> Result<Showtime, BookingError>;

    /// `GET /showtimes/{id}/seats`.
    async fn list_seats(&self, showtime_id: &str) -> Result<Vec<Seat>, BookingError>;

    // ── Reservations ────────────────────────────────────────────────

    /// Create an unpaid reservation holding the requested seats.
    async fn create_reservation(
        &self,
        request: &CreateReservationRequest,
    ) -> Result<Reservation, BookingError>;

    /// `GET /reservations/{id}`.
    async fn get_reservation(&self, id: &str) -> Result<Reservation, BookingError>;

    /// Pay for an existing reservation.
    async fn pay_reservation(
        &self,
        id: &str,
        payment: &PaymentRequest,
    ) -> Result<Reservation, BookingError>;

    /// Cancel a reservation, releasing its seats.
    async fn cancel_reservation(&self, id: &str) -> Result<(), BookingError>;

    /// All reservations belonging to a user.
    async fn list_user_reservations(&self, user_id: &str)
        -> Result<Vec<Reservation>, BookingError>;

    // ── Concessions ─────────────────────────────────────────────────

    /// `GET /concessions/categories`.
    async fn list_food_categories(&self) -> Result<Vec<FoodCategory>, BookingError>;

    /// `GET /concessions/items`, optionally filtered by category.
    async fn list_food_items(
        &self,
        category_id: Option<&str>,
    ) -> Result<Vec<FoodItem>, BookingError>;

    /// Place a concession order against a reservation.
    async fn create_food_order(&self, request: &FoodOrderRequest)
        -> Result<FoodOrder, BookingError>;

    // ── Authentication ──────────────────────────────────────────────

    /// Sign in. Implementations retain whatever credential the backend issues.
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, BookingError>;

    /// Sign out and drop any retained credential.
    async fn logout(&self) -> Result<(), BookingError>;

    /// The currently signed-in user.
    async fn me(&self) -> Result<User, BookingError>;

    /// Create an account and sign in.
    async fn register(&self, registration: &Registration) -> Result<LoginResponse, BookingError>;

    /// Re-attach a credential persisted from an earlier session.
    ///
    /// Gateways that rely on cookies or hold no credential can keep the
    /// default no-op.
    async fn set_credential(&self, _token: Option<String>) {}
}
