//! # Guest Checkout Example
//!
//! Demonstrates a complete guest booking without a running backend:
//!
//! 1. Implement [`Gateway`] over in-process data (a tiny "box office")
//! 2. Select seats and ticket types, add concessions
//! 3. Save the draft and restore it in a second orchestrator, as after a restart
//! 4. Pay as a guest and read the ticket back from the on-device ledger
//!
//! ## Running
//!
//! ```sh
//! cargo run --example guest_checkout
//!
//! # Watch state transitions:
//! RUST_LOG=debug cargo run --example guest_checkout
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use cinema_booking_client::models::{
    CreateReservationRequest, Credentials, FoodCategory, FoodOrder, FoodOrderRequest,
    LoginResponse, Movie, MovieDetails, PaymentRequest, Registration, Reservation, Theater, User,
};
use cinema_booking_client::{
    BookingError, BookingIdentity, BookingOrchestrator, BookingReceipt, ClientConfig,
    DeliveryType, FoodItem, Gateway, MemoryStore, Money, PaymentDetails, Seat, SeatStatus,
    Showtime, TicketType,
};

// ── In-process backend ──────────────────────────────────────────────

/// Serves one showtime, one seat row, and a snack menu. Guests never reach
/// the reservation or auth endpoints, so those answer 404.
struct BoxOffice {
    showtime: Showtime,
}

impl BoxOffice {
    fn new() -> Self {
        Self {
            showtime: Showtime {
                id: "st-1".into(),
                movie_id: "m-1".into(),
                theater_id: "t-1".into(),
                screen: Some("2".into()),
                start_time: Utc::now() + Duration::hours(2),
                price: Money::from_cents(1500),
            },
        }
    }

    fn menu() -> Vec<FoodItem> {
        vec![
            FoodItem {
                id: "popcorn".into(),
                name: "Large Popcorn".into(),
                price: Money::from_cents(650),
                category_id: Some("snacks".into()),
                description: None,
                available: true,
            },
            FoodItem {
                id: "soda".into(),
                name: "Soda".into(),
                price: Money::from_cents(425),
                category_id: Some("drinks".into()),
                description: None,
                available: true,
            },
        ]
    }
}

fn closed() -> BookingError {
    BookingError::Http {
        status: 404,
        message: "not available at the box office".into(),
    }
}

#[async_trait]
impl Gateway for BoxOffice {
    async fn list_movies(&self) -> Result<Vec<Movie>, BookingError> {
        Ok(vec![Movie {
            id: "m-1".into(),
            title: "The Long Intermission".into(),
            description: None,
            duration_minutes: Some(128),
            genre: Some("Drama".into()),
            rating: None,
            poster_url: None,
            release_date: None,
        }])
    }

    async fn get_movie(&self, _id: &str) -> Result<Movie, BookingError> {
        Err(closed())
    }

    async fn get_movie_details(&self, _id: &str) -> Result<MovieDetails, BookingError> {
        Err(closed())
    }

    async fn list_theaters(&self) -> Result<Vec<Theater>, BookingError> {
        Ok(vec![])
    }

    async fn get_theater(&self, _id: &str) -> Result<Theater, BookingError> {
        Err(closed())
    }

    async fn list_showtimes(&self, _movie_id: Option<&str>) -> Result<Vec<Showtime>, BookingError> {
        Ok(vec![self.showtime.clone()])
    }

    async fn get_showtime(&self, _id: &str) -> Result<Showtime, BookingError> {
        Ok(self.showtime.clone())
    }

    async fn list_seats(&self, _showtime_id: &str) -> Result<Vec<Seat>, BookingError> {
        Ok((1..=6)
            .map(|number| Seat {
                id: format!("C{number}"),
                row: "C".into(),
                number,
                status: if number == 3 {
                    SeatStatus::Taken
                } else {
                    SeatStatus::Available
                },
            })
            .collect())
    }

    async fn create_reservation(
        &self,
        _request: &CreateReservationRequest,
    ) -> Result<Reservation, BookingError> {
        Err(closed())
    }

    async fn get_reservation(&self, _id: &str) -> Result<Reservation, BookingError> {
        Err(closed())
    }

    async fn pay_reservation(
        &self,
        _id: &str,
        _payment: &PaymentRequest,
    ) -> Result<Reservation, BookingError> {
        Err(closed())
    }

    async fn cancel_reservation(&self, _id: &str) -> Result<(), BookingError> {
        Err(closed())
    }

    async fn list_user_reservations(&self, _user_id: &str) -> Result<Vec<Reservation>, BookingError> {
        Ok(vec![])
    }

    async fn list_food_categories(&self) -> Result<Vec<FoodCategory>, BookingError> {
        Ok(vec![])
    }

    async fn list_food_items(&self, _category_id: Option<&str>) -> Result<Vec<FoodItem>, BookingError> {
        Ok(Self::menu())
    }

    async fn create_food_order(&self, _request: &FoodOrderRequest) -> Result<FoodOrder, BookingError> {
        Err(closed())
    }

    async fn login(&self, _credentials: &Credentials) -> Result<LoginResponse, BookingError> {
        Err(closed())
    }

    async fn logout(&self) -> Result<(), BookingError> {
        Ok(())
    }

    async fn me(&self) -> Result<User, BookingError> {
        Err(closed())
    }

    async fn register(&self, _registration: &Registration) -> Result<LoginResponse, BookingError> {
        Err(closed())
    }
}

// ── Walkthrough ─────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Logging ─────────────────────────────────────────────────────
    // Initialize tracing. Set `RUST_LOG=debug` for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let gateway = Arc::new(BoxOffice::new());
    let store = Arc::new(MemoryStore::new());
    let config = ClientConfig::new("http://box-office.local");

    // ── Seat selection ──────────────────────────────────────────────
    let mut booking = BookingOrchestrator::new(
        gateway.clone(),
        store.clone(),
        BookingIdentity::Guest,
        config.clone(),
    );
    let showtime = gateway
        .list_showtimes(None)
        .await?
        .into_iter()
        .next()
        .ok_or("box office has no showtimes")?;
    booking.set_showtime(showtime);
    booking.load_seats().await?;

    booking.toggle_seat("C1")?;
    booking.toggle_seat("C2")?;
    booking.set_ticket_type("C2", TicketType::Child);
    if let Err(e) = booking.toggle_seat("C3") {
        tracing::info!("C3 refused: {e}");
    }

    // ── Concessions ─────────────────────────────────────────────────
    for item in gateway.list_food_items(None).await? {
        booking.add_food_item(&item, 1);
    }
    booking.set_delivery_type(DeliveryType::ToSeat);
    tracing::info!("Running total: {}", booking.total());

    // ── Simulated restart ───────────────────────────────────────────
    booking.save_draft().await;
    let mut resumed = BookingOrchestrator::new(gateway, store, BookingIdentity::Guest, config);
    let outcome = resumed.load_draft().await;
    tracing::info!(?outcome, "Draft reloaded, total still {}", resumed.total());

    // ── Payment ─────────────────────────────────────────────────────
    let card = PaymentDetails {
        cardholder_name: "Ada Lovelace".into(),
        card_number: "4111 1111 1111 1111".into(),
        expiry_month: 12,
        expiry_year: 2099,
        cvv: "123".into(),
    };
    match resumed.checkout(&card).await? {
        BookingReceipt::Guest(ticket) => {
            tracing::info!(
                "Guest ticket #{} for {} seat(s), paid {}",
                ticket.id,
                ticket.tickets.len(),
                ticket.total
            );
        }
        BookingReceipt::Reservation(reservation) => {
            tracing::info!("Reservation {} paid", reservation.id);
        }
    }

    let history = resumed.guest_ledger().tickets().await;
    tracing::info!("{} guest ticket(s) stored on this device", history.len());
    Ok(())
}
