//! # Browse and Book Example
//!
//! Demonstrates a signed-in booking against a real backend:
//!
//! 1. Build a [`ClientConfig`] from the environment and connect an [`HttpGateway`]
//! 2. Restore (or start) a session from a [`FileStore`]
//! 3. Browse movies and showtimes, pick the first two free seats
//! 4. Resume a saved draft if one is fresh, then reserve and pay
//!
//! ## Running
//!
//! ```sh
//! # Start the cinema backend on localhost:4000, then:
//! CINEMA_API_URL=http://localhost:4000/api \
//! CINEMA_USERNAME=ada CINEMA_PASSWORD=secret \
//!     cargo run --example browse_and_book
//! ```

use std::sync::Arc;

use cinema_booking_client::models::Credentials;
use cinema_booking_client::{
    BookingOrchestrator, BookingStage, ClientConfig, FileStore, Gateway, HttpGateway,
    LoadOutcome, PaymentDetails, SeatStatus, Session, TicketType,
};

/// Storage directory when `CINEMA_STORAGE_DIR` is not set.
const DEFAULT_STORAGE_DIR: &str = "./.cinema-storage";

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

    // ── Configuration ───────────────────────────────────────────────
    let config = ClientConfig::from_env()?;
    let storage_dir =
        std::env::var("CINEMA_STORAGE_DIR").unwrap_or_else(|_| DEFAULT_STORAGE_DIR.to_string());
    tracing::info!("Using backend {}", config.base_url);

    let gateway = Arc::new(HttpGateway::new(&config)?);
    let store = Arc::new(FileStore::open(&storage_dir).await?);

    // ── Session ─────────────────────────────────────────────────────
    let session = Session::new(gateway.clone(), store.clone());
    if session.restore().await.is_none() {
        let username = std::env::var("CINEMA_USERNAME")?;
        let password = std::env::var("CINEMA_PASSWORD")?;
        let user = session
            .login(&Credentials::new(username, password), true)
            .await?;
        tracing::info!("Signed in as {}", user.username);
    }

    // ── Resume or browse ────────────────────────────────────────────
    let mut booking = BookingOrchestrator::new(
        gateway.clone(),
        store,
        session.identity().await,
        config,
    );
    match booking.load_draft().await {
        LoadOutcome::Restored => tracing::info!("Resuming saved booking"),
        LoadOutcome::Expired => tracing::info!("Saved booking expired, starting over"),
        LoadOutcome::NotFound => {}
    }

    if booking.tickets().is_empty() {
        let movie = gateway
            .list_movies()
            .await?
            .into_iter()
            .next()
            .ok_or("no movies are showing")?;
        let showtime = gateway
            .list_showtimes(Some(&movie.id))
            .await?
            .into_iter()
            .next()
            .ok_or("no showtimes for this movie")?;
        tracing::info!("Booking '{}' at {}", movie.title, showtime.start_time);
        booking.set_showtime(showtime);
    }

    let released = booking.load_seats().await?;
    if !released.is_empty() {
        tracing::warn!("Seats {released:?} were taken while you were away");
    }

    if booking.stage() != BookingStage::ReservationCreated {
        let free: Vec<String> = booking
            .seats()
            .iter()
            .filter(|s| s.status == SeatStatus::Available)
            .take(2usize.saturating_sub(booking.tickets().len()))
            .map(|s| s.id.clone())
            .collect();
        for seat_id in &free {
            booking.toggle_seat(seat_id)?;
        }
        if let Some(last) = free.last() {
            booking.set_ticket_type(last, TicketType::Senior);
        }
    }
    booking.save_draft().await;
    tracing::info!("Total due: {}", booking.total());

    // ── Checkout ────────────────────────────────────────────────────
    let card = PaymentDetails {
        cardholder_name: "Ada Lovelace".into(),
        card_number: "4111 1111 1111 1111".into(),
        expiry_month: 12,
        expiry_year: 2099,
        cvv: "123".into(),
    };
    match booking.checkout(&card).await {
        Ok(receipt) => tracing::info!("Paid {}", receipt.total()),
        Err(e) => {
            tracing::error!("Checkout failed ({}): {e}", e.class());
            tracing::info!("{}", e.class().user_message());
        }
    }

    Ok(())
}
