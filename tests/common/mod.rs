#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing,
    dead_code
)]
//! Shared test utilities for cinema booking client integration tests.
//!
//! Provides an in-memory [`MockGateway`] that records every call and can be
//! scripted to fail, a [`FlakyStore`] whose storage operations can be made to
//! fail, plus fixture builders for showtimes, seats, food items, and payment
//! details.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use cinema_booking_client::models::{
    CreateReservationRequest, Credentials, FoodCategory, FoodItem, FoodLineItem, FoodOrder,
    FoodOrderRequest, LoginResponse, Movie, MovieDetails, PaymentDetails, PaymentRequest,
    Registration, Reservation, Seat, SeatStatus, Showtime, Theater, TicketRecord, User,
};
use cinema_booking_client::{BookingError, DraftStore, Gateway, MemoryStore, Money};

// ── MockGateway ─────────────────────────────────────────────────────

/// An in-memory backend for integration testing.
///
/// Every trait call is recorded by name in `calls`. Reservation totals are
/// computed from the fixture showtime's price, the way the real backend does.
pub struct MockGateway {
    /// Names of the gateway methods called, in order.
    pub calls: Arc<StdMutex<Vec<String>>>,
    /// Last credential handed to `set_credential`.
    pub credential: Arc<StdMutex<Option<String>>>,
    showtime: Showtime,
    seats: StdMutex<Vec<Seat>>,
    reservations: StdMutex<HashMap<String, Reservation>>,
    next_id: AtomicU32,
    fail_create: AtomicU32,
    fail_pay: AtomicU32,
    fail_logout: AtomicBool,
    reject_me: AtomicBool,
}

impl MockGateway {
    /// Create a gateway serving `showtime` and a 2x4 seat map (A1..B4).
    pub fn new(showtime: Showtime) -> Self {
        Self {
            calls: Arc::new(StdMutex::new(Vec::new())),
            credential: Arc::new(StdMutex::new(None)),
            showtime,
            seats: StdMutex::new(seat_map()),
            reservations: StdMutex::new(HashMap::new()),
            next_id: AtomicU32::new(1),
            fail_create: AtomicU32::new(0),
            fail_pay: AtomicU32::new(0),
            fail_logout: AtomicBool::new(false),
            reject_me: AtomicBool::new(false),
        }
    }

    /// Fail the next `n` reservation requests with a 503.
    pub fn fail_next_creates(&self, n: u32) {
        self.fail_create.store(n, Ordering::SeqCst);
    }

    /// Fail the next `n` payment requests with a 402.
    pub fn fail_next_payments(&self, n: u32) {
        self.fail_pay.store(n, Ordering::SeqCst);
    }

    /// Make `logout` fail with a transport error.
    pub fn fail_logout(&self) {
        self.fail_logout.store(true, Ordering::SeqCst);
    }

    /// Make `me` answer 401.
    pub fn reject_credentials(&self) {
        self.reject_me.store(true, Ordering::SeqCst);
    }

    /// Mark a seat as taken by another customer.
    pub fn take_seat(&self, seat_id: &str) {
        let mut seats = self.seats.lock().unwrap();
        if let Some(seat) = seats.iter_mut().find(|s| s.id == seat_id) {
            seat.status = SeatStatus::Taken;
        }
    }

    /// Number of recorded calls to `method`.
    pub fn count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == method)
            .count()
    }

    /// Snapshot of recorded calls.
    pub fn recorded(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// A stored reservation.
    pub fn reservation(&self, id: &str) -> Option<Reservation> {
        self.reservations.lock().unwrap().get(id).cloned()
    }

    fn record(&self, method: &str) {
        self.calls.lock().unwrap().push(method.to_string());
    }

    fn take_failure(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

fn not_found(what: &str) -> BookingError {
    BookingError::Http {
        status: 404,
        message: format!("{what} not found"),
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn list_movies(&self) -> Result<Vec<Movie>, BookingError> {
        self.record("list_movies");
        Ok(vec![movie()])
    }

    async fn get_movie(&self, id: &str) -> Result<Movie, BookingError> {
        self.record("get_movie");
        Some(movie()).filter(|m| m.id == id).ok_or_else(|| not_found("movie"))
    }

    async fn get_movie_details(&self, _id: &str) -> Result<MovieDetails, BookingError> {
        self.record("get_movie_details");
        Err(not_found("details"))
    }

    async fn list_theaters(&self) -> Result<Vec<Theater>, BookingError> {
        self.record("list_theaters");
        Ok(vec![])
    }

    async fn get_theater(&self, _id: &str) -> Result<Theater, BookingError> {
        self.record("get_theater");
        Err(not_found("theater"))
    }

    async fn list_showtimes(&self, _movie_id: Option<&str>) -> Result<Vec<Showtime>, BookingError> {
        self.record("list_showtimes");
        Ok(vec![self.showtime.clone()])
    }

    async fn get_showtime(&self, id: &str) -> Result<Showtime, BookingError> {
        self.record("get_showtime");
        Some(self.showtime.clone())
            .filter(|s| s.id == id)
            .ok_or_else(|| not_found("showtime"))
    }

    async fn list_seats(&self, _showtime_id: &str) -> Result<Vec<Seat>, BookingError> {
        self.record("list_seats");
        Ok(self.seats.lock().unwrap().clone())
    }

    async fn create_reservation(
        &self,
        request: &CreateReservationRequest,
    ) -> Result<Reservation, BookingError> {
        self.record("create_reservation");
        if Self::take_failure(&self.fail_create) {
            return Err(BookingError::Http {
                status: 503,
                message: "Service Unavailable".into(),
            });
        }

        let base = self.showtime.price;
        let tickets: Vec<TicketRecord> = request
            .tickets
            .iter()
            .map(|t| TicketRecord {
                seat_id: Some(t.seat_id.clone()),
                row: t.seat_id.chars().take(1).collect(),
                number: t.seat_id.get(1..).and_then(|n| n.parse().ok()).unwrap_or(0),
                ticket_type: t.ticket_type,
                price: t.ticket_type.price(base),
            })
            .collect();
        let food: Money = request.food_items.iter().map(FoodLineItem::subtotal).sum();
        let total = tickets.iter().map(|t| t.price).sum::<Money>() + food;

        let id = format!("r-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let reservation = Reservation {
            id: id.clone(),
            showtime_id: Some(request.showtime_id.clone()),
            user_id: Some(request.user_id.clone()),
            paid: false,
            total,
            tickets,
            food_items: Some(request.food_items.clone()),
            delivery_type: request.delivery_type,
            created_at: Some(t0()),
        };
        self.reservations
            .lock()
            .unwrap()
            .insert(id, reservation.clone());
        Ok(reservation)
    }

    async fn get_reservation(&self, id: &str) -> Result<Reservation, BookingError> {
        self.record("get_reservation");
        self.reservation(id).ok_or_else(|| not_found("reservation"))
    }

    async fn pay_reservation(
        &self,
        id: &str,
        payment: &PaymentRequest,
    ) -> Result<Reservation, BookingError> {
        self.record("pay_reservation");
        if Self::take_failure(&self.fail_pay) {
            return Err(BookingError::Http {
                status: 402,
                message: "card declined".into(),
            });
        }
        let mut reservations = self.reservations.lock().unwrap();
        let reservation = reservations
            .get_mut(id)
            .ok_or_else(|| not_found("reservation"))?;
        if payment.amount != reservation.total {
            return Err(BookingError::Http {
                status: 400,
                message: "amount mismatch".into(),
            });
        }
        reservation.paid = true;
        Ok(reservation.clone())
    }

    async fn cancel_reservation(&self, id: &str) -> Result<(), BookingError> {
        self.record("cancel_reservation");
        self.reservations
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found("reservation"))
    }

    async fn list_user_reservations(&self, user_id: &str) -> Result<Vec<Reservation>, BookingError> {
        self.record("list_user_reservations");
        Ok(self
            .reservations
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.user_id.as_deref() == Some(user_id))
            .cloned()
            .collect())
    }

    async fn list_food_categories(&self) -> Result<Vec<FoodCategory>, BookingError> {
        self.record("list_food_categories");
        Ok(vec![FoodCategory {
            id: "snacks".into(),
            name: "Snacks".into(),
        }])
    }

    async fn list_food_items(&self, _category_id: Option<&str>) -> Result<Vec<FoodItem>, BookingError> {
        self.record("list_food_items");
        Ok(vec![popcorn(), soda()])
    }

    async fn create_food_order(&self, request: &FoodOrderRequest) -> Result<FoodOrder, BookingError> {
        self.record("create_food_order");
        Ok(FoodOrder {
            id: "fo-1".into(),
            reservation_id: Some(request.reservation_id.clone()),
            items: request.items.clone(),
            delivery_type: request.delivery_type,
            total: request.items.iter().map(FoodLineItem::subtotal).sum(),
            status: Some("pending".into()),
        })
    }

    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, BookingError> {
        self.record("login");
        if credentials.password != "correct horse" {
            return Err(BookingError::Http {
                status: 401,
                message: "invalid credentials".into(),
            });
        }
        Ok(LoginResponse {
            user: user(),
            token: Some("tok-1".into()),
        })
    }

    async fn logout(&self) -> Result<(), BookingError> {
        self.record("logout");
        if self.fail_logout.load(Ordering::SeqCst) {
            return Err(BookingError::Transport("connection reset".into()));
        }
        Ok(())
    }

    async fn me(&self) -> Result<User, BookingError> {
        self.record("me");
        if self.reject_me.load(Ordering::SeqCst) {
            return Err(BookingError::Http {
                status: 401,
                message: "Unauthorized".into(),
            });
        }
        Ok(user())
    }

    async fn register(&self, registration: &Registration) -> Result<LoginResponse, BookingError> {
        self.record("register");
        Ok(LoginResponse {
            user: User {
                id: "u-2".into(),
                username: registration.username.clone(),
                email: Some(registration.email.clone()),
                role: Some("customer".into()),
            },
            token: Some("tok-2".into()),
        })
    }

    async fn set_credential(&self, token: Option<String>) {
        *self.credential.lock().unwrap() = token;
    }
}

// ── FlakyStore ──────────────────────────────────────────────────────

/// A [`MemoryStore`] whose operations can be scripted to fail.
///
/// Failures are counted per operation kind; `go_offline` fails everything
/// until `go_online`.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_get: AtomicU32,
    fail_set: AtomicU32,
    fail_remove: AtomicU32,
    offline: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` reads.
    pub fn fail_next_gets(&self, n: u32) {
        self.fail_get.store(n, Ordering::SeqCst);
    }

    /// Fail the next `n` writes.
    pub fn fail_next_sets(&self, n: u32) {
        self.fail_set.store(n, Ordering::SeqCst);
    }

    /// Fail the next `n` deletes.
    pub fn fail_next_removes(&self, n: u32) {
        self.fail_remove.store(n, Ordering::SeqCst);
    }

    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn go_online(&self) {
        self.offline.store(false, Ordering::SeqCst);
    }

    /// Returns `true` if `key` is present, bypassing scripted failures.
    pub async fn contains(&self, key: &str) -> bool {
        self.inner.contains(key).await
    }

    fn check(&self, counter: &AtomicU32, op: &str, key: &str) -> Result<(), BookingError> {
        if self.offline.load(Ordering::SeqCst) || MockGateway::take_failure(counter) {
            return Err(BookingError::Storage(format!("{op} {key}: storage unavailable")));
        }
        Ok(())
    }
}

#[async_trait]
impl DraftStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<String>, BookingError> {
        self.check(&self.fail_get, "get", key)?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), BookingError> {
        self.check(&self.fail_set, "set", key)?;
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), BookingError> {
        self.check(&self.fail_remove, "remove", key)?;
        self.inner.remove(key).await
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

/// Fixed reference instant used by the tests.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 18, 0, 0).unwrap()
}

/// A showtime with the given base price.
pub fn showtime(price_cents: i64) -> Showtime {
    Showtime {
        id: "st-42".into(),
        movie_id: "m-7".into(),
        theater_id: "t-1".into(),
        screen: Some("5".into()),
        start_time: Utc.with_ymd_and_hms(2026, 3, 14, 20, 30, 0).unwrap(),
        price: Money::from_cents(price_cents),
    }
}

/// Rows A and B, seats 1 to 4, all available.
pub fn seat_map() -> Vec<Seat> {
    ["A", "B"]
        .iter()
        .flat_map(|row| {
            (1..=4).map(move |number| Seat {
                id: format!("{row}{number}"),
                row: (*row).to_string(),
                number,
                status: SeatStatus::Available,
            })
        })
        .collect()
}

pub fn movie() -> Movie {
    Movie {
        id: "m-7".into(),
        title: "The Long Intermission".into(),
        description: None,
        duration_minutes: Some(128),
        genre: Some("Drama".into()),
        rating: Some("PG-13".into()),
        poster_url: None,
        release_date: None,
    }
}

pub fn user() -> User {
    User {
        id: "u-1".into(),
        username: "ada".into(),
        email: Some("ada@example.com".into()),
        role: Some("customer".into()),
    }
}

pub fn popcorn() -> FoodItem {
    FoodItem {
        id: "popcorn".into(),
        name: "Large Popcorn".into(),
        price: Money::from_cents(650),
        category_id: Some("snacks".into()),
        description: None,
        available: true,
    }
}

pub fn soda() -> FoodItem {
    FoodItem {
        id: "soda".into(),
        name: "Soda".into(),
        price: Money::from_cents(425),
        category_id: Some("snacks".into()),
        description: None,
        available: true,
    }
}

/// Card details that pass local validation at [`t0`].
pub fn valid_card() -> PaymentDetails {
    PaymentDetails {
        cardholder_name: "Ada Lovelace".into(),
        card_number: "4111 1111 1111 1111".into(),
        expiry_month: 9,
        expiry_year: 2029,
        cvv: "737".into(),
    }
}
