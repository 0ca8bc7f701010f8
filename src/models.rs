//! Typed records for every backend resource and client-only booking record.
//!
//! Backend payloads are decoded into these types as soon as they arrive; no
//! untyped JSON travels past the gateway. Field names follow the backend's
//! camelCase JSON. Identifiers are accepted as either JSON strings or numbers
//! and normalized to strings.

use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BookingError, Result};
use crate::money::Money;

// ── Type aliases ────────────────────────────────────────────────────

/// Identifier of a movie.
pub type MovieId = String;

/// Identifier of a theater.
pub type TheaterId = String;

/// Identifier of a showtime.
pub type ShowtimeId = String;

/// Identifier of a seat within a showtime's seat map.
pub type SeatId = String;

/// Identifier of a server-side reservation.
pub type ReservationId = String;

/// Identifier of a concession item.
pub type FoodItemId = String;

/// Identifier of a concession category.
pub type FoodCategoryId = String;

/// Identifier of a concession order.
pub type FoodOrderId = String;

/// Identifier of an authenticated user.
pub type UserId = String;

// ── Identifier decoding ─────────────────────────────────────────────

mod lenient_id {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
    }

    impl From<Raw> for String {
        fn from(raw: Raw) -> Self {
            match raw {
                Raw::Text(text) => text,
                Raw::Int(n) => n.to_string(),
            }
        }
    }

    pub fn required<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Raw::deserialize(deserializer).map(String::from)
    }

    pub fn optional<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Option::<Raw>::deserialize(deserializer).map(|raw| raw.map(String::from))
    }
}

// ── Catalog ─────────────────────────────────────────────────────────

/// A movie in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    #[serde(deserialize_with = "lenient_id::required")]
    pub id: MovieId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Running time in minutes.
    #[serde(default, rename = "duration", skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
}

/// Extended movie metadata from the third-party provider, proxied by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(default)]
    pub cast: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailer_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f64>,
}

/// A theater location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theater {
    #[serde(deserialize_with = "lenient_id::required")]
    pub id: TheaterId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screens: Option<u32>,
}

/// A scheduled screening. Reference data: never mutated by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Showtime {
    #[serde(deserialize_with = "lenient_id::required")]
    pub id: ShowtimeId,
    #[serde(deserialize_with = "lenient_id::required")]
    pub movie_id: MovieId,
    #[serde(deserialize_with = "lenient_id::required")]
    pub theater_id: TheaterId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen: Option<String>,
    pub start_time: DateTime<Utc>,
    /// Base (adult) ticket price.
    pub price: Money,
}

// ── Seats and tickets ───────────────────────────────────────────────

/// Status of a seat in a showtime's seat map.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    #[default]
    Available,
    /// Chosen locally by this client (optimistic).
    Selected,
    /// Held or sold according to the server.
    #[serde(alias = "reserved", alias = "booked", alias = "occupied")]
    Taken,
}

/// A seat in a showtime's seat map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    #[serde(deserialize_with = "lenient_id::required")]
    pub id: SeatId,
    pub row: String,
    pub number: u32,
    #[serde(default)]
    pub status: SeatStatus,
}

impl Seat {
    /// Seat label such as `A12`.
    pub fn label(&self) -> String {
        format!("{}{}", self.row, self.number)
    }
}

/// Pricing category applied as a multiplier to the showtime's base price.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TicketType {
    #[default]
    Adult,
    Child,
    Senior,
}

impl TicketType {
    /// All ticket types, in display order.
    pub const ALL: [TicketType; 3] = [TicketType::Adult, TicketType::Child, TicketType::Senior];

    /// Price multiplier as a whole percentage of the base price.
    pub const fn multiplier_percent(self) -> u32 {
        match self {
            Self::Adult => 100,
            Self::Child => 75,
            Self::Senior => 80,
        }
    }

    /// Price multiplier as a fraction (Adult = 1.0, Child = 0.75, Senior = 0.80).
    pub fn multiplier(self) -> f64 {
        f64::from(self.multiplier_percent()) / 100.0
    }

    /// Ticket price for this type given a showtime base price.
    pub fn price(self, base: Money) -> Money {
        base.percent(self.multiplier_percent())
    }
}

impl fmt::Display for TicketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Adult => "Adult",
            Self::Child => "Child",
            Self::Senior => "Senior",
        };
        f.write_str(name)
    }
}

/// A selected seat together with its ticket type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketSelection {
    pub seat_id: SeatId,
    pub ticket_type: TicketType,
}

/// A ticket as recorded on a reservation or guest ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketRecord {
    #[serde(default, deserialize_with = "lenient_id::optional", skip_serializing_if = "Option::is_none")]
    pub seat_id: Option<SeatId>,
    pub row: String,
    pub number: u32,
    pub ticket_type: TicketType,
    pub price: Money,
}

// ── Concessions ─────────────────────────────────────────────────────

/// Whether concessions are collected at the counter or brought to the seat.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryType {
    #[default]
    Pickup,
    #[serde(alias = "toSeat", alias = "delivery")]
    ToSeat,
}

/// A concession category (popcorn, drinks, combos).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodCategory {
    #[serde(deserialize_with = "lenient_id::required")]
    pub id: FoodCategoryId,
    pub name: String,
}

/// A concession item offered for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItem {
    #[serde(deserialize_with = "lenient_id::required")]
    pub id: FoodItemId,
    pub name: String,
    pub price: Money,
    #[serde(default, deserialize_with = "lenient_id::optional", skip_serializing_if = "Option::is_none")]
    pub category_id: Option<FoodCategoryId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "available_by_default")]
    pub available: bool,
}

fn available_by_default() -> bool {
    true
}

/// A concession line in a cart: a name/price snapshot plus a quantity of at least one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodLineItem {
    #[serde(deserialize_with = "lenient_id::required")]
    pub item_id: FoodItemId,
    pub name: String,
    pub price: Money,
    pub quantity: u32,
}

impl FoodLineItem {
    /// `price * quantity`.
    pub fn subtotal(&self) -> Money {
        self.price * self.quantity
    }
}

/// Body of `POST /concessions/orders`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodOrderRequest {
    pub reservation_id: ReservationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub items: Vec<FoodLineItem>,
    pub delivery_type: DeliveryType,
}

/// A concession order as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodOrder {
    #[serde(deserialize_with = "lenient_id::required")]
    pub id: FoodOrderId,
    #[serde(default, deserialize_with = "lenient_id::optional", skip_serializing_if = "Option::is_none")]
    pub reservation_id: Option<ReservationId>,
    #[serde(default)]
    pub items: Vec<FoodLineItem>,
    #[serde(default)]
    pub delivery_type: DeliveryType,
    pub total: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

// ── Reservations and payment ────────────────────────────────────────

/// Body of `POST /reservations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationRequest {
    pub showtime_id: ShowtimeId,
    pub user_id: UserId,
    pub tickets: Vec<TicketSelection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub food_items: Vec<FoodLineItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_type: Option<DeliveryType>,
    /// Stable per-draft reference; repeated submissions of one draft carry the same value.
    pub client_reference: Uuid,
}

/// A reservation as returned by the backend. The client mirrors it and never recomputes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    #[serde(deserialize_with = "lenient_id::required")]
    pub id: ReservationId,
    #[serde(default, deserialize_with = "lenient_id::optional", skip_serializing_if = "Option::is_none")]
    pub showtime_id: Option<ShowtimeId>,
    #[serde(default, deserialize_with = "lenient_id::optional", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub paid: bool,
    pub total: Money,
    #[serde(default)]
    pub tickets: Vec<TicketRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food_items: Option<Vec<FoodLineItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_type: Option<DeliveryType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Card details entered on the payment screen.
#[derive(Clone, PartialEq, Eq)]
pub struct PaymentDetails {
    pub cardholder_name: String,
    pub card_number: String,
    pub expiry_month: u32,
    pub expiry_year: i32,
    pub cvv: String,
}

impl PaymentDetails {
    /// Check the form locally before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidPayment`] naming the first invalid field.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<()> {
        let digits: String = self
            .card_number
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();
        if self.cardholder_name.trim().is_empty() {
            return Err(BookingError::InvalidPayment("cardholder name is required".into()));
        }
        if !(12..=19).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(BookingError::InvalidPayment("card number is invalid".into()));
        }
        if !(1..=12).contains(&self.expiry_month) {
            return Err(BookingError::InvalidPayment("expiry month is invalid".into()));
        }
        if (self.expiry_year, self.expiry_month) < (now.year(), now.month()) {
            return Err(BookingError::InvalidPayment("card has expired".into()));
        }
        if !(3..=4).contains(&self.cvv.len()) || !self.cvv.chars().all(|c| c.is_ascii_digit()) {
            return Err(BookingError::InvalidPayment("security code is invalid".into()));
        }
        Ok(())
    }

    /// Last four digits of the card number.
    pub fn last_four(&self) -> String {
        let digits: Vec<char> = self.card_number.chars().filter(char::is_ascii_digit).collect();
        let start = digits.len().saturating_sub(4);
        digits.get(start..).unwrap_or_default().iter().collect()
    }
}

impl fmt::Debug for PaymentDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentDetails")
            .field("cardholder_name", &self.cardholder_name)
            .field("card_number", &format_args!("****{}", self.last_four()))
            .field("expiry_month", &self.expiry_month)
            .field("expiry_year", &self.expiry_year)
            .finish_non_exhaustive()
    }
}

/// Body of `POST /reservations/{id}/pay`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub amount: Money,
    pub payment_method: String,
    pub cardholder_name: String,
    pub card_last_four: String,
}

impl PaymentRequest {
    /// Build the request for a card payment of `amount`.
    pub fn card(details: &PaymentDetails, amount: Money) -> Self {
        Self {
            amount,
            payment_method: "card".into(),
            cardholder_name: details.cardholder_name.trim().to_string(),
            card_last_four: details.last_four(),
        }
    }
}

// ── Authentication ──────────────────────────────────────────────────

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(deserialize_with = "lenient_id::required")]
    pub id: UserId,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Body of `POST /auth/login`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Create credentials from a username and password.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of `POST /auth/register`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Response of `POST /auth/login` and `POST /auth/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: User,
    /// Bearer token, when the backend uses tokens instead of cookies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

// ── Client-only records ─────────────────────────────────────────────

/// A purchase made without an account, kept only on the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestTicket {
    /// Creation time in epoch milliseconds.
    pub id: i64,
    pub showtime_id: ShowtimeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub showtime: Option<Showtime>,
    pub tickets: Vec<TicketRecord>,
    #[serde(default)]
    pub food_items: Vec<FoodLineItem>,
    #[serde(default)]
    pub delivery_type: DeliveryType,
    pub total: Money,
    pub paid: bool,
    pub purchased_at: DateTime<Utc>,
}

/// Concessions bought by a guest, kept only on the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestFoodOrder {
    /// Creation time in epoch milliseconds.
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_ticket_id: Option<i64>,
    pub items: Vec<FoodLineItem>,
    pub delivery_type: DeliveryType,
    pub total: Money,
    pub ordered_at: DateTime<Utc>,
}
