//! Concessions ordered after a booking is already paid.
//!
//! [`ConcessionOrder`] is a food cart bound to an existing reservation (for
//! signed-in users) or to a guest ticket. It is persisted under
//! [`keys::FOOD_CART`] and [`keys::FOOD_DELIVERY_TYPE`] so the cart survives
//! an app restart, and cleared once the order is submitted.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cart::FoodLines;
use crate::clock::{Clock, SystemClock};
use crate::error::{BookingError, Result};
use crate::gateway::Gateway;
use crate::guest::GuestLedger;
use crate::models::{
    DeliveryType, FoodItem, FoodLineItem, FoodOrder, FoodOrderRequest, GuestFoodOrder,
    ReservationId,
};
use crate::money::Money;
use crate::session::BookingIdentity;
use crate::store::{get_json, keys, set_json, DraftStore};

/// Proof of a submitted concession order.
#[derive(Debug, Clone, PartialEq)]
pub enum ConcessionReceipt {
    /// Order accepted by the backend.
    Order(FoodOrder),
    /// Guest order recorded on the device.
    Guest(GuestFoodOrder),
}

impl ConcessionReceipt {
    /// Amount of the order.
    pub fn total(&self) -> Money {
        match self {
            Self::Order(order) => order.total,
            Self::Guest(order) => order.total,
        }
    }
}

/// A standalone food cart for an existing booking.
pub struct ConcessionOrder {
    gateway: Arc<dyn Gateway>,
    store: Arc<dyn DraftStore>,
    clock: Arc<dyn Clock>,
    ledger: GuestLedger,
    identity: BookingIdentity,
    reservation_id: Option<ReservationId>,
    guest_ticket_id: Option<i64>,
    lines: FoodLines,
    delivery_type: DeliveryType,
}

impl ConcessionOrder {
    /// Create an empty cart. `ledger` receives guest orders.
    pub fn new(
        gateway: Arc<dyn Gateway>,
        store: Arc<dyn DraftStore>,
        ledger: GuestLedger,
        identity: BookingIdentity,
    ) -> Self {
        Self {
            gateway,
            store,
            clock: Arc::new(SystemClock),
            ledger,
            identity,
            reservation_id: None,
            guest_ticket_id: None,
            lines: FoodLines::new(),
            delivery_type: DeliveryType::default(),
        }
    }

    /// Replace the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Bind the order to a paid server reservation.
    pub fn attach_reservation(&mut self, reservation_id: impl Into<ReservationId>) {
        self.reservation_id = Some(reservation_id.into());
    }

    /// Bind the order to a guest ticket.
    pub fn attach_guest_ticket(&mut self, guest_ticket_id: i64) {
        self.guest_ticket_id = Some(guest_ticket_id);
    }

    pub fn add_item(&mut self, item: &FoodItem, quantity: u32) {
        self.lines.add(item, quantity);
    }

    /// Remove one unit; see [`FoodLines::remove_one`].
    pub fn remove_item(&mut self, item_id: &str) -> Option<u32> {
        self.lines.remove_one(item_id)
    }

    pub fn set_delivery_type(&mut self, delivery_type: DeliveryType) {
        self.delivery_type = delivery_type;
    }

    pub fn delivery_type(&self) -> DeliveryType {
        self.delivery_type
    }

    pub fn lines(&self) -> &[FoodLineItem] {
        self.lines.lines()
    }

    pub fn subtotal(&self) -> Money {
        self.lines.subtotal()
    }

    /// Persist the cart and delivery type. Failures are logged.
    pub async fn save(&self) {
        if let Err(e) = set_json(self.store.as_ref(), keys::FOOD_CART, &self.lines).await {
            warn!(error = %e, "failed to save food cart");
        }
        if let Err(e) = set_json(self.store.as_ref(), keys::FOOD_DELIVERY_TYPE, &self.delivery_type).await {
            warn!(error = %e, "failed to save food delivery type");
        }
    }

    /// Restore a previously saved cart. Returns `true` if any lines were found.
    pub async fn load(&mut self) -> bool {
        match get_json::<FoodLines>(self.store.as_ref(), keys::FOOD_CART).await {
            Ok(Some(mut lines)) => {
                lines.normalize();
                self.lines = lines;
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "stored food cart unreadable"),
        }
        match get_json::<DeliveryType>(self.store.as_ref(), keys::FOOD_DELIVERY_TYPE).await {
            Ok(Some(delivery_type)) => self.delivery_type = delivery_type,
            Ok(None) => {}
            Err(e) => warn!(error = %e, "stored food delivery type unreadable"),
        }
        debug!(lines = self.lines.lines().len(), "food cart loaded");
        !self.lines.is_empty()
    }

    /// Submit the order.
    ///
    /// Signed-in users send it to the backend against the attached
    /// reservation; guest orders are appended to the on-device history. The
    /// cart is cleared from memory and storage on success.
    ///
    /// # Errors
    ///
    /// - [`BookingError::EmptyCart`] if there is nothing to order
    /// - [`BookingError::NoReservation`] if a signed-in user has not attached a reservation
    /// - a request-class error if the backend call fails (the cart is kept)
    /// - a storage-class error if a guest order cannot be recorded
    pub async fn submit(&mut self) -> Result<ConcessionReceipt> {
        if self.lines.is_empty() {
            return Err(BookingError::EmptyCart);
        }

        let receipt = match &self.identity {
            BookingIdentity::Authenticated(user_id) => {
                let reservation_id = self
                    .reservation_id
                    .clone()
                    .ok_or(BookingError::NoReservation)?;
                let request = FoodOrderRequest {
                    reservation_id,
                    user_id: Some(user_id.clone()),
                    items: self.lines.lines().to_vec(),
                    delivery_type: self.delivery_type,
                };
                let order = self.gateway.create_food_order(&request).await?;
                info!(order_id = %order.id, total = %order.total, "food order placed");
                ConcessionReceipt::Order(order)
            }
            BookingIdentity::Guest => {
                let now = self.clock.now();
                let order = GuestFoodOrder {
                    id: now.timestamp_millis(),
                    guest_ticket_id: self.guest_ticket_id,
                    items: self.lines.lines().to_vec(),
                    delivery_type: self.delivery_type,
                    total: self.lines.subtotal(),
                    ordered_at: now,
                };
                let order = self.ledger.append_food_order(order).await?;
                info!(order_id = order.id, total = %order.total, "guest food order recorded");
                ConcessionReceipt::Guest(order)
            }
        };

        self.clear().await;
        Ok(receipt)
    }

    /// Empty the cart and delete it from storage.
    pub async fn clear(&mut self) {
        self.lines.clear();
        self.delivery_type = DeliveryType::default();
        for key in [keys::FOOD_CART, keys::FOOD_DELIVERY_TYPE] {
            if let Err(e) = self.store.remove(key).await {
                warn!(key, error = %e, "failed to clear food cart");
            }
        }
    }
}

impl std::fmt::Debug for ConcessionOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcessionOrder")
            .field("identity", &self.identity)
            .field("reservation_id", &self.reservation_id)
            .field("guest_ticket_id", &self.guest_ticket_id)
            .field("lines", &self.lines)
            .field("delivery_type", &self.delivery_type)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::models::{
        CreateReservationRequest, Credentials, FoodCategory, LoginResponse, Movie, MovieDetails,
        PaymentRequest, Registration, Reservation, Seat, Showtime, Theater, User,
    };
    use crate::stores::MemoryStore;
    use async_trait::async_trait;

    /// Accepts every food order and rejects everything else.
    struct KitchenGateway;

    fn unsupported() -> BookingError {
        BookingError::Transport("not scripted".into())
    }

    #[async_trait]
    impl Gateway for KitchenGateway {
        async fn list_movies(&self) -> Result<Vec<Movie>> {
            Err(unsupported())
        }
        async fn get_movie(&self, _id: &str) -> Result<Movie> {
            Err(unsupported())
        }
        async fn get_movie_details(&self, _id: &str) -> Result<MovieDetails> {
            Err(unsupported())
        }
        async fn list_theaters(&self) -> Result<Vec<Theater>> {
            Err(unsupported())
        }
        async fn get_theater(&self, _id: &str) -> Result<Theater> {
            Err(unsupported())
        }
        async fn list_showtimes(&self, _movie_id: Option<&str>) -> Result<Vec<Showtime>> {
            Err(unsupported())
        }
        async fn get_showtime(&self, _id: &str) -> Result<Showtime> {
            Err(unsupported())
        }
        async fn list_seats(&self, _showtime_id: &str) -> Result<Vec<Seat>> {
            Err(unsupported())
        }
        async fn create_reservation(&self, _request: &CreateReservationRequest) -> Result<Reservation> {
            Err(unsupported())
        }
        async fn get_reservation(&self, _id: &str) -> Result<Reservation> {
            Err(unsupported())
        }
        async fn pay_reservation(&self, _id: &str, _payment: &PaymentRequest) -> Result<Reservation> {
            Err(unsupported())
        }
        async fn cancel_reservation(&self, _id: &str) -> Result<()> {
            Err(unsupported())
        }
        async fn list_user_reservations(&self, _user_id: &str) -> Result<Vec<Reservation>> {
            Err(unsupported())
        }
        async fn list_food_categories(&self) -> Result<Vec<FoodCategory>> {
            Err(unsupported())
        }
        async fn list_food_items(&self, _category_id: Option<&str>) -> Result<Vec<FoodItem>> {
            Err(unsupported())
        }
        async fn create_food_order(&self, request: &FoodOrderRequest) -> Result<FoodOrder> {
            Ok(FoodOrder {
                id: "fo-1".into(),
                reservation_id: Some(request.reservation_id.clone()),
                items: request.items.clone(),
                delivery_type: request.delivery_type,
                total: request.items.iter().map(FoodLineItem::subtotal).sum(),
                status: Some("pending".into()),
            })
        }
        async fn login(&self, _credentials: &Credentials) -> Result<LoginResponse> {
            Err(unsupported())
        }
        async fn logout(&self) -> Result<()> {
            Err(unsupported())
        }
        async fn me(&self) -> Result<User> {
            Err(unsupported())
        }
        async fn register(&self, _registration: &Registration) -> Result<LoginResponse> {
            Err(unsupported())
        }
    }

    fn nachos() -> FoodItem {
        FoodItem {
            id: "nachos".into(),
            name: "Nachos".into(),
            price: Money::from_cents(725),
            category_id: None,
            description: None,
            available: true,
        }
    }

    fn order(store: Arc<MemoryStore>, identity: BookingIdentity) -> ConcessionOrder {
        let ledger = GuestLedger::new(store.clone(), 10);
        ConcessionOrder::new(Arc::new(KitchenGateway), store, ledger, identity)
    }

    #[tokio::test]
    async fn empty_cart_is_rejected() {
        let mut cart = order(Arc::new(MemoryStore::new()), BookingIdentity::Guest);
        assert!(matches!(cart.submit().await, Err(BookingError::EmptyCart)));
    }

    #[tokio::test]
    async fn signed_in_order_requires_reservation() {
        let store = Arc::new(MemoryStore::new());
        let mut cart = order(store, BookingIdentity::Authenticated("u-1".into()));
        cart.add_item(&nachos(), 1);
        assert!(matches!(cart.submit().await, Err(BookingError::NoReservation)));

        cart.attach_reservation("r-9");
        cart.set_delivery_type(DeliveryType::ToSeat);
        let receipt = cart.submit().await.unwrap();
        match receipt {
            ConcessionReceipt::Order(order) => {
                assert_eq!(order.reservation_id.as_deref(), Some("r-9"));
                assert_eq!(order.delivery_type, DeliveryType::ToSeat);
                assert_eq!(order.total, Money::from_cents(725));
            }
            ConcessionReceipt::Guest(_) => panic!("expected a backend order"),
        }
        assert!(cart.lines().is_empty());
    }

    #[tokio::test]
    async fn guest_order_is_recorded_on_device() {
        let store = Arc::new(MemoryStore::new());
        let mut cart = order(store.clone(), BookingIdentity::Guest);
        cart.attach_guest_ticket(1_700_000_000_000);
        cart.add_item(&nachos(), 2);
        cart.save().await;

        let receipt = cart.submit().await.unwrap();
        assert_eq!(receipt.total(), Money::from_cents(1450));

        let ledger = GuestLedger::new(store.clone(), 10);
        let orders = ledger.food_orders().await;
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].guest_ticket_id, Some(1_700_000_000_000));
        assert!(!store.contains(keys::FOOD_CART).await);
    }

    #[tokio::test]
    async fn cart_survives_reload() {
        let store = Arc::new(MemoryStore::new());
        let mut cart = order(store.clone(), BookingIdentity::Guest);
        cart.add_item(&nachos(), 3);
        cart.set_delivery_type(DeliveryType::ToSeat);
        cart.save().await;

        let mut restored = order(store, BookingIdentity::Guest);
        assert!(restored.load().await);
        assert_eq!(restored.lines()[0].quantity, 3);
        assert_eq!(restored.delivery_type(), DeliveryType::ToSeat);
    }
}
