#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! Integration tests for the booking flow.
//!
//! Uses the shared `MockGateway` from `tests/common` with a `MemoryStore`
//! and a `ManualClock` to drive `BookingOrchestrator` through guest and
//! signed-in checkouts, draft persistence, and failure recovery.

mod common;

use std::sync::Arc;

use chrono::Duration;
use cinema_booking_client::store::keys;
use cinema_booking_client::{
    BookingError, BookingIdentity, BookingOrchestrator, BookingReceipt, BookingStage, ClientConfig,
    DeliveryType, DraftStore, ErrorClass, GuestLedger, LoadOutcome, ManualClock, MemoryStore,
    Money, SeatToggle, TicketType,
};

use common::{popcorn, showtime, soda, t0, valid_card, FlakyStore, MockGateway};

// ════════════════════════════════════════════════════════════════════
// Helper: an orchestrator over the mock backend
// ════════════════════════════════════════════════════════════════════

struct Harness {
    gateway: Arc<MockGateway>,
    store: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
    booking: BookingOrchestrator,
}

impl Harness {
    fn new(identity: BookingIdentity) -> Self {
        let gateway = Arc::new(MockGateway::new(showtime(1500)));
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(t0()));
        let booking = Self::orchestrator(&gateway, &store, &clock, identity);
        Self {
            gateway,
            store,
            clock,
            booking,
        }
    }

    /// Another orchestrator sharing this harness's backend, storage, and clock,
    /// as after an app restart.
    fn reopen(&self, identity: BookingIdentity) -> BookingOrchestrator {
        Self::orchestrator(&self.gateway, &self.store, &self.clock, identity)
    }

    fn orchestrator(
        gateway: &Arc<MockGateway>,
        store: &Arc<MemoryStore>,
        clock: &Arc<ManualClock>,
        identity: BookingIdentity,
    ) -> BookingOrchestrator {
        BookingOrchestrator::new(
            gateway.clone(),
            store.clone(),
            identity,
            ClientConfig::new("http://cinema.test/api"),
        )
        .with_clock(clock.clone())
    }
}

fn signed_in() -> BookingIdentity {
    BookingIdentity::Authenticated("u-1".into())
}

/// An orchestrator over the mock backend and a store that can be made to fail.
fn over_flaky_store(
    identity: BookingIdentity,
) -> (Arc<MockGateway>, Arc<FlakyStore>, BookingOrchestrator) {
    let gateway = Arc::new(MockGateway::new(showtime(1500)));
    let store = Arc::new(FlakyStore::new());
    let booking = BookingOrchestrator::new(
        gateway.clone(),
        store.clone(),
        identity,
        ClientConfig::new("http://cinema.test/api"),
    )
    .with_clock(Arc::new(ManualClock::new(t0())));
    (gateway, store, booking)
}

// ════════════════════════════════════════════════════════════════════
// Seat selection and pricing
// ════════════════════════════════════════════════════════════════════

#[test]
fn toggle_parity_decides_selection() {
    let mut h = Harness::new(signed_in());
    h.booking.set_showtime(showtime(1500));

    for toggles in 1..=6 {
        let outcome = h.booking.toggle_seat("B2").unwrap();
        let expected_selected = toggles % 2 == 1;
        assert_eq!(h.booking.is_selected("B2"), expected_selected);
        assert_eq!(
            outcome,
            if expected_selected {
                SeatToggle::Selected
            } else {
                SeatToggle::Deselected
            }
        );
    }
    assert_eq!(h.booking.stage(), BookingStage::Empty);
}

#[test]
fn deselecting_forgets_ticket_type() {
    let mut h = Harness::new(signed_in());
    h.booking.set_showtime(showtime(1500));
    h.booking.toggle_seat("A1").unwrap();
    h.booking.set_ticket_type("A1", TicketType::Senior);
    h.booking.toggle_seat("A1").unwrap();
    h.booking.toggle_seat("A1").unwrap();

    assert_eq!(h.booking.ticket_type("A1"), Some(TicketType::Adult));
}

#[test]
fn set_ticket_type_on_unselected_seat_is_a_no_op() {
    let mut h = Harness::new(signed_in());
    h.booking.set_showtime(showtime(1500));
    h.booking.set_ticket_type("A3", TicketType::Child);

    assert_eq!(h.booking.ticket_type("A3"), None);
    assert!(h.booking.tickets().is_empty());
    assert_eq!(h.booking.total(), Money::ZERO);
}

#[test]
fn compute_total_is_repeatable() {
    let mut h = Harness::new(signed_in());
    h.booking.set_showtime(showtime(1500));
    h.booking.toggle_seat("A1").unwrap();
    h.booking.add_food_item(&popcorn(), 2);

    let first = h.booking.compute_total();
    let second = h.booking.compute_total();
    assert_eq!(first, second);
    assert_eq!(first, h.booking.total());
}

#[test]
fn n_seats_of_one_type_cost_n_times_multiplied_price() {
    for ticket_type in TicketType::ALL {
        let mut h = Harness::new(signed_in());
        h.booking.set_showtime(showtime(1500));
        for seat in ["A1", "A2", "A3"] {
            h.booking.toggle_seat(seat).unwrap();
            h.booking.set_ticket_type(seat, ticket_type);
        }
        let per_ticket = ticket_type.price(Money::from_cents(1500));
        assert_eq!(h.booking.total(), per_ticket * 3, "{ticket_type}");
    }
}

#[test]
fn adult_plus_child_at_fifteen_dollars_is_26_25() {
    let mut h = Harness::new(signed_in());
    h.booking.set_showtime(showtime(1500));
    h.booking.toggle_seat("A1").unwrap();
    h.booking.toggle_seat("A2").unwrap();
    h.booking.set_ticket_type("A2", TicketType::Child);

    assert_eq!(h.booking.total(), Money::from_cents(2625));
    assert_eq!(h.booking.total().to_string(), "$26.25");
}

#[test]
fn food_lines_add_to_total() {
    let mut h = Harness::new(signed_in());
    h.booking.set_showtime(showtime(1500));
    h.booking.toggle_seat("A1").unwrap();
    h.booking.add_food_item(&popcorn(), 1);
    h.booking.add_food_item(&soda(), 2);

    // 15.00 + 6.50 + 2 * 4.25
    assert_eq!(h.booking.total(), Money::from_cents(3000));
}

#[test]
fn removing_food_decrements_then_deletes() {
    let mut h = Harness::new(signed_in());
    h.booking.add_food_item(&popcorn(), 2);

    assert_eq!(h.booking.remove_food_item("popcorn"), Some(1));
    assert_eq!(h.booking.food_lines()[0].quantity, 1);

    assert_eq!(h.booking.remove_food_item("popcorn"), Some(0));
    assert!(h.booking.food_lines().is_empty());
    assert_eq!(h.booking.remove_food_item("popcorn"), None);
}

#[tokio::test]
async fn seat_taken_by_someone_else_is_released_on_reload() {
    let mut h = Harness::new(signed_in());
    h.booking.set_showtime(showtime(1500));
    h.booking.load_seats().await.unwrap();
    h.booking.toggle_seat("A1").unwrap();
    h.booking.toggle_seat("A2").unwrap();

    h.gateway.take_seat("A2");
    let released = h.booking.load_seats().await.unwrap();

    assert_eq!(released, vec!["A2".to_string()]);
    assert!(h.booking.is_selected("A1"));
    let err = h.booking.toggle_seat("A2").unwrap_err();
    assert!(matches!(err, BookingError::SeatUnavailable(_)));
    assert_eq!(err.class(), ErrorClass::Validation);
}

// ════════════════════════════════════════════════════════════════════
// Draft persistence
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn saved_draft_restores_equal_state() {
    let mut h = Harness::new(signed_in());
    h.booking.set_showtime(showtime(1500));
    h.booking.toggle_seat("A1").unwrap();
    h.booking.toggle_seat("B3").unwrap();
    h.booking.set_ticket_type("B3", TicketType::Senior);
    h.booking.add_food_item(&soda(), 3);
    h.booking.set_delivery_type(DeliveryType::ToSeat);
    h.booking.save_draft().await;

    h.clock.advance(Duration::minutes(5));
    let mut restored = h.reopen(signed_in());
    assert_eq!(restored.load_draft().await, LoadOutcome::Restored);

    assert_eq!(restored.draft(), h.booking.draft());
    assert_eq!(restored.total(), h.booking.total());
    assert_eq!(restored.stage(), BookingStage::SeatsSelected);
}

#[tokio::test]
async fn draft_older_than_thirty_minutes_is_not_restored() {
    let mut h = Harness::new(signed_in());
    h.booking.set_showtime(showtime(1500));
    h.booking.toggle_seat("A1").unwrap();
    h.booking.save_draft().await;

    h.clock.advance(Duration::minutes(30) + Duration::seconds(1));
    let mut restored = h.reopen(signed_in());

    let outcome = restored.load_draft().await;
    assert_eq!(outcome, LoadOutcome::Expired);
    assert_eq!(outcome.class(), Some(ErrorClass::Stale));
    assert!(restored.tickets().is_empty());
    assert_eq!(restored.total(), Money::ZERO);
    assert_eq!(restored.stage(), BookingStage::Expired);
    assert!(h.store.contains(keys::BOOKING_PROGRESS).await);
}

#[tokio::test]
async fn draft_exactly_thirty_minutes_old_is_restored() {
    let mut h = Harness::new(signed_in());
    h.booking.toggle_seat("A1").unwrap();
    h.booking.save_draft().await;

    h.clock.advance(Duration::minutes(30));
    let mut restored = h.reopen(signed_in());
    let outcome = restored.load_draft().await;
    assert!(outcome.is_restored());
    assert_eq!(outcome.class(), None);
}

#[tokio::test]
async fn missing_or_corrupt_draft_is_not_found() {
    let h = Harness::new(signed_in());
    let mut restored = h.reopen(signed_in());
    assert_eq!(restored.load_draft().await, LoadOutcome::NotFound);

    h.store
        .set(keys::BOOKING_PROGRESS, "{\"draft\": 3".into())
        .await
        .unwrap();
    assert_eq!(restored.load_draft().await, LoadOutcome::NotFound);
}

#[tokio::test]
async fn guest_and_member_drafts_use_separate_keys() {
    let mut h = Harness::new(BookingIdentity::Guest);
    h.booking.toggle_seat("A1").unwrap();
    h.booking.save_draft().await;

    assert!(h.store.contains(keys::GUEST_SELECTION).await);
    assert!(!h.store.contains(keys::BOOKING_PROGRESS).await);

    let mut member = h.reopen(signed_in());
    assert_eq!(member.load_draft().await, LoadOutcome::NotFound);
}

#[tokio::test]
async fn reset_clears_memory_and_storage() {
    let mut h = Harness::new(signed_in());
    h.booking.toggle_seat("A1").unwrap();
    h.booking.save_draft().await;

    h.booking.reset().await;
    assert_eq!(h.booking.stage(), BookingStage::Empty);
    assert!(h.booking.tickets().is_empty());
    assert!(!h.store.contains(keys::BOOKING_PROGRESS).await);
}

// ════════════════════════════════════════════════════════════════════
// Storage failures
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn unavailable_storage_never_blocks_the_signed_in_flow() {
    let (gateway, store, mut booking) = over_flaky_store(signed_in());
    store.go_offline();

    booking.set_showtime(showtime(1500));
    booking.toggle_seat("A1").unwrap();
    booking.add_food_item(&popcorn(), 1);
    booking.save_draft().await;
    assert!(booking.is_selected("A1"));
    assert_eq!(booking.total(), Money::from_cents(2150));

    assert_eq!(booking.load_draft().await, LoadOutcome::NotFound);
    assert!(booking.is_selected("A1"));
    assert_eq!(booking.stage(), BookingStage::SeatsSelected);

    let receipt = booking.checkout(&valid_card()).await.unwrap();
    assert_eq!(receipt.total(), Money::from_cents(2150));
    assert_eq!(gateway.count("pay_reservation"), 1);
    assert_eq!(booking.stage(), BookingStage::Paid);

    booking.toggle_seat("B1").unwrap();
    booking.reset().await;
    assert_eq!(booking.stage(), BookingStage::Empty);
    assert!(booking.tickets().is_empty());
}

#[tokio::test]
async fn failed_draft_read_keeps_the_current_selection() {
    let (_gateway, store, mut booking) = over_flaky_store(signed_in());
    booking.set_showtime(showtime(1500));
    booking.toggle_seat("A2").unwrap();
    booking.set_ticket_type("A2", TicketType::Senior);

    store.fail_next_gets(1);
    assert_eq!(booking.load_draft().await, LoadOutcome::NotFound);
    assert_eq!(booking.ticket_type("A2"), Some(TicketType::Senior));
    assert_eq!(booking.total(), Money::from_cents(1200));
}

#[tokio::test]
async fn failed_draft_delete_after_guest_payment_is_logged_only() {
    let (_gateway, store, mut booking) = over_flaky_store(BookingIdentity::Guest);
    booking.set_showtime(showtime(1500));
    booking.toggle_seat("A1").unwrap();
    booking.save_draft().await;

    store.fail_next_removes(1);
    let receipt = booking.pay(&valid_card()).await.unwrap();
    assert!(receipt.is_guest());
    assert_eq!(booking.stage(), BookingStage::Paid);
    assert_eq!(booking.guest_ledger().tickets().await.len(), 1);
    assert!(store.contains(keys::GUEST_SELECTION).await);
}

#[tokio::test]
async fn guest_payment_that_cannot_be_recorded_keeps_the_draft() {
    let (_gateway, store, mut booking) = over_flaky_store(BookingIdentity::Guest);
    booking.set_showtime(showtime(1500));
    booking.toggle_seat("A1").unwrap();
    booking.save_draft().await;

    store.go_offline();
    let err = booking.pay(&valid_card()).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Storage);
    assert_eq!(booking.stage(), BookingStage::SeatsSelected);
    assert!(booking.is_selected("A1"));

    store.go_online();
    assert!(store.contains(keys::GUEST_SELECTION).await);
    booking.pay(&valid_card()).await.unwrap();
    assert_eq!(booking.guest_ledger().tickets().await.len(), 1);
    assert!(!store.contains(keys::GUEST_SELECTION).await);
}

#[tokio::test]
async fn failed_history_read_never_drops_earlier_guest_tickets() {
    fn select(booking: &mut BookingOrchestrator, seat: &str) {
        booking.set_showtime(showtime(1500));
        booking.toggle_seat(seat).unwrap();
    }
    let (_gateway, store, mut booking) = over_flaky_store(BookingIdentity::Guest);

    select(&mut booking, "A1");
    booking.pay(&valid_card()).await.unwrap();
    select(&mut booking, "A2");
    booking.pay(&valid_card()).await.unwrap();

    select(&mut booking, "A3");
    store.fail_next_gets(1);
    let err = booking.pay(&valid_card()).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Storage);
    assert_eq!(booking.guest_ledger().tickets().await.len(), 2);

    booking.pay(&valid_card()).await.unwrap();
    let tickets = booking.guest_ledger().tickets().await;
    assert_eq!(tickets.len(), 3);

    // Same clock instant for all three purchases: ids still differ.
    let base = t0().timestamp_millis();
    let ids: Vec<i64> = tickets.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![base, base + 1, base + 2]);
    let seats: Vec<u32> = tickets.iter().map(|t| t.tickets[0].number).collect();
    assert_eq!(seats, vec![1, 2, 3]);
}

// ════════════════════════════════════════════════════════════════════
// Signed-in checkout
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn create_reservation_without_seats_makes_no_request() {
    let mut h = Harness::new(signed_in());
    h.booking.set_showtime(showtime(1500));

    let err = h.booking.create_reservation().await.unwrap_err();
    assert!(matches!(err, BookingError::NoSeatsSelected));
    assert!(err.is_validation());
    assert_eq!(h.gateway.count("create_reservation"), 0);
}

#[tokio::test]
async fn create_reservation_without_showtime_makes_no_request() {
    let mut h = Harness::new(signed_in());
    h.booking.toggle_seat("A1").unwrap();

    let err = h.booking.create_reservation().await.unwrap_err();
    assert!(matches!(err, BookingError::NoShowtime));
    assert!(h.gateway.recorded().is_empty());
}

#[tokio::test]
async fn reservation_request_carries_stable_client_reference() {
    let mut h = Harness::new(signed_in());
    h.booking.set_showtime(showtime(1500));
    h.booking.toggle_seat("A1").unwrap();
    let draft_id = h.booking.draft().draft_id;

    let id = h.booking.create_reservation().await.unwrap();
    assert_eq!(h.booking.stage(), BookingStage::ReservationCreated);
    assert_eq!(h.booking.reservation_id(), Some(id.as_str()));
    assert_eq!(h.booking.draft().draft_id, draft_id);

    // Saved automatically once the reservation exists.
    let raw = h.store.get(keys::BOOKING_PROGRESS).await.unwrap().unwrap();
    let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored["draft"]["reservationId"], serde_json::json!(id));
}

#[tokio::test]
async fn failed_reservation_leaves_draft_untouched() {
    let mut h = Harness::new(signed_in());
    h.booking.set_showtime(showtime(1500));
    h.booking.toggle_seat("A1").unwrap();
    let before = h.booking.draft().clone();
    h.gateway.fail_next_creates(1);

    let err = h.booking.create_reservation().await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Request);
    assert_eq!(err.status(), Some(503));
    assert_eq!(h.booking.draft(), &before);
    assert_eq!(h.booking.stage(), BookingStage::SeatsSelected);

    h.booking.create_reservation().await.unwrap();
    assert_eq!(h.gateway.count("create_reservation"), 2);
}

#[tokio::test]
async fn failed_payment_keeps_reservation_for_retry() {
    let mut h = Harness::new(signed_in());
    h.booking.set_showtime(showtime(1500));
    h.booking.toggle_seat("A1").unwrap();
    let id = h.booking.create_reservation().await.unwrap();
    h.gateway.fail_next_payments(1);

    let err = h.booking.pay(&valid_card()).await.unwrap_err();
    assert!(err.is_request_failure());
    assert_eq!(h.booking.reservation_id(), Some(id.as_str()));
    assert_eq!(h.booking.stage(), BookingStage::ReservationCreated);

    // Retry without reselecting: no second reservation is created.
    let receipt = h.booking.checkout(&valid_card()).await.unwrap();
    assert_eq!(h.gateway.count("create_reservation"), 1);
    assert_eq!(h.gateway.count("pay_reservation"), 2);
    match receipt {
        BookingReceipt::Reservation(paid) => {
            assert_eq!(paid.id, id);
            assert!(paid.paid);
            assert_eq!(paid.total, Money::from_cents(1500));
        }
        BookingReceipt::Guest(_) => panic!("expected a server reservation"),
    }
    assert_eq!(h.booking.stage(), BookingStage::Paid);
    assert!(!h.store.contains(keys::BOOKING_PROGRESS).await);
}

#[tokio::test]
async fn reservation_survives_restart_and_can_be_paid() {
    let mut h = Harness::new(signed_in());
    h.booking.set_showtime(showtime(1500));
    h.booking.toggle_seat("A1").unwrap();
    h.booking.add_food_item(&popcorn(), 1);
    let id = h.booking.create_reservation().await.unwrap();

    let mut restored = h.reopen(signed_in());
    assert!(restored.load_draft().await.is_restored());
    assert_eq!(restored.stage(), BookingStage::ReservationCreated);

    let receipt = restored.pay(&valid_card()).await.unwrap();
    assert_eq!(receipt.total(), Money::from_cents(2150));
    assert!(h.gateway.reservation(&id).unwrap().paid);
}

#[tokio::test]
async fn invalid_card_is_rejected_before_any_request() {
    let mut h = Harness::new(signed_in());
    h.booking.set_showtime(showtime(1500));
    h.booking.toggle_seat("A1").unwrap();
    h.booking.create_reservation().await.unwrap();

    let mut card = valid_card();
    card.expiry_year = 2025;
    let err = h.booking.pay(&card).await.unwrap_err();
    assert!(matches!(err, BookingError::InvalidPayment(_)));
    assert_eq!(h.gateway.count("pay_reservation"), 0);
}

#[tokio::test]
async fn pay_without_reservation_is_a_validation_error() {
    let mut h = Harness::new(signed_in());
    h.booking.set_showtime(showtime(1500));
    h.booking.toggle_seat("A1").unwrap();

    let err = h.booking.pay(&valid_card()).await.unwrap_err();
    assert!(matches!(err, BookingError::NoReservation));
}

// ════════════════════════════════════════════════════════════════════
// Guest checkout
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn guest_payment_records_ticket_on_device() {
    let mut h = Harness::new(BookingIdentity::Guest);
    h.booking.set_showtime(showtime(1500));
    h.booking.load_seats().await.unwrap();
    h.booking.toggle_seat("B4").unwrap();
    h.booking.save_draft().await;
    assert!(h.store.contains(keys::GUEST_SELECTION).await);

    let receipt = h.booking.checkout(&valid_card()).await.unwrap();
    assert!(receipt.is_guest());
    assert_eq!(h.gateway.count("create_reservation"), 0);
    assert_eq!(h.gateway.count("pay_reservation"), 0);

    let tickets = GuestLedger::new(h.store.clone(), 50).tickets().await;
    assert_eq!(tickets.len(), 1);
    let ticket = &tickets[0];
    assert_eq!(ticket.id, t0().timestamp_millis());
    assert_eq!(ticket.tickets[0].row, "B");
    assert_eq!(ticket.tickets[0].number, 4);
    assert_eq!(ticket.total, Money::from_cents(1500));
    assert!(ticket.paid);

    assert!(!h.store.contains(keys::GUEST_SELECTION).await);
    assert_eq!(h.booking.stage(), BookingStage::Paid);
}

#[tokio::test]
async fn guest_food_is_recorded_as_a_food_order() {
    let mut h = Harness::new(BookingIdentity::Guest);
    h.booking.set_showtime(showtime(1200));
    h.booking.toggle_seat("A1").unwrap();
    h.booking.set_ticket_type("A1", TicketType::Child);
    h.booking.add_food_item(&popcorn(), 1);
    h.booking.set_delivery_type(DeliveryType::ToSeat);

    let receipt = h.booking.pay(&valid_card()).await.unwrap();
    // 12.00 * 0.75 + 6.50
    assert_eq!(receipt.total(), Money::from_cents(1550));

    let ledger = h.booking.guest_ledger();
    let orders = ledger.food_orders().await;
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].guest_ticket_id, Some(t0().timestamp_millis()));
    assert_eq!(orders[0].delivery_type, DeliveryType::ToSeat);
    assert_eq!(orders[0].total, Money::from_cents(650));
}

#[tokio::test]
async fn guest_cannot_create_server_reservation() {
    let mut h = Harness::new(BookingIdentity::Guest);
    h.booking.set_showtime(showtime(1500));
    h.booking.toggle_seat("A1").unwrap();

    let err = h.booking.create_reservation().await.unwrap_err();
    assert!(matches!(err, BookingError::AccountRequired));
    assert!(h.gateway.recorded().is_empty());
}

#[tokio::test]
async fn guest_payment_without_seats_fails() {
    let mut h = Harness::new(BookingIdentity::Guest);
    h.booking.set_showtime(showtime(1500));

    let err = h.booking.pay(&valid_card()).await.unwrap_err();
    assert!(matches!(err, BookingError::NoSeatsSelected));
    assert!(GuestLedger::new(h.store.clone(), 50).tickets().await.is_empty());
}
