//! The booking state machine.
//!
//! [`BookingOrchestrator`] owns one in-progress booking: the bound showtime,
//! the selected seats and their ticket types, concession lines, and the
//! delivery type. It keeps the running total current after every mutation,
//! snapshots the draft to device storage, and drives the checkout against the
//! backend.
//!
//! Guests and signed-in users diverge after seat selection. A signed-in user
//! checks out in two phases (server reservation, then payment); a guest pays
//! in one step and the purchase is recorded only on the device.
//!
//! ```text
//!  Empty ──toggle──▶ SeatsSelected ──create_reservation──▶ ReservationCreated ──pay──▶ Paid
//!    ▲                    │  ▲                                   │
//!    └────── reset ───────┘  └──── selection changed / cancel ───┘
//!
//!  load_draft on a stale entry ──▶ Expired      guest: SeatsSelected ──pay──▶ Paid
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let mut booking = BookingOrchestrator::new(gateway, store, session.identity().await, config);
//! if !booking.load_draft().await.is_restored() {
//!     booking.set_showtime(showtime);
//! }
//! booking.toggle_seat("A1")?;
//! booking.set_ticket_type("A1", TicketType::Child);
//! booking.save_draft().await;
//!
//! let receipt = booking.checkout(&payment).await?;
//! println!("paid {}", receipt.total());
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::draft::{BookingDraft, StoredDraft};
use crate::error::{BookingError, Result};
use crate::error_class::ErrorClass;
use crate::gateway::Gateway;
use crate::guest::GuestLedger;
use crate::models::{
    CreateReservationRequest, DeliveryType, FoodItem, FoodLineItem, GuestFoodOrder, GuestTicket,
    PaymentDetails, PaymentRequest, Reservation, ReservationId, Seat, SeatId, SeatStatus, Showtime,
    TicketRecord, TicketSelection, TicketType,
};
use crate::money::Money;
use crate::session::BookingIdentity;
use crate::store::{get_json, keys, set_json, DraftStore};

// ── Public result types ─────────────────────────────────────────────

/// Where a booking is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookingStage {
    /// Nothing selected.
    Empty,
    /// At least one seat selected, no server reservation.
    SeatsSelected,
    /// The backend holds an unpaid reservation for the selection.
    ReservationCreated,
    /// Payment succeeded; the draft has been cleared.
    Paid,
    /// A stored draft was found but had outlived its time-to-live.
    Expired,
}

/// Outcome of [`BookingOrchestrator::toggle_seat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatToggle {
    Selected,
    Deselected,
}

/// Outcome of [`BookingOrchestrator::load_draft`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A fresh draft was loaded into memory.
    Restored,
    /// No usable draft was stored.
    NotFound,
    /// A draft was stored but is older than the TTL. Treated as not found.
    Expired,
}

impl LoadOutcome {
    /// Returns `true` only for [`LoadOutcome::Restored`].
    pub fn is_restored(self) -> bool {
        matches!(self, Self::Restored)
    }

    /// Error class to report to the user, if any. Only an expired draft is
    /// worth telling the user about.
    pub fn class(self) -> Option<ErrorClass> {
        match self {
            Self::Expired => Some(ErrorClass::Stale),
            Self::Restored | Self::NotFound => None,
        }
    }
}

/// Proof of a completed payment.
#[derive(Debug, Clone, PartialEq)]
pub enum BookingReceipt {
    /// The paid reservation as returned by the backend.
    Reservation(Reservation),
    /// The on-device record of a guest purchase.
    Guest(GuestTicket),
}

impl BookingReceipt {
    /// Amount charged.
    pub fn total(&self) -> Money {
        match self {
            Self::Reservation(r) => r.total,
            Self::Guest(t) => t.total,
        }
    }

    /// Returns `true` for guest purchases.
    pub fn is_guest(&self) -> bool {
        matches!(self, Self::Guest(_))
    }
}

// ── Orchestrator ────────────────────────────────────────────────────

/// Single source of truth for an in-progress booking.
///
/// All dependencies are passed in explicitly. Mutators take `&mut self`;
/// sharing an orchestrator between tasks requires an outer lock, which also
/// serializes checkout calls.
pub struct BookingOrchestrator {
    gateway: Arc<dyn Gateway>,
    store: Arc<dyn DraftStore>,
    clock: Arc<dyn Clock>,
    ledger: GuestLedger,
    identity: BookingIdentity,
    config: ClientConfig,
    draft: BookingDraft,
    /// Server reservation mirrored after `create_reservation`.
    reservation: Option<Reservation>,
    /// Last seat map fetched for the bound showtime, with local selection applied.
    seat_map: Vec<Seat>,
    total: Money,
    stage: BookingStage,
}

impl BookingOrchestrator {
    /// Create an orchestrator with an empty draft, using the system clock.
    pub fn new(
        gateway: Arc<dyn Gateway>,
        store: Arc<dyn DraftStore>,
        identity: BookingIdentity,
        config: ClientConfig,
    ) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let ledger = GuestLedger::new(Arc::clone(&store), config.guest_history_limit);
        let draft = BookingDraft::new(clock.now());
        Self {
            gateway,
            store,
            clock,
            ledger,
            identity,
            config,
            draft,
            reservation: None,
            seat_map: Vec::new(),
            total: Money::ZERO,
            stage: BookingStage::Empty,
        }
    }

    /// Replace the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.draft.created_at = clock.now();
        self.clock = clock;
        self
    }

    // ── Selection ───────────────────────────────────────────────────

    /// Bind the draft to a showtime. Selected seats are kept, so returning
    /// to the seat screen does not lose them.
    pub fn set_showtime(&mut self, showtime: Showtime) {
        if self.draft.showtime_id.as_deref() != Some(showtime.id.as_str()) {
            debug!(showtime_id = %showtime.id, "showtime bound");
            self.seat_map.clear();
            self.invalidate_reservation("showtime changed");
        }
        self.draft.showtime_id = Some(showtime.id.clone());
        self.draft.showtime = Some(showtime);
        self.refresh();
    }

    /// Fetch the seat map of the bound showtime.
    ///
    /// Seats the server reports as taken are dropped from the selection,
    /// unless this draft already holds a reservation (those seats are taken
    /// by us). Returns the ids of seats removed from the selection.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::NoShowtime`] if no showtime is bound, or a
    /// request-class error if the fetch fails.
    pub async fn load_seats(&mut self) -> Result<Vec<SeatId>> {
        let showtime_id = self
            .draft
            .showtime_id
            .clone()
            .ok_or(BookingError::NoShowtime)?;
        let mut seats = self.gateway.list_seats(&showtime_id).await?;

        let mut released = Vec::new();
        if self.draft.reservation_id.is_none() {
            for seat in seats.iter().filter(|s| s.status == SeatStatus::Taken) {
                if self.draft.is_selected(&seat.id) {
                    released.push(seat.id.clone());
                }
            }
            if !released.is_empty() {
                info!(?released, "selected seats were taken by someone else");
                self.draft.tickets.retain(|t| !released.contains(&t.seat_id));
            }
        }

        for seat in &mut seats {
            if self.draft.is_selected(&seat.id) {
                seat.status = SeatStatus::Selected;
            } else if seat.status == SeatStatus::Selected {
                seat.status = SeatStatus::Available;
            }
        }
        self.seat_map = seats;
        self.refresh();
        Ok(released)
    }

    /// Select `seat_id` with an adult ticket, or deselect it if already selected.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::SeatUnavailable`] when selecting a seat that the
    /// loaded seat map reports as taken or does not contain.
    pub fn toggle_seat(&mut self, seat_id: &str) -> Result<SeatToggle> {
        if self.draft.is_selected(seat_id) {
            self.draft.tickets.retain(|t| t.seat_id != seat_id);
            self.mark_seat(seat_id, SeatStatus::Available);
            self.invalidate_reservation("seat deselected");
            self.refresh();
            debug!(seat_id, "seat deselected");
            return Ok(SeatToggle::Deselected);
        }

        if !self.seat_map.is_empty() {
            let available = self
                .seat_map
                .iter()
                .find(|s| s.id == seat_id)
                .is_some_and(|s| s.status != SeatStatus::Taken);
            if !available {
                return Err(BookingError::SeatUnavailable(seat_id.to_string()));
            }
        }

        if self.draft.tickets.is_empty() && self.draft.reservation_id.is_none() {
            self.start_new_draft();
        }
        self.draft.tickets.push(TicketSelection {
            seat_id: seat_id.to_string(),
            ticket_type: TicketType::Adult,
        });
        self.mark_seat(seat_id, SeatStatus::Selected);
        self.invalidate_reservation("seat selected");
        self.refresh();
        debug!(seat_id, "seat selected");
        Ok(SeatToggle::Selected)
    }

    /// Change the ticket type of a selected seat. Does nothing if the seat is
    /// not selected.
    pub fn set_ticket_type(&mut self, seat_id: &str, ticket_type: TicketType) {
        let Some(ticket) = self.draft.tickets.iter_mut().find(|t| t.seat_id == seat_id) else {
            return;
        };
        if ticket.ticket_type != ticket_type {
            ticket.ticket_type = ticket_type;
            self.invalidate_reservation("ticket type changed");
        }
        self.refresh();
    }

    /// Add `quantity` units of a concession item.
    pub fn add_food_item(&mut self, item: &FoodItem, quantity: u32) {
        if quantity == 0 {
            return;
        }
        self.draft.food.add(item, quantity);
        self.invalidate_reservation("food changed");
        self.refresh();
    }

    /// Remove one unit of a concession item, deleting the line at zero.
    /// Returns the remaining quantity, or `None` if the item was not in the cart.
    pub fn remove_food_item(&mut self, item_id: &str) -> Option<u32> {
        let remaining = self.draft.food.remove_one(item_id)?;
        self.invalidate_reservation("food changed");
        self.refresh();
        Some(remaining)
    }

    /// Choose counter pickup or delivery to the seat.
    pub fn set_delivery_type(&mut self, delivery_type: DeliveryType) {
        if self.draft.delivery_type != delivery_type {
            self.draft.delivery_type = delivery_type;
            if !self.draft.food.is_empty() {
                self.invalidate_reservation("delivery type changed");
            }
        }
        self.refresh();
    }

    // ── Totals ──────────────────────────────────────────────────────

    /// Compute the total from the current selection.
    pub fn compute_total(&self) -> Money {
        self.draft.total()
    }

    /// Total as of the last mutation.
    pub fn total(&self) -> Money {
        self.total
    }

    /// Recompute the cached total. Every mutator calls this before returning.
    pub fn recompute_total(&mut self) -> Money {
        self.total = self.draft.total();
        self.total
    }

    // ── Checkout ────────────────────────────────────────────────────

    /// Create (or reuse) the server reservation for the current selection.
    ///
    /// If the draft already carries a reservation id it is returned without
    /// another request. On failure the draft is unchanged and the call can be
    /// retried.
    ///
    /// # Errors
    ///
    /// - [`BookingError::AccountRequired`] for guests
    /// - [`BookingError::NoShowtime`] / [`BookingError::NoSeatsSelected`] when
    ///   the selection is incomplete (no request is made)
    /// - a request-class error if the backend call fails
    pub async fn create_reservation(&mut self) -> Result<ReservationId> {
        let user_id = match &self.identity {
            BookingIdentity::Guest => return Err(BookingError::AccountRequired),
            BookingIdentity::Authenticated(user_id) => user_id.clone(),
        };
        let showtime_id = self.require_selection()?;

        if let Some(id) = &self.draft.reservation_id {
            debug!(reservation_id = %id, "reservation already created for this draft");
            return Ok(id.clone());
        }

        let request = CreateReservationRequest {
            showtime_id,
            user_id,
            tickets: self.draft.tickets.clone(),
            food_items: self.draft.food.lines().to_vec(),
            delivery_type: (!self.draft.food.is_empty()).then_some(self.draft.delivery_type),
            client_reference: self.draft.draft_id,
        };

        let reservation = match self.gateway.create_reservation(&request).await {
            Ok(reservation) => reservation,
            Err(e) => {
                warn!(error = %e, "reservation request failed");
                return Err(e);
            }
        };

        let id = reservation.id.clone();
        info!(reservation_id = %id, total = %reservation.total, "reservation created");
        self.draft.reservation_id = Some(id.clone());
        self.reservation = Some(reservation);
        self.refresh();
        self.save_draft().await;
        Ok(id)
    }

    /// Pay for the booking.
    ///
    /// Signed-in users pay the reservation created by
    /// [`create_reservation`](Self::create_reservation); if payment fails the
    /// draft, including its reservation id, is kept for a retry. Guests pay
    /// in one step and the purchase is appended to the on-device guest
    /// history. That record is the only proof of a guest purchase, so a
    /// guest payment whose ticket cannot be recorded fails and keeps the
    /// draft, as [`ConcessionOrder::submit`](crate::ConcessionOrder::submit)
    /// does. A guest food order that cannot be recorded is only logged; its
    /// lines are already on the ticket. On success the draft is cleared from
    /// memory and storage.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NoReservation`] if a signed-in user has no reservation yet
    /// - [`BookingError::NoShowtime`] / [`BookingError::NoSeatsSelected`] for
    ///   an incomplete guest selection
    /// - [`BookingError::InvalidPayment`] if the card details fail validation
    /// - a request-class error if the backend call fails
    /// - a storage-class error if a guest ticket cannot be recorded
    pub async fn pay(&mut self, payment: &PaymentDetails) -> Result<BookingReceipt> {
        match self.identity.clone() {
            BookingIdentity::Authenticated(_) => self.pay_reservation(payment).await,
            BookingIdentity::Guest => self.pay_as_guest(payment).await,
        }
    }

    /// Run the remaining checkout steps: reservation (signed-in users only)
    /// then payment.
    ///
    /// # Errors
    ///
    /// Any error of [`create_reservation`](Self::create_reservation) or
    /// [`pay`](Self::pay).
    pub async fn checkout(&mut self, payment: &PaymentDetails) -> Result<BookingReceipt> {
        if !self.identity.is_guest() {
            self.create_reservation().await?;
        }
        self.pay(payment).await
    }

    /// Cancel the draft's server reservation and forget its id.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::NoReservation`] if there is none, or a
    /// request-class error if the backend call fails (the id is kept).
    pub async fn cancel_reservation(&mut self) -> Result<()> {
        let id = self
            .draft
            .reservation_id
            .clone()
            .ok_or(BookingError::NoReservation)?;
        self.gateway.cancel_reservation(&id).await?;
        info!(reservation_id = %id, "reservation cancelled");
        self.draft.reservation_id = None;
        self.reservation = None;
        self.refresh();
        self.save_draft().await;
        Ok(())
    }

    // ── Persistence ─────────────────────────────────────────────────

    /// Write the draft and the current time to device storage, replacing
    /// any previous draft. Failures are logged and otherwise ignored.
    pub async fn save_draft(&self) {
        let stored = StoredDraft {
            draft: self.draft.clone(),
            saved_at: self.clock.now(),
        };
        let key = self.draft_key();
        match set_json(self.store.as_ref(), key, &stored).await {
            Ok(()) => debug!(key, "draft saved"),
            Err(e) => warn!(key, error = %e, "failed to save draft"),
        }
    }

    /// Restore the draft from device storage.
    ///
    /// A draft older than the configured TTL is reported as
    /// [`LoadOutcome::Expired`] and left in storage; the in-memory booking
    /// restarts from an empty selection. Unreadable or undecodable entries
    /// are logged and reported as [`LoadOutcome::NotFound`].
    pub async fn load_draft(&mut self) -> LoadOutcome {
        let key = self.draft_key();
        let stored = match get_json::<StoredDraft>(self.store.as_ref(), key).await {
            Ok(Some(stored)) => stored,
            Ok(None) => return LoadOutcome::NotFound,
            Err(e) => {
                warn!(key, error = %e, "failed to read draft");
                return LoadOutcome::NotFound;
            }
        };

        let now = self.clock.now();
        if stored.is_expired(now, self.config.draft_ttl_chrono()) {
            debug!(key, saved_at = %stored.saved_at, "stored draft expired");
            self.clear_in_memory();
            self.stage = BookingStage::Expired;
            return LoadOutcome::Expired;
        }

        let mut draft = stored.draft;
        draft.food.normalize();
        self.draft = draft;
        self.reservation = None;
        self.seat_map.clear();
        self.refresh();
        debug!(key, stage = ?self.stage, "draft restored");
        LoadOutcome::Restored
    }

    /// Clear the booking from memory and delete the stored draft.
    pub async fn reset(&mut self) {
        self.clear_in_memory();
        self.stage = BookingStage::Empty;
        self.remove_stored_draft().await;
    }

    // ── Accessors ───────────────────────────────────────────────────

    /// The current draft.
    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    /// Current lifecycle stage.
    pub fn stage(&self) -> BookingStage {
        self.stage
    }

    /// Identity the booking is made for.
    pub fn identity(&self) -> &BookingIdentity {
        &self.identity
    }

    /// Switch identity, e.g. after signing in mid-flow. Later saves go to the
    /// new identity's storage key; a reservation made for another account is
    /// forgotten.
    pub fn set_identity(&mut self, identity: BookingIdentity) {
        if identity != self.identity {
            self.invalidate_reservation("identity changed");
            self.identity = identity;
            self.refresh();
        }
    }

    /// Bound showtime.
    pub fn showtime(&self) -> Option<&Showtime> {
        self.draft.showtime.as_ref()
    }

    /// Selected seats with ticket types, in selection order.
    pub fn tickets(&self) -> &[TicketSelection] {
        &self.draft.tickets
    }

    /// Returns `true` if `seat_id` is selected.
    pub fn is_selected(&self, seat_id: &str) -> bool {
        self.draft.is_selected(seat_id)
    }

    /// Ticket type of a selected seat.
    pub fn ticket_type(&self, seat_id: &str) -> Option<TicketType> {
        self.draft.ticket_type(seat_id)
    }

    /// Concession lines.
    pub fn food_lines(&self) -> &[FoodLineItem] {
        self.draft.food.lines()
    }

    /// Delivery type for concessions.
    pub fn delivery_type(&self) -> DeliveryType {
        self.draft.delivery_type
    }

    /// Server reservation id, once created.
    pub fn reservation_id(&self) -> Option<&str> {
        self.draft.reservation_id.as_deref()
    }

    /// Server reservation, if created during this process lifetime.
    pub fn reservation(&self) -> Option<&Reservation> {
        self.reservation.as_ref()
    }

    /// Last fetched seat map with the local selection applied.
    pub fn seats(&self) -> &[Seat] {
        &self.seat_map
    }

    /// Guest purchase history backing this orchestrator.
    pub fn guest_ledger(&self) -> &GuestLedger {
        &self.ledger
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn draft_key(&self) -> &'static str {
        match self.identity {
            BookingIdentity::Guest => keys::GUEST_SELECTION,
            BookingIdentity::Authenticated(_) => keys::BOOKING_PROGRESS,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn require_selection(&self) -> Result<String> {
        let showtime_id = self
            .draft
            .showtime_id
            .clone()
            .ok_or(BookingError::NoShowtime)?;
        if self.draft.tickets.is_empty() {
            return Err(BookingError::NoSeatsSelected);
        }
        Ok(showtime_id)
    }

    /// Recompute the total and the stage. Called at the end of every mutator.
    fn refresh(&mut self) {
        self.recompute_total();
        self.stage = if self.draft.reservation_id.is_some() {
            BookingStage::ReservationCreated
        } else if !self.draft.tickets.is_empty() {
            BookingStage::SeatsSelected
        } else {
            BookingStage::Empty
        };
    }

    /// Give the draft a new client reference and creation time, keeping the
    /// bound showtime.
    fn start_new_draft(&mut self) {
        let mut fresh = BookingDraft::new(self.now());
        fresh.showtime_id = self.draft.showtime_id.take();
        fresh.showtime = self.draft.showtime.take();
        fresh.food = std::mem::take(&mut self.draft.food);
        fresh.delivery_type = self.draft.delivery_type;
        debug!(draft_id = %fresh.draft_id, "new booking draft");
        self.draft = fresh;
    }

    fn invalidate_reservation(&mut self, reason: &str) {
        if let Some(id) = self.draft.reservation_id.take() {
            info!(reservation_id = %id, reason, "selection changed, reservation dropped");
            self.reservation = None;
        }
    }

    fn mark_seat(&mut self, seat_id: &str, status: SeatStatus) {
        if let Some(seat) = self.seat_map.iter_mut().find(|s| s.id == seat_id) {
            if seat.status != SeatStatus::Taken {
                seat.status = status;
            }
        }
    }

    fn clear_in_memory(&mut self) {
        self.draft = BookingDraft::new(self.now());
        self.reservation = None;
        self.seat_map.clear();
        self.recompute_total();
    }

    async fn remove_stored_draft(&self) {
        let key = self.draft_key();
        if let Err(e) = self.store.remove(key).await {
            warn!(key, error = %e, "failed to delete stored draft");
        }
    }

    async fn finish_paid(&mut self) {
        self.clear_in_memory();
        self.stage = BookingStage::Paid;
        self.remove_stored_draft().await;
    }

    async fn pay_reservation(&mut self, payment: &PaymentDetails) -> Result<BookingReceipt> {
        let id = self
            .draft
            .reservation_id
            .clone()
            .ok_or(BookingError::NoReservation)?;
        payment.validate(self.now())?;

        let amount = self.reservation.as_ref().map_or(self.total, |r| r.total);
        let request = PaymentRequest::card(payment, amount);
        let paid = match self.gateway.pay_reservation(&id, &request).await {
            Ok(paid) => paid,
            Err(e) => {
                warn!(reservation_id = %id, error = %e, "payment failed, reservation kept for retry");
                return Err(e);
            }
        };

        info!(reservation_id = %paid.id, total = %paid.total, "reservation paid");
        self.finish_paid().await;
        Ok(BookingReceipt::Reservation(paid))
    }

    async fn pay_as_guest(&mut self, payment: &PaymentDetails) -> Result<BookingReceipt> {
        let showtime_id = self.require_selection()?;
        let now = self.now();
        payment.validate(now)?;

        let base = self.draft.base_price();
        let tickets = self
            .draft
            .tickets
            .iter()
            .map(|t| self.ticket_record(t, base))
            .collect();
        let food_items = self.draft.food.lines().to_vec();
        let ticket = GuestTicket {
            id: now.timestamp_millis(),
            showtime_id,
            showtime: self.draft.showtime.clone(),
            tickets,
            food_items: food_items.clone(),
            delivery_type: self.draft.delivery_type,
            total: self.draft.total(),
            paid: true,
            purchased_at: now,
        };

        let ticket = match self.ledger.append_ticket(ticket).await {
            Ok(ticket) => ticket,
            Err(e) => {
                warn!(error = %e, "failed to record guest ticket, draft kept");
                return Err(e);
            }
        };
        if !food_items.is_empty() {
            let order = GuestFoodOrder {
                id: ticket.id,
                guest_ticket_id: Some(ticket.id),
                total: self.draft.food.subtotal(),
                items: food_items,
                delivery_type: self.draft.delivery_type,
                ordered_at: now,
            };
            if let Err(e) = self.ledger.append_food_order(order).await {
                warn!(guest_ticket_id = ticket.id, error = %e, "failed to record guest food order");
            }
        }

        info!(guest_ticket_id = ticket.id, total = %ticket.total, "guest booking paid");
        self.finish_paid().await;
        Ok(BookingReceipt::Guest(ticket))
    }

    fn ticket_record(&self, selection: &TicketSelection, base: Money) -> TicketRecord {
        let (row, number) = match self.seat_map.iter().find(|s| s.id == selection.seat_id) {
            Some(seat) => (seat.row.clone(), seat.number),
            None => split_seat_label(&selection.seat_id),
        };
        TicketRecord {
            seat_id: Some(selection.seat_id.clone()),
            row,
            number,
            ticket_type: selection.ticket_type,
            price: selection.ticket_type.price(base),
        }
    }
}

impl std::fmt::Debug for BookingOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingOrchestrator")
            .field("identity", &self.identity)
            .field("stage", &self.stage)
            .field("draft", &self.draft)
            .field("total", &self.total)
            .finish_non_exhaustive()
    }
}

/// Best-effort row/number from a seat id like `A12` when no seat map is loaded.
fn split_seat_label(seat_id: &str) -> (String, u32) {
    let split = seat_id
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(seat_id.len());
    let (row, number) = seat_id.split_at(split);
    (row.to_string(), number.parse().unwrap_or(0))
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::models::{
        Credentials, FoodCategory, FoodOrder, FoodOrderRequest, LoginResponse, Movie,
        MovieDetails, Registration, Theater, User,
    };
    use crate::stores::MemoryStore;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex as StdMutex;

    // ── Mock gateway ────────────────────────────────────────────────

    /// Serves a fixed seat map and records reservation calls.
    #[derive(Default)]
    struct SeatMapGateway {
        seats: Vec<Seat>,
        calls: StdMutex<Vec<String>>,
    }

    fn unsupported() -> BookingError {
        BookingError::Transport("not scripted".into())
    }

    #[async_trait]
    impl Gateway for SeatMapGateway {
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
            self.calls.lock().unwrap().push("list_seats".into());
            Ok(self.seats.clone())
        }
        async fn create_reservation(&self, request: &CreateReservationRequest) -> Result<Reservation> {
            self.calls.lock().unwrap().push("create_reservation".into());
            Ok(Reservation {
                id: "r-1".into(),
                showtime_id: Some(request.showtime_id.clone()),
                user_id: Some(request.user_id.clone()),
                paid: false,
                total: Money::from_cents(1500),
                tickets: vec![],
                food_items: None,
                delivery_type: None,
                created_at: None,
            })
        }
        async fn get_reservation(&self, _id: &str) -> Result<Reservation> {
            Err(unsupported())
        }
        async fn pay_reservation(&self, _id: &str, _payment: &PaymentRequest) -> Result<Reservation> {
            Err(unsupported())
        }
        async fn cancel_reservation(&self, _id: &str) -> Result<()> {
            self.calls.lock().unwrap().push("cancel_reservation".into());
            Ok(())
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
        async fn create_food_order(&self, _request: &FoodOrderRequest) -> Result<FoodOrder> {
            Err(unsupported())
        }
        async fn login(&self, _credentials: &Credentials) -> Result<LoginResponse> {
            Err(unsupported())
        }
        async fn logout(&self) -> Result<()> {
            Ok(())
        }
        async fn me(&self) -> Result<User> {
            Err(unsupported())
        }
        async fn register(&self, _registration: &Registration) -> Result<LoginResponse> {
            Err(unsupported())
        }
    }

    // ── Helpers ─────────────────────────────────────────────────────

    fn seat(id: &str, status: SeatStatus) -> Seat {
        let (row, number) = split_seat_label(id);
        Seat {
            id: id.into(),
            row,
            number,
            status,
        }
    }

    fn showtime(id: &str, price_cents: i64) -> Showtime {
        Showtime {
            id: id.into(),
            movie_id: "m-1".into(),
            theater_id: "t-1".into(),
            screen: None,
            start_time: Utc.with_ymd_and_hms(2026, 6, 1, 20, 0, 0).unwrap(),
            price: Money::from_cents(price_cents),
        }
    }

    fn orchestrator(
        gateway: Arc<SeatMapGateway>,
        identity: BookingIdentity,
    ) -> BookingOrchestrator {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 6, 1, 18, 0, 0).unwrap(),
        ));
        BookingOrchestrator::new(
            gateway,
            Arc::new(MemoryStore::new()),
            identity,
            ClientConfig::new("http://localhost"),
        )
        .with_clock(clock)
    }

    fn signed_in() -> BookingIdentity {
        BookingIdentity::Authenticated("u-1".into())
    }

    // ── Tests ───────────────────────────────────────────────────────

    #[test]
    fn split_seat_label_parses_row_and_number() {
        assert_eq!(split_seat_label("A12"), ("A".to_string(), 12));
        assert_eq!(split_seat_label("AA3"), ("AA".to_string(), 3));
        assert_eq!(split_seat_label("balcony"), ("balcony".to_string(), 0));
    }

    #[tokio::test]
    async fn taken_seats_cannot_be_selected() {
        let gateway = Arc::new(SeatMapGateway {
            seats: vec![seat("A1", SeatStatus::Available), seat("A2", SeatStatus::Taken)],
            ..Default::default()
        });
        let mut booking = orchestrator(gateway, signed_in());
        booking.set_showtime(showtime("st-1", 1500));
        booking.load_seats().await.unwrap();

        assert_eq!(booking.toggle_seat("A1").unwrap(), SeatToggle::Selected);
        assert!(matches!(
            booking.toggle_seat("A2"),
            Err(BookingError::SeatUnavailable(id)) if id == "A2"
        ));
        assert!(matches!(
            booking.toggle_seat("Z9"),
            Err(BookingError::SeatUnavailable(_))
        ));
        assert_eq!(booking.seats()[0].status, SeatStatus::Selected);
        assert_eq!(booking.seats()[1].status, SeatStatus::Taken);
    }

    #[tokio::test]
    async fn load_seats_releases_seats_taken_elsewhere() {
        let gateway = Arc::new(SeatMapGateway {
            seats: vec![seat("A1", SeatStatus::Taken), seat("A2", SeatStatus::Available)],
            ..Default::default()
        });
        let mut booking = orchestrator(gateway, signed_in());
        booking.set_showtime(showtime("st-1", 1500));
        booking.toggle_seat("A1").unwrap();
        booking.toggle_seat("A2").unwrap();

        let released = booking.load_seats().await.unwrap();
        assert_eq!(released, vec!["A1".to_string()]);
        assert!(!booking.is_selected("A1"));
        assert!(booking.is_selected("A2"));
        assert_eq!(booking.total(), Money::from_cents(1500));
    }

    #[tokio::test]
    async fn load_seats_keeps_own_reserved_seats() {
        let gateway = Arc::new(SeatMapGateway {
            seats: vec![seat("A1", SeatStatus::Taken)],
            ..Default::default()
        });
        let mut booking = orchestrator(Arc::clone(&gateway), signed_in());
        booking.set_showtime(showtime("st-1", 1500));
        booking.toggle_seat("A1").unwrap();
        booking.create_reservation().await.unwrap();

        let released = booking.load_seats().await.unwrap();
        assert!(released.is_empty());
        assert!(booking.is_selected("A1"));
        assert_eq!(booking.stage(), BookingStage::ReservationCreated);
    }

    #[tokio::test]
    async fn load_seats_requires_showtime() {
        let mut booking = orchestrator(Arc::new(SeatMapGateway::default()), signed_in());
        assert!(matches!(
            booking.load_seats().await,
            Err(BookingError::NoShowtime)
        ));
    }

    #[tokio::test]
    async fn changing_selection_drops_reservation() {
        let gateway = Arc::new(SeatMapGateway::default());
        let mut booking = orchestrator(Arc::clone(&gateway), signed_in());
        booking.set_showtime(showtime("st-1", 1500));
        booking.toggle_seat("A1").unwrap();
        booking.create_reservation().await.unwrap();
        assert_eq!(booking.stage(), BookingStage::ReservationCreated);

        booking.set_ticket_type("A1", TicketType::Senior);
        assert_eq!(booking.reservation_id(), None);
        assert_eq!(booking.stage(), BookingStage::SeatsSelected);
        assert!(booking.reservation().is_none());
    }

    #[tokio::test]
    async fn repeated_create_reuses_reservation() {
        let gateway = Arc::new(SeatMapGateway::default());
        let mut booking = orchestrator(Arc::clone(&gateway), signed_in());
        booking.set_showtime(showtime("st-1", 1500));
        booking.toggle_seat("A1").unwrap();

        let first = booking.create_reservation().await.unwrap();
        let second = booking.create_reservation().await.unwrap();
        assert_eq!(first, second);

        let calls = gateway.calls.lock().unwrap();
        assert_eq!(
            calls.iter().filter(|c| *c == "create_reservation").count(),
            1
        );
    }

    #[tokio::test]
    async fn cancel_reservation_returns_to_seat_selection() {
        let gateway = Arc::new(SeatMapGateway::default());
        let mut booking = orchestrator(Arc::clone(&gateway), signed_in());
        assert!(matches!(
            booking.cancel_reservation().await,
            Err(BookingError::NoReservation)
        ));

        booking.set_showtime(showtime("st-1", 1500));
        booking.toggle_seat("A1").unwrap();
        booking.create_reservation().await.unwrap();
        booking.cancel_reservation().await.unwrap();

        assert_eq!(booking.reservation_id(), None);
        assert_eq!(booking.stage(), BookingStage::SeatsSelected);
        assert!(gateway
            .calls
            .lock()
            .unwrap()
            .contains(&"cancel_reservation".to_string()));
    }

    #[tokio::test]
    async fn guests_cannot_create_server_reservations() {
        let gateway = Arc::new(SeatMapGateway::default());
        let mut booking = orchestrator(Arc::clone(&gateway), BookingIdentity::Guest);
        booking.set_showtime(showtime("st-1", 1500));
        booking.toggle_seat("A1").unwrap();

        assert!(matches!(
            booking.create_reservation().await,
            Err(BookingError::AccountRequired)
        ));
        assert!(gateway.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn first_selection_starts_a_new_draft_reference() {
        let mut booking = orchestrator(Arc::new(SeatMapGateway::default()), signed_in());
        booking.set_showtime(showtime("st-1", 1500));
        let before = booking.draft().draft_id;

        booking.toggle_seat("A1").unwrap();
        let started = booking.draft().draft_id;
        assert_ne!(before, started);
        assert_eq!(booking.draft().showtime_id.as_deref(), Some("st-1"));

        booking.toggle_seat("A2").unwrap();
        assert_eq!(booking.draft().draft_id, started);
    }

    #[tokio::test]
    async fn set_identity_switches_storage_key() {
        let store = Arc::new(MemoryStore::new());
        let mut booking = BookingOrchestrator::new(
            Arc::new(SeatMapGateway::default()),
            store.clone(),
            BookingIdentity::Guest,
            ClientConfig::new("http://localhost"),
        );
        booking.toggle_seat("A1").unwrap();
        booking.save_draft().await;
        assert!(store.contains(keys::GUEST_SELECTION).await);

        booking.set_identity(signed_in());
        booking.save_draft().await;
        assert!(store.contains(keys::BOOKING_PROGRESS).await);
    }
}
