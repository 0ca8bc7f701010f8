//! The in-flight booking draft and its stored envelope.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cart::FoodLines;
use crate::models::{DeliveryType, ReservationId, SeatId, Showtime, ShowtimeId, TicketSelection, TicketType};
use crate::money::Money;

/// Client-local state of a booking that has not been paid yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDraft {
    /// Client reference sent with reservation requests for this draft.
    pub draft_id: Uuid,
    #[serde(default)]
    pub showtime_id: Option<ShowtimeId>,
    /// Snapshot of the bound showtime, used for pricing.
    #[serde(default)]
    pub showtime: Option<Showtime>,
    #[serde(default)]
    pub tickets: Vec<TicketSelection>,
    #[serde(default, rename = "foodItems")]
    pub food: FoodLines,
    #[serde(default)]
    pub delivery_type: DeliveryType,
    #[serde(default)]
    pub reservation_id: Option<ReservationId>,
    pub created_at: DateTime<Utc>,
}

impl BookingDraft {
    /// A fresh, empty draft.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            draft_id: Uuid::new_v4(),
            showtime_id: None,
            showtime: None,
            tickets: Vec::new(),
            food: FoodLines::new(),
            delivery_type: DeliveryType::default(),
            reservation_id: None,
            created_at: now,
        }
    }

    /// Returns `true` if `seat_id` is selected.
    pub fn is_selected(&self, seat_id: &str) -> bool {
        self.tickets.iter().any(|t| t.seat_id == seat_id)
    }

    /// Ticket type of a selected seat.
    pub fn ticket_type(&self, seat_id: &str) -> Option<TicketType> {
        self.tickets
            .iter()
            .find(|t| t.seat_id == seat_id)
            .map(|t| t.ticket_type)
    }

    /// Selected seat ids in selection order.
    pub fn seat_ids(&self) -> impl Iterator<Item = &SeatId> {
        self.tickets.iter().map(|t| &t.seat_id)
    }

    /// Base ticket price of the bound showtime, zero if none is bound.
    pub fn base_price(&self) -> Money {
        self.showtime.as_ref().map_or(Money::ZERO, |s| s.price)
    }

    /// Sum of ticket prices plus food subtotals.
    ///
    /// A pure function of the selection, the ticket types, the food lines,
    /// and the showtime price.
    pub fn total(&self) -> Money {
        let base = self.base_price();
        let tickets: Money = self.tickets.iter().map(|t| t.ticket_type.price(base)).sum();
        tickets + self.food.subtotal()
    }

    /// Returns `true` if nothing has been chosen yet.
    pub fn is_blank(&self) -> bool {
        self.showtime_id.is_none() && self.tickets.is_empty() && self.food.is_empty()
    }
}

/// A draft as written to device storage, stamped with the save time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDraft {
    pub draft: BookingDraft,
    /// Save time in epoch milliseconds.
    #[serde(rename = "timestamp", with = "chrono::serde::ts_milliseconds")]
    pub saved_at: DateTime<Utc>,
}

impl StoredDraft {
    /// Returns `true` once more than `ttl` has passed since the draft was saved.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.saved_at) > ttl
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 19, 0, 0).unwrap()
    }

    fn showtime(price_cents: i64) -> Showtime {
        Showtime {
            id: "st-1".into(),
            movie_id: "m-1".into(),
            theater_id: "t-1".into(),
            screen: Some("3".into()),
            start_time: t0(),
            price: Money::from_cents(price_cents),
        }
    }

    #[test]
    fn total_without_showtime_prices_tickets_at_zero() {
        let mut draft = BookingDraft::new(t0());
        draft.tickets.push(TicketSelection {
            seat_id: "A1".into(),
            ticket_type: TicketType::Adult,
        });
        assert_eq!(draft.total(), Money::ZERO);

        draft.showtime = Some(showtime(1500));
        assert_eq!(draft.total(), Money::from_cents(1500));
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let stored = StoredDraft {
            draft: BookingDraft::new(t0()),
            saved_at: t0(),
        };
        let ttl = Duration::minutes(30);
        assert!(!stored.is_expired(t0() + Duration::minutes(30), ttl));
        assert!(stored.is_expired(t0() + Duration::minutes(30) + Duration::milliseconds(1), ttl));
    }

    #[test]
    fn stored_draft_uses_millisecond_timestamp() {
        let stored = StoredDraft {
            draft: BookingDraft::new(t0()),
            saved_at: t0(),
        };
        let value = serde_json::to_value(&stored).unwrap();
        assert_eq!(value["timestamp"], serde_json::json!(t0().timestamp_millis()));
        assert!(value["draft"]["foodItems"].is_array());
    }
}
