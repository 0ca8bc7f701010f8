//! On-device history of guest purchases.
//!
//! Guests have no server identity to query by, so their tickets and food
//! orders live only in device storage under [`keys::GUEST_TICKETS`] and
//! [`keys::GUEST_FOOD_ORDERS`]. Both lists are capped: appending beyond the
//! configured limit evicts the oldest records.
//!
//! Appends never overwrite a list they could not read. A list that is
//! present but undecodable is copied to `<key>.unreadable` before being
//! replaced.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::models::{GuestFoodOrder, GuestTicket};
use crate::store::{get_json, keys, set_json, DraftStore};

/// Suffix of the key an undecodable list is moved to.
const UNREADABLE_SUFFIX: &str = ".unreadable";

/// A guest record with a locally assigned integer id.
trait LedgerRecord: Serialize + DeserializeOwned {
    fn id(&self) -> i64;
    fn set_id(&mut self, id: i64);
}

impl LedgerRecord for GuestTicket {
    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }
}

impl LedgerRecord for GuestFoodOrder {
    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }
}

/// Read/append access to the guest ticket and guest food order lists.
#[derive(Clone)]
pub struct GuestLedger {
    store: Arc<dyn DraftStore>,
    limit: usize,
}

impl GuestLedger {
    /// Create a ledger keeping at most `limit` records per list.
    pub fn new(store: Arc<dyn DraftStore>, limit: usize) -> Self {
        Self {
            store,
            limit: limit.max(1),
        }
    }

    /// All guest tickets, oldest first. Unreadable storage reads as empty.
    pub async fn tickets(&self) -> Vec<GuestTicket> {
        self.read_list(keys::GUEST_TICKETS).await
    }

    /// The guest ticket with the given id.
    pub async fn find_ticket(&self, id: i64) -> Option<GuestTicket> {
        self.tickets().await.into_iter().find(|t| t.id == id)
    }

    /// Append a guest ticket, evicting the oldest beyond the limit.
    ///
    /// If the ticket's id is already taken it is moved past the largest
    /// stored id. Returns the ticket as stored.
    ///
    /// # Errors
    ///
    /// Returns a storage-class error if the list cannot be read or written.
    /// Nothing is written after a failed read.
    pub async fn append_ticket(&self, ticket: GuestTicket) -> Result<GuestTicket> {
        self.append(keys::GUEST_TICKETS, ticket).await
    }

    /// All guest food orders, oldest first. Unreadable storage reads as empty.
    pub async fn food_orders(&self) -> Vec<GuestFoodOrder> {
        self.read_list(keys::GUEST_FOOD_ORDERS).await
    }

    /// Append a guest food order, evicting the oldest beyond the limit.
    /// Ids are de-duplicated as in [`append_ticket`](Self::append_ticket).
    ///
    /// # Errors
    ///
    /// Returns a storage-class error if the list cannot be read or written.
    pub async fn append_food_order(&self, order: GuestFoodOrder) -> Result<GuestFoodOrder> {
        self.append(keys::GUEST_FOOD_ORDERS, order).await
    }

    /// Delete both lists.
    ///
    /// # Errors
    ///
    /// Returns a storage-class error if either key cannot be removed.
    pub async fn clear(&self) -> Result<()> {
        self.store.remove(keys::GUEST_TICKETS).await?;
        self.store.remove(keys::GUEST_FOOD_ORDERS).await
    }

    async fn read_list<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        match get_json::<Vec<T>>(self.store.as_ref(), key).await {
            Ok(list) => list.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(key, error = %e, "guest history unreadable, treating as empty");
                Vec::new()
            }
        }
    }

    /// Read a list that is about to be rewritten. Read failures propagate;
    /// undecodable content is copied aside and replaced.
    async fn read_for_append<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        let raw = match self.store.get(key).await? {
            Some(raw) => raw,
            None => return Ok(Vec::new()),
        };
        match serde_json::from_str(&raw) {
            Ok(list) => Ok(list),
            Err(e) => {
                let backup = format!("{key}{UNREADABLE_SUFFIX}");
                self.store.set(&backup, raw).await?;
                tracing::warn!(key, backup = %backup, error = %e, "guest history undecodable, moved aside");
                Ok(Vec::new())
            }
        }
    }

    async fn append<T: LedgerRecord + Clone>(&self, key: &str, mut record: T) -> Result<T> {
        let mut list: Vec<T> = self.read_for_append(key).await?;
        if list.iter().any(|r| r.id() == record.id()) {
            let next = list
                .iter()
                .map(LedgerRecord::id)
                .max()
                .unwrap_or(record.id())
                .saturating_add(1);
            tracing::debug!(key, requested = record.id(), assigned = next, "guest record id taken");
            record.set_id(next);
        }
        list.push(record.clone());
        if list.len() > self.limit {
            let evicted = list.len() - self.limit;
            list = list.split_off(evicted);
            tracing::debug!(key, evicted, "guest history trimmed");
        }
        set_json(self.store.as_ref(), key, &list).await?;
        Ok(record)
    }
}

impl std::fmt::Debug for GuestLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuestLedger")
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}
