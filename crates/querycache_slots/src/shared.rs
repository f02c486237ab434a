// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{
    collections::HashMap,
    fmt::Debug,
    sync::Arc,
    time::{Duration, SystemTime},
};

use parking_lot::Mutex;
use querycache_store::{Error, Result};
use tick::Clock;
use xxhash_rust::xxh3::xxh3_64;

use crate::backend::{SlotBackend, SlotListing, SlotValue};

const DEFAULT_SLOTS: usize = 8;
const DEFAULT_SLOT_CAPACITY: usize = 4096;

#[derive(Debug)]
struct SlotEntry {
    value: SlotValue,
    ttl_secs: u64,
    expires_at: Option<SystemTime>,
    hits: u64,
}

impl SlotEntry {
    fn is_live(&self, now: SystemTime) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

type Slot = HashMap<String, SlotEntry>;

struct Inner {
    slots: Box<[Mutex<Slot>]>,
    slot_capacity: usize,
    admin_auth: bool,
    clock: Clock,
}

/// An in-process [`SlotBackend`] with a fixed number of fixed-capacity slots.
///
/// Keys are hashed to a slot. When a slot is full, expired entries in it are
/// purged first; if it is still full the write is refused. Expiry is evaluated
/// against a [`tick::Clock`]. Clones share the same slots.
///
/// # Examples
///
/// ```
/// use querycache_slots::{SharedSlots, SlotBackend, SlotValue};
/// use tick::Clock;
///
/// let slots = SharedSlots::builder(Clock::new_frozen())
///     .slots(4)
///     .slot_capacity(1024)
///     .build();
///
/// assert!(slots.set("key", SlotValue::Bytes(b"v".to_vec()), 60));
/// assert_eq!(slots.get("key"), Some(SlotValue::Bytes(b"v".to_vec())));
/// ```
#[derive(Clone)]
pub struct SharedSlots {
    inner: Arc<Inner>,
}

impl Debug for SharedSlots {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSlots")
            .field("slots", &self.inner.slots.len())
            .field("slot_capacity", &self.inner.slot_capacity)
            .field("admin_auth", &self.inner.admin_auth)
            .finish_non_exhaustive()
    }
}

impl SharedSlots {
    /// Creates a builder whose backend evaluates expiry against `clock`.
    #[must_use]
    pub fn builder(clock: Clock) -> SharedSlotsBuilder {
        SharedSlotsBuilder {
            clock,
            slots: DEFAULT_SLOTS,
            slot_capacity: DEFAULT_SLOT_CAPACITY,
            admin_auth: false,
        }
    }

    fn slot(&self, key: &str) -> &Mutex<Slot> {
        #[expect(clippy::cast_possible_truncation, reason = "slot selection tolerates truncation")]
        let index = (xxh3_64(key.as_bytes()) % self.inner.slots.len() as u64) as usize;
        &self.inner.slots[index]
    }

    fn now(&self) -> SystemTime {
        self.inner.clock.system_time()
    }

    fn expires_at(&self, ttl_secs: u64) -> Option<SystemTime> {
        if ttl_secs == 0 {
            return None;
        }
        self.now().checked_add(Duration::from_secs(ttl_secs))
    }

    fn has_room(&self, slot: &mut Slot, key: &str, now: SystemTime) -> bool {
        if slot.contains_key(key) || slot.len() < self.inner.slot_capacity {
            return true;
        }

        let before = slot.len();
        slot.retain(|_, entry| entry.is_live(now));
        tracing::debug!(
            query_cache.purged = before - slot.len(),
            "query_cache.slot_purged"
        );
        slot.len() < self.inner.slot_capacity
    }
}

impl SlotBackend for SharedSlots {
    fn get(&self, key: &str) -> Option<SlotValue> {
        let now = self.now();
        let mut slot = self.slot(key).lock();
        match slot.get_mut(key) {
            Some(entry) if entry.is_live(now) => {
                entry.hits += 1;
                Some(entry.value.clone())
            }
            Some(_) => {
                slot.remove(key);
                None
            }
            None => None,
        }
    }

    fn set(&self, key: &str, value: SlotValue, ttl_secs: u64) -> bool {
        let now = self.now();
        let expires_at = self.expires_at(ttl_secs);
        let mut slot = self.slot(key).lock();

        if !self.has_room(&mut slot, key, now) {
            tracing::warn!(
                query_cache.key = key,
                query_cache.slot_capacity = self.inner.slot_capacity,
                "query_cache.slot_full"
            );
            return false;
        }

        slot.insert(
            key.to_owned(),
            SlotEntry {
                value,
                ttl_secs,
                expires_at,
                hits: 0,
            },
        );
        true
    }

    fn increment(&self, key: &str, delta: i64) -> Result<i64> {
        let now = self.now();
        let mut slot = self.slot(key).lock();

        if let Some(entry) = slot.get_mut(key).filter(|entry| entry.is_live(now)) {
            let current = entry
                .value
                .as_int()
                .ok_or_else(|| Error::not_numeric(format!("value under '{key}' is not a counter")))?;
            let next = current
                .checked_add(delta)
                .ok_or_else(|| Error::not_numeric(format!("counter under '{key}' overflows")))?;
            entry.value = SlotValue::Int(next);
            return Ok(next);
        }

        if !self.has_room(&mut slot, key, now) {
            return Err(Error::unavailable(format!("slot for '{key}' is full")));
        }

        slot.insert(
            key.to_owned(),
            SlotEntry {
                value: SlotValue::Int(delta),
                ttl_secs: 0,
                expires_at: None,
                hits: 0,
            },
        );
        Ok(delta)
    }

    fn unset(&self, key: &str) -> bool {
        let now = self.now();
        self.slot(key).lock().remove(key).is_some_and(|entry| entry.is_live(now))
    }

    fn clear(&self) {
        for slot in &self.inner.slots {
            slot.lock().clear();
        }
    }

    fn slot_count(&self) -> usize {
        self.inner.slots.len()
    }

    fn list(&self, slot: usize) -> Vec<SlotListing> {
        let Some(slot) = self.inner.slots.get(slot) else {
            return Vec::new();
        };

        let now = self.now();
        slot.lock()
            .iter()
            .filter(|(_, entry)| entry.is_live(now))
            .map(|(name, entry)| SlotListing::new(name.clone(), entry.ttl_secs, entry.hits, entry.value.size()))
            .collect()
    }

    fn admin_auth_enabled(&self) -> bool {
        self.inner.admin_auth
    }
}

/// Builder for [`SharedSlots`].
#[derive(Debug)]
pub struct SharedSlotsBuilder {
    clock: Clock,
    slots: usize,
    slot_capacity: usize,
    admin_auth: bool,
}

impl SharedSlotsBuilder {
    /// Sets the number of slots. Values below one are raised to one.
    #[must_use]
    pub fn slots(mut self, slots: usize) -> Self {
        self.slots = slots.max(1);
        self
    }

    /// Sets the maximum number of entries per slot.
    #[must_use]
    pub fn slot_capacity(mut self, capacity: usize) -> Self {
        self.slot_capacity = capacity;
        self
    }

    /// Locks the listing API behind administrative authentication.
    ///
    /// With this enabled, adapters cannot enumerate keys and bulk deletion fails
    /// with a configuration error.
    #[must_use]
    pub fn admin_auth(mut self, enabled: bool) -> Self {
        self.admin_auth = enabled;
        self
    }

    /// Builds the backend.
    #[must_use]
    pub fn build(self) -> SharedSlots {
        SharedSlots {
            inner: Arc::new(Inner {
                slots: (0..self.slots).map(|_| Mutex::new(Slot::new())).collect(),
                slot_capacity: self.slot_capacity,
                admin_auth: self.admin_auth,
                clock: self.clock,
            }),
        }
    }
}
