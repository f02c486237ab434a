// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use querycache_store::{Payload, Result};

/// A value held by a slot backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlotValue {
    /// A counter maintained by [`SlotBackend::increment`].
    Int(i64),
    /// An opaque payload.
    Bytes(Payload),
}

impl SlotValue {
    /// Converts the value into payload bytes. Counters become their decimal text.
    #[must_use]
    pub fn into_payload(self) -> Payload {
        match self {
            Self::Int(n) => n.to_string().into_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }

    /// Returns the value as a counter, if it is one or holds decimal text.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Bytes(bytes) => std::str::from_utf8(bytes).ok()?.trim().parse().ok(),
        }
    }

    /// Returns the stored size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            Self::Int(_) => size_of::<i64>(),
            Self::Bytes(bytes) => bytes.len(),
        }
    }
}

/// One live entry reported by [`SlotBackend::list`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct SlotListing {
    /// The full key, as stored.
    pub name: String,
    /// The TTL the entry was written with, in seconds. Zero means it never expires.
    pub ttl_secs: u64,
    /// Number of reads that found the entry.
    pub hits: u64,
    /// Stored size in bytes.
    pub size: usize,
}

impl SlotListing {
    /// Creates a listing entry.
    #[must_use]
    pub fn new(name: impl Into<String>, ttl_secs: u64, hits: u64, size: usize) -> Self {
        Self {
            name: name.into(),
            ttl_secs,
            hits,
            size,
        }
    }
}

/// A fixed-size, TTL-aware key/value cache split into slots.
///
/// The contract mirrors shared-memory opcode caches: synchronous calls, a
/// per-key TTL in whole seconds where zero means "never expire", and a listing
/// API that may be locked behind administrative authentication.
pub trait SlotBackend: Send + Sync {
    /// Returns the live value under `key`.
    fn get(&self, key: &str) -> Option<SlotValue>;

    /// Stores `value` under `key`. Returns `false` if the backend refused the
    /// write, for example because the target slot is full.
    fn set(&self, key: &str, value: SlotValue, ttl_secs: u64) -> bool;

    /// Atomically adds `delta` to the counter under `key` and returns the new
    /// value. A missing key starts at zero and never expires.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotNumeric`](querycache_store::ErrorKind::NotNumeric)
    /// if the stored value is not a counter or the result overflows.
    fn increment(&self, key: &str, delta: i64) -> Result<i64>;

    /// Removes `key`. Returns `true` if a live entry was removed.
    fn unset(&self, key: &str) -> bool;

    /// Removes every entry in every slot.
    fn clear(&self);

    /// Returns the number of slots.
    fn slot_count(&self) -> usize;

    /// Lists the live entries of `slot`. Out-of-range slots list nothing.
    fn list(&self, slot: usize) -> Vec<SlotListing>;

    /// Returns `true` if the listing API requires administrative authentication,
    /// in which case it cannot be used by the adapter.
    fn admin_auth_enabled(&self) -> bool;
}
