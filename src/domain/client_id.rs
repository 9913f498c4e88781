//! Connected-client identifiers and their allocator.
//!
//! [`ClientId`] is a newtype over `u64` so client identifiers cannot be
//! confused with other counters. [`ClientIdGenerator`] hands them out in
//! issuance order.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

/// Unique identifier for one connected WebSocket client.
///
/// Ordered by issuance: an identifier handed out later always compares
/// greater. Used as the key in [`super::ClientRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(u64);

impl ClientId {
    /// Creates a `ClientId` from a raw value.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Issues strictly increasing [`ClientId`]s, starting at [`Self::FIRST`].
///
/// The read-then-increment happens under one exclusive lock, so concurrent
/// callers never observe duplicates or skipped values.
#[derive(Debug, Default)]
pub struct ClientIdGenerator {
    next: Mutex<u64>,
}

impl ClientIdGenerator {
    /// The first identifier a fresh generator hands out.
    pub const FIRST: ClientId = ClientId(0);

    /// Creates a generator starting at [`Self::FIRST`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next identifier.
    pub fn next_id(&self) -> ClientId {
        // The counter is a plain integer; a poisoned lock still holds a valid value.
        let mut next = self.next.lock().unwrap_or_else(PoisonError::into_inner);
        let id = ClientId(*next);
        *next += 1;
        id
    }
}
