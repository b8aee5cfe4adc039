//! Unique identifiers for connections, statements and transactions.
//!
//! One ID is generated when a decorated object is created and attached to
//! every log event from that object and its children, so related events can
//! be correlated.

use std::sync::Mutex;

use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};

use crate::error::ConfigError;

/// Number of random bytes per ID; rendered as twice as many hex chars.
const UID_BYTES: usize = 8;

/// Source of unique IDs. An empty string means "no ID" and the field is
/// left out of the log event.
pub trait UidGenerator: Send + Sync {
    fn unique_id(&self) -> String;
}

/// Random hex IDs from a generator seeded by the operating system.
pub struct RandomUid {
    rng: Mutex<StdRng>,
}

impl RandomUid {
    /// Seed from the OS entropy source.
    ///
    /// # Errors
    /// Returns `ConfigError::EntropyUnavailable` when the OS cannot provide a
    /// seed. This is the only point where ID generation can fail.
    pub fn new() -> Result<Self, ConfigError> {
        let rng = StdRng::from_rng(OsRng).map_err(|e| ConfigError::EntropyUnavailable {
            message: e.to_string(),
        })?;
        Ok(Self {
            rng: Mutex::new(rng),
        })
    }

    /// Deterministic generator for tests.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl UidGenerator for RandomUid {
    fn unique_id(&self) -> String {
        let mut bytes = [0u8; UID_BYTES];
        // A poisoned lock still holds a usable generator.
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

/// Produces no IDs; ID fields are omitted from every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullUid;

impl UidGenerator for NullUid {
    fn unique_id(&self) -> String {
        String::new()
    }
}
