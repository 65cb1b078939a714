//! Leases granting a caller temporary custody of a host

use chrono::prelude::*;
use uuid::Uuid;

use super::Resources;

/// Exclusive custody of a single host by a single caller
///
/// A lease carries no state of its own. It only proves ownership while its
/// id still matches the active lease on the host it was minted for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Lease {
    /// The host this lease is for
    hostname: String,
    /// The id of this lease
    id: Uuid,
    /// The resources that were available on this host when it was leased
    available: Resources,
    /// When this lease was minted
    acquired: DateTime<Utc>,
}

impl Lease {
    /// Mint a new lease for a host
    ///
    /// # Arguments
    ///
    /// * `hostname` - The host this lease is for
    /// * `available` - The resources available on this host right now
    /// * `acquired` - When this lease was minted
    pub(crate) fn new(hostname: &str, available: Resources, acquired: DateTime<Utc>) -> Self {
        Lease {
            hostname: hostname.to_owned(),
            id: Uuid::new_v4(),
            available,
            acquired,
        }
    }

    /// The host this lease is for
    #[must_use]
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// The id of this lease
    #[must_use]
    pub fn id(&self) -> &Uuid {
        &self.id
    }

    /// The resources that were available on this host when it was leased
    #[must_use]
    pub fn available(&self) -> &Resources {
        &self.available
    }

    /// When this lease was minted
    #[must_use]
    pub fn acquired(&self) -> DateTime<Utc> {
        self.acquired
    }

    /// Check if this lease was minted long enough ago to be reclaimed
    ///
    /// # Arguments
    ///
    /// * `now` - The time to check against
    /// * `timeout` - How long a lease may stay outstanding
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>, timeout: chrono::Duration) -> bool {
        // a deadline past the end of time never expires
        match self.acquired.checked_add_signed(timeout) {
            Some(deadline) => deadline < now,
            None => false,
        }
    }
}
