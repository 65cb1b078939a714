//! The hosts tracked by the host cache

use chrono::prelude::*;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use super::Resources;

/// The leasing status of a host
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum HostStatus {
    /// This host can be leased
    Ready,
    /// This host is leased and waiting to be completed or terminated
    Placing,
}

impl fmt::Display for HostStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HostStatus::Ready => write!(f, "Ready"),
            HostStatus::Placing => write!(f, "Placing"),
        }
    }
}

/// A host as listed in an inventory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostSpec {
    /// The name of this host
    pub hostname: String,
    /// The total resources on this host
    pub capacity: Resources,
}

impl HostSpec {
    /// Create a new host spec
    ///
    /// # Arguments
    ///
    /// * `hostname` - The name of this host
    /// * `capacity` - The total resources on this host
    pub fn new<T: Into<String>>(hostname: T, capacity: Resources) -> Self {
        HostSpec {
            hostname: hostname.into(),
            capacity,
        }
    }
}

/// A point in time copy of a host summary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostSummarySnapshot {
    /// The name of this host
    pub hostname: String,
    /// The leasing status of this host
    pub status: HostStatus,
    /// The total resources on this host
    pub capacity: Resources,
    /// The resources committed to pods on this host
    pub allocated: Resources,
    /// The resources still free on this host
    pub available: Resources,
    /// The id of the active lease on this host if it is placing
    pub lease: Option<Uuid>,
    /// The pods this host is held for and when each hold expires
    pub held: BTreeMap<String, DateTime<Utc>>,
}

/// The total and allocated resources across every host in the cache
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ClusterCapacity {
    /// The sum of every hosts capacity
    pub capacity: Resources,
    /// The sum of every hosts allocation
    pub allocated: Resources,
}
