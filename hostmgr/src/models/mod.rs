//! The value types shared by the host cache and its callers

mod filters;
mod hosts;
mod leases;
mod pods;
mod resources;

pub use filters::{FilterOutcome, FilterResult, HostFilter};
pub use hosts::{ClusterCapacity, HostSpec, HostStatus, HostSummarySnapshot};
pub use leases::Lease;
pub use pods::{PodEvent, PodEventKind};
pub use resources::Resources;
