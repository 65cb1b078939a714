mod cache;
mod inventory;
mod summary;
mod sweeper;

pub use cache::HostCache;
pub use inventory::Inventory;
pub use summary::HostSummary;
pub use sweeper::{SweepReport, Sweeper};
