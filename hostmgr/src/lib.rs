//! The host cache at the core of the host manager
//!
//! Tracks the capacity and allocation of every host in a cluster and leases
//! hosts to placement engines racing to acquire them.

#[macro_use]
extern crate serde_derive;

pub mod conf;
mod error;
mod libs;
pub mod models;
pub mod trace;

pub use conf::Conf;
pub use error::Error;
pub use libs::{HostCache, HostSummary, Inventory, SweepReport, Sweeper};
