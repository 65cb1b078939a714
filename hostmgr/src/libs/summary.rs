//! The state of a single host in the host cache
//!
//! All of a hosts status, lease, accounting and holds live behind a single
//! per host lock. This keeps a status change and the accounting it guards
//! atomic while leaving every other host free to be leased concurrently.

use chrono::prelude::*;
use hashbrown::HashMap;
use parking_lot::Mutex;
use tracing::{Level, event};
use uuid::Uuid;

use crate::models::{
    FilterOutcome, HostFilter, HostStatus, HostSummarySnapshot, Lease, PodEventKind, Resources,
};
use crate::{Error, invalid};

/// The result of trying to lease a single host
#[derive(Debug)]
pub(crate) enum LeaseAttempt {
    /// The host matched and now belongs to the caller
    Leased(Lease),
    /// The host was ready but did not match the filter
    Rejected(FilterOutcome),
    /// The host is not ready so it is not a candidate
    Unavailable,
}

/// The mutable state of a host
#[derive(Debug)]
struct HostState {
    /// The leasing status of this host
    status: HostStatus,
    /// The active lease when this host is placing
    lease: Option<Lease>,
    /// The total resources on this host
    capacity: Resources,
    /// The resources committed to pods on this host
    allocated: Resources,
    /// The resources still free on this host
    available: Resources,
    /// The resources used by each pod on this host
    pods: HashMap<String, Resources>,
    /// The pods this host is held for and when each hold expires
    held: HashMap<String, DateTime<Utc>>,
}

impl HostState {
    /// Rebuild our allocation from our pods and recompute what is available
    ///
    /// # Arguments
    ///
    /// * `hostname` - The host we are the state for
    fn recalculate(&mut self, hostname: &str) {
        // sum the resources for every pod on this host
        self.allocated = self.pods.values().sum();
        // warn if we have allocated more then this host can hold
        if !self.capacity.exceeds(&self.allocated) {
            event!(
                Level::WARN,
                hostname,
                capacity = %self.capacity,
                allocated = %self.allocated,
                msg = "Host is allocated past its capacity"
            );
        }
        // available never drops below zero
        self.available = self.capacity.subtract(&self.allocated);
    }

    /// Make sure a lease id matches our active lease and that we are placing
    ///
    /// # Arguments
    ///
    /// * `lease_id` - The lease id to validate
    fn validate_lease(&self, lease_id: &Uuid) -> Result<(), Error> {
        // make sure this is the active lease
        match &self.lease {
            Some(lease) if lease.id() == lease_id => (),
            _ => return invalid!("host leaseID does not match"),
        }
        // make sure we are still placing
        if self.status != HostStatus::Placing {
            return invalid!("host status is not Placing");
        }
        Ok(())
    }

    /// Drop our lease and make this host ready again
    fn release(&mut self) {
        self.lease = None;
        self.status = HostStatus::Ready;
    }
}

/// A single host in the host cache
///
/// Hosts handed out by the cache are read only views. Every change goes
/// through the [`HostCache`](crate::HostCache) so its pod hold index stays
/// in sync with the holds on each host.
///
/// ```compile_fail
/// use hostmgr::HostCache;
/// use hostmgr::conf::HostCacheConf;
/// use hostmgr::models::Resources;
///
/// let cache = HostCache::new(HostCacheConf::default());
/// cache.add_or_update_host("host-0", Resources::new(10.0, 100.0));
/// cache.hold_for_pods("host-0", &["pod-0"]).unwrap();
/// let host = cache.get("host-0").unwrap();
/// host.release_hold_for_pod("pod-0");
/// ```
#[derive(Debug)]
pub struct HostSummary {
    /// The name of this host
    hostname: String,
    /// The current state of this host
    state: Mutex<HostState>,
}

impl HostSummary {
    /// Create a new ready host with nothing allocated
    ///
    /// # Arguments
    ///
    /// * `hostname` - The name of this host
    /// * `capacity` - The total resources on this host
    pub(crate) fn new<T: Into<String>>(hostname: T, capacity: Resources) -> Self {
        HostSummary {
            hostname: hostname.into(),
            state: Mutex::new(HostState {
                status: HostStatus::Ready,
                lease: None,
                capacity,
                allocated: Resources::default(),
                available: capacity,
                pods: HashMap::default(),
                held: HashMap::default(),
            }),
        }
    }

    /// The name of this host
    #[must_use]
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// The leasing status of this host
    #[must_use]
    pub fn status(&self) -> HostStatus {
        self.state.lock().status
    }

    /// The id of the active lease on this host
    #[must_use]
    pub fn lease_id(&self) -> Option<Uuid> {
        self.state.lock().lease.as_ref().map(|lease| *lease.id())
    }

    /// The total resources on this host
    #[must_use]
    pub fn capacity(&self) -> Resources {
        self.state.lock().capacity
    }

    /// The resources committed to pods on this host
    #[must_use]
    pub fn allocated(&self) -> Resources {
        self.state.lock().allocated
    }

    /// The resources still free on this host
    #[must_use]
    pub fn available(&self) -> Resources {
        self.state.lock().available
    }

    /// Get both our capacity and allocation under one lock
    #[must_use]
    pub fn usage(&self) -> (Resources, Resources) {
        let state = self.state.lock();
        (state.capacity, state.allocated)
    }

    /// Change the total resources on this host
    ///
    /// # Arguments
    ///
    /// * `capacity` - The new total resources on this host
    pub(crate) fn set_capacity(&self, capacity: Resources) {
        let mut state = self.state.lock();
        state.capacity = capacity;
        state.recalculate(&self.hostname);
    }

    /// Try to lease this host if it is ready and matches a filter
    ///
    /// Checking our status, matching the filter and moving to placing all
    /// happen under one lock so only one caller can ever win this host.
    ///
    /// # Arguments
    ///
    /// * `filter` - The filter to match against
    /// * `exclusive_gpu` - Whether gpu hosts only match filters asking for gpus
    /// * `now` - The time to stamp our lease with
    pub(crate) fn try_lease(
        &self,
        filter: &HostFilter,
        exclusive_gpu: bool,
        now: DateTime<Utc>,
    ) -> LeaseAttempt {
        let mut state = self.state.lock();
        // hosts that are already leased are not candidates
        if state.status != HostStatus::Ready {
            return LeaseAttempt::Unavailable;
        }
        // make sure we have enough free resources
        if !state.available.exceeds(&filter.minimum) {
            return LeaseAttempt::Rejected(FilterOutcome::InsufficientResources);
        }
        // keep gpu hosts for pods that need gpus if that is required
        if exclusive_gpu && state.capacity.has_gpu() && !filter.minimum.has_gpu() {
            return LeaseAttempt::Rejected(FilterOutcome::MismatchGpu);
        }
        // this host is ours so mint a lease for it
        let lease = Lease::new(&self.hostname, state.available, now);
        state.status = HostStatus::Placing;
        state.lease = Some(lease.clone());
        LeaseAttempt::Leased(lease)
    }

    /// Commit pods to this host and make it ready again
    ///
    /// # Arguments
    ///
    /// * `lease_id` - The id of the active lease on this host
    /// * `pods` - The pods to commit and the resources each needs
    pub(crate) fn complete_lease(
        &self,
        lease_id: &Uuid,
        pods: &HashMap<String, Resources>,
    ) -> Result<(), Error> {
        let mut state = self.state.lock();
        // make sure the caller owns this host
        state.validate_lease(lease_id)?;
        // make sure every pod asks for a real amount of each resource
        if let Some((pod, _)) = pods.iter().find(|(_, res)| !res.is_valid()) {
            return invalid!("pod {} has negative or non finite resources", pod);
        }
        // make sure none of these pods are already here
        if let Some(pod) = pods.keys().find(|pod| state.pods.contains_key(*pod)) {
            return invalid!("pod {} is already running on host {}", pod, self.hostname);
        }
        // make sure these pods actually fit
        let needed: Resources = pods.values().sum();
        if !state.available.exceeds(&needed) {
            return invalid!(
                "pods need {} but host {} only has {} available",
                needed,
                self.hostname,
                state.available
            );
        }
        // commit these pods
        state
            .pods
            .extend(pods.iter().map(|(pod, res)| (pod.clone(), *res)));
        state.recalculate(&self.hostname);
        state.release();
        Ok(())
    }

    /// Give up our lease on this host without committing anything
    ///
    /// # Arguments
    ///
    /// * `lease_id` - The id of the active lease on this host
    pub(crate) fn terminate_lease(&self, lease_id: &Uuid) -> Result<(), Error> {
        let mut state = self.state.lock();
        // make sure the caller owns this host
        state.validate_lease(lease_id)?;
        state.release();
        Ok(())
    }

    /// Reclaim this host if its lease has been outstanding for too long
    ///
    /// # Arguments
    ///
    /// * `now` - The time to check against
    /// * `timeout` - How long a lease may stay outstanding
    pub(crate) fn reset_expired_lease(
        &self,
        now: DateTime<Utc>,
        timeout: chrono::Duration,
    ) -> bool {
        let mut state = self.state.lock();
        // only placing hosts can have expired leases
        let expired = match (&state.status, &state.lease) {
            (HostStatus::Placing, Some(lease)) => lease.is_expired(now, timeout),
            _ => false,
        };
        if expired {
            state.release();
        }
        expired
    }

    /// Apply a pod event to our accounting
    ///
    /// # Arguments
    ///
    /// * `pod` - The pod this event is for
    /// * `kind` - What happened to this pod
    pub(crate) fn handle_pod_event(&self, pod: &str, kind: &PodEventKind) -> Result<(), Error> {
        let mut state = self.state.lock();
        match kind {
            PodEventKind::Launched(resources) => {
                if !resources.is_valid() {
                    return invalid!(
                        "pod {} on host {} has negative or non finite resources",
                        pod,
                        self.hostname
                    );
                }
                state.pods.insert(pod.to_owned(), *resources);
            }
            PodEventKind::Terminated => {
                // pods we never knew about have nothing to free
                if state.pods.remove(pod).is_none() {
                    return Ok(());
                }
            }
        }
        state.recalculate(&self.hostname);
        Ok(())
    }

    /// Hold this host for a pod until a deadline
    ///
    /// # Arguments
    ///
    /// * `pod` - The pod to hold this host for
    /// * `deadline` - When this hold expires
    pub(crate) fn hold_for_pod(&self, pod: &str, deadline: DateTime<Utc>) {
        self.state.lock().held.insert(pod.to_owned(), deadline);
    }

    /// Release the hold on this host for a pod
    ///
    /// # Arguments
    ///
    /// * `pod` - The pod to release our hold for
    pub(crate) fn release_hold_for_pod(&self, pod: &str) -> bool {
        self.state.lock().held.remove(pod).is_some()
    }

    /// The pods this host is held for and when each hold expires
    #[must_use]
    pub fn held_pods(&self) -> HashMap<String, DateTime<Utc>> {
        self.state.lock().held.clone()
    }

    /// Check if this host is held for a pod
    ///
    /// # Arguments
    ///
    /// * `pod` - The pod to check
    #[must_use]
    pub fn is_held_for(&self, pod: &str) -> bool {
        self.state.lock().held.contains_key(pod)
    }

    /// Clear our holds if every one of them has expired
    ///
    /// Returns the pods whose holds were cleared.
    ///
    /// # Arguments
    ///
    /// * `now` - The time to check against
    pub(crate) fn delete_expired_holds(&self, now: DateTime<Utc>) -> Option<Vec<String>> {
        let mut state = self.state.lock();
        // any live hold keeps every hold on this host
        if state.held.is_empty() || state.held.values().any(|deadline| *deadline > now) {
            return None;
        }
        Some(state.held.drain().map(|(pod, _)| pod).collect())
    }

    /// Take a point in time copy of this host
    #[must_use]
    pub fn snapshot(&self) -> HostSummarySnapshot {
        let state = self.state.lock();
        HostSummarySnapshot {
            hostname: self.hostname.clone(),
            status: state.status,
            capacity: state.capacity,
            allocated: state.allocated,
            available: state.available,
            lease: state.lease.as_ref().map(|lease| *lease.id()),
            held: state
                .held
                .iter()
                .map(|(pod, deadline)| (pod.clone(), *deadline))
                .collect(),
        }
    }
}
