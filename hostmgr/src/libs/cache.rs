//! The shared index of every host the host manager knows about
//!
//! Lock order is always the host index, then the pod hold index, then a
//! single host. Leasing only takes the host index long enough to copy out
//! the hosts to scan so structural changes never stall placement.

use chrono::prelude::*;
use hashbrown::HashMap;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{Level, event, instrument};
use uuid::Uuid;

use super::summary::{HostSummary, LeaseAttempt};
use crate::conf::HostCacheConf;
use crate::models::{
    ClusterCapacity, FilterOutcome, FilterResult, HostFilter, HostSummarySnapshot, Lease,
    PodEvent, Resources,
};
use crate::{Error, not_found};

/// The shared index of every host and the pods they are held for
#[derive(Debug)]
pub struct HostCache {
    /// The settings for this cache
    conf: HostCacheConf,
    /// Every host we know about by name
    hosts: RwLock<BTreeMap<String, Arc<HostSummary>>>,
    /// The host each held pod is held on
    held: Mutex<HashMap<String, String>>,
    /// Where in our hosts the next acquisition starts scanning
    cursor: AtomicUsize,
}

impl HostCache {
    /// Create a new empty host cache
    ///
    /// # Arguments
    ///
    /// * `conf` - The settings for this cache
    #[must_use]
    pub fn new(conf: HostCacheConf) -> Self {
        HostCache {
            conf,
            hosts: RwLock::new(BTreeMap::default()),
            held: Mutex::new(HashMap::default()),
            cursor: AtomicUsize::new(0),
        }
    }

    /// The settings for this cache
    #[must_use]
    pub fn conf(&self) -> &HostCacheConf {
        &self.conf
    }

    /// The number of hosts in this cache
    #[must_use]
    pub fn len(&self) -> usize {
        self.hosts.read().len()
    }

    /// Check if this cache has no hosts
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hosts.read().is_empty()
    }

    /// Get a host from this cache
    ///
    /// # Arguments
    ///
    /// * `hostname` - The host to get
    #[must_use]
    pub fn get(&self, hostname: &str) -> Option<Arc<HostSummary>> {
        self.hosts.read().get(hostname).cloned()
    }

    /// Register a new host or update the capacity of an existing one
    ///
    /// # Arguments
    ///
    /// * `hostname` - The host to add or update
    /// * `capacity` - The total resources on this host
    #[instrument(name = "HostCache::add_or_update_host", skip(self))]
    pub fn add_or_update_host(&self, hostname: &str, capacity: Resources) {
        let mut hosts = self.hosts.write();
        match hosts.get(hostname) {
            // existing hosts keep their status, lease and holds
            Some(host) => host.set_capacity(capacity),
            None => {
                let host = HostSummary::new(hostname, capacity);
                hosts.insert(hostname.to_owned(), Arc::new(host));
                event!(Level::INFO, hostname, capacity = %capacity, msg = "Added host");
            }
        }
    }

    /// Remove a host from this cache along with any holds on it
    ///
    /// # Arguments
    ///
    /// * `hostname` - The host to remove
    #[instrument(name = "HostCache::remove_host", skip(self), err(Display))]
    pub fn remove_host(&self, hostname: &str) -> Result<(), Error> {
        let mut hosts = self.hosts.write();
        // remove this host if it exists
        if hosts.remove(hostname).is_none() {
            return not_found!("cannot find host {} in cache", hostname);
        }
        // drop any holds pointing at this host
        self.held.lock().retain(|_, held_on| held_on.as_str() != hostname);
        event!(Level::INFO, hostname, msg = "Removed host");
        Ok(())
    }

    /// Copy out our hosts in hostname order
    fn snapshot(&self) -> Vec<Arc<HostSummary>> {
        self.hosts.read().values().cloned().collect()
    }

    /// Copy out our hosts in the order the next acquisition should scan them
    ///
    /// Hosts are scanned in hostname order starting from a cursor that moves
    /// forward once per call so repeated acquisitions spread across hosts.
    fn scan_order(&self) -> Vec<Arc<HostSummary>> {
        let mut hosts = self.snapshot();
        if !hosts.is_empty() {
            // rotate to this acquisitions starting point
            let start = self.cursor.fetch_add(1, Ordering::Relaxed) % hosts.len();
            hosts.rotate_left(start);
        }
        hosts
    }

    /// Lease every ready host that matches a filter up to its host limit
    ///
    /// # Arguments
    ///
    /// * `filter` - The filter to match hosts against
    #[instrument(name = "HostCache::acquire_leases", skip(self))]
    pub fn acquire_leases(&self, filter: &HostFilter) -> (Vec<Lease>, FilterResult) {
        let now = Utc::now();
        let mut leases = Vec::new();
        let mut result = FilterResult::default();
        for host in self.scan_order() {
            // stop once we have as many hosts as were asked for
            if filter.is_full(leases.len()) {
                break;
            }
            match host.try_lease(filter, self.conf.exclusive_gpu, now) {
                LeaseAttempt::Leased(lease) => {
                    result.incr(FilterOutcome::Match);
                    leases.push(lease);
                }
                LeaseAttempt::Rejected(outcome) => result.incr(outcome),
                // leased hosts, including ones another caller just won, are skipped
                LeaseAttempt::Unavailable => (),
            }
        }
        event!(
            Level::DEBUG,
            leased = leases.len(),
            insufficient = result.get(FilterOutcome::InsufficientResources),
            mismatch_gpu = result.get(FilterOutcome::MismatchGpu),
        );
        (leases, result)
    }

    /// Commit pods to a leased host and make it ready again
    ///
    /// Any holds on the committed pods are released.
    ///
    /// # Arguments
    ///
    /// * `hostname` - The host to complete a lease on
    /// * `lease_id` - The id of the active lease on this host
    /// * `pods` - The pods to commit and the resources each needs
    #[instrument(
        name = "HostCache::complete_lease",
        skip(self, pods),
        fields(pods = pods.len()),
        err(Display)
    )]
    pub fn complete_lease(
        &self,
        hostname: &str,
        lease_id: &Uuid,
        pods: &HashMap<String, Resources>,
    ) -> Result<(), Error> {
        let hosts = self.hosts.read();
        // get the host this lease is for
        let host = match hosts.get(hostname) {
            Some(host) => host,
            None => return not_found!("cannot find host {} in cache", hostname),
        };
        host.complete_lease(lease_id, pods)?;
        // these pods are placed so they no longer need their holds
        let mut held = self.held.lock();
        for pod in pods.keys() {
            if let Some(held_on) = held.remove(pod) {
                if let Some(held_host) = hosts.get(&held_on) {
                    held_host.release_hold_for_pod(pod);
                }
            }
        }
        event!(Level::INFO, hostname, lease = %lease_id, msg = "Completed lease");
        Ok(())
    }

    /// Give up a lease on a host without committing anything
    ///
    /// # Arguments
    ///
    /// * `hostname` - The host to terminate a lease on
    /// * `lease_id` - The id of the active lease on this host
    #[instrument(name = "HostCache::terminate_lease", skip(self), err(Display))]
    pub fn terminate_lease(&self, hostname: &str, lease_id: &Uuid) -> Result<(), Error> {
        // get the host this lease is for
        let host = match self.get(hostname) {
            Some(host) => host,
            None => return not_found!("cannot find host {} in cache", hostname),
        };
        host.terminate_lease(lease_id)?;
        event!(Level::INFO, hostname, lease = %lease_id, msg = "Terminated lease");
        Ok(())
    }

    /// Hold a host for some pods moving any existing holds on those pods
    ///
    /// # Arguments
    ///
    /// * `hostname` - The host to hold
    /// * `pods` - The pods to hold this host for
    #[instrument(
        name = "HostCache::hold_for_pods",
        skip(self, pods),
        fields(pods = pods.len()),
        err(Display)
    )]
    pub fn hold_for_pods<T: AsRef<str>>(&self, hostname: &str, pods: &[T]) -> Result<(), Error> {
        let hosts = self.hosts.read();
        // get the host to hold
        let host = match hosts.get(hostname) {
            Some(host) => host,
            None => return not_found!("cannot find host {} in cache", hostname),
        };
        // holds too long to represent last until the end of time
        let deadline = Utc::now()
            .checked_add_signed(self.conf.hold_timeout())
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mut held = self.held.lock();
        for pod in pods {
            let pod = pod.as_ref();
            // a pod can only be held on one host at a time
            if let Some(held_on) = held.get(pod) {
                if held_on != hostname {
                    if let Some(held_host) = hosts.get(held_on) {
                        held_host.release_hold_for_pod(pod);
                    }
                    event!(
                        Level::DEBUG,
                        pod,
                        from = held_on.as_str(),
                        to = hostname,
                        msg = "Moving hold"
                    );
                }
            }
            host.hold_for_pod(pod, deadline);
            held.insert(pod.to_owned(), hostname.to_owned());
        }
        Ok(())
    }

    /// Release the holds on a host for some pods
    ///
    /// Pods that are not held on this host are ignored.
    ///
    /// # Arguments
    ///
    /// * `hostname` - The host to release holds on
    /// * `pods` - The pods to release holds for
    #[instrument(
        name = "HostCache::release_hold_for_pods",
        skip(self, pods),
        fields(pods = pods.len()),
        err(Display)
    )]
    pub fn release_hold_for_pods<T: AsRef<str>>(
        &self,
        hostname: &str,
        pods: &[T],
    ) -> Result<(), Error> {
        let hosts = self.hosts.read();
        // get the host to release holds on
        let host = match hosts.get(hostname) {
            Some(host) => host,
            None => return not_found!("cannot find host {} in cache", hostname),
        };
        let mut held = self.held.lock();
        for pod in pods {
            let pod = pod.as_ref();
            // only release holds that are actually on this host
            if held.get(pod).is_some_and(|held_on| held_on == hostname) {
                held.remove(pod);
                host.release_hold_for_pod(pod);
            }
        }
        Ok(())
    }

    /// Get the host a pod is held on if it is held
    ///
    /// # Arguments
    ///
    /// * `pod` - The pod to look up
    #[must_use]
    pub fn get_host_held_for_pod(&self, pod: &str) -> Option<String> {
        self.held.lock().get(pod).cloned()
    }

    /// Clear the holds on every host whose holds have all expired
    ///
    /// Returns the hosts whose holds were cleared.
    ///
    /// # Arguments
    ///
    /// * `now` - The time to check holds against
    #[instrument(name = "HostCache::reset_expired_held_host_summaries", skip(self))]
    pub fn reset_expired_held_host_summaries(&self, now: DateTime<Utc>) -> Vec<String> {
        let hosts = self.hosts.read();
        let mut held = self.held.lock();
        let mut reset = Vec::new();
        for (hostname, host) in hosts.iter() {
            // skip any hosts that still have live holds
            let Some(pods) = host.delete_expired_holds(now) else {
                continue;
            };
            // drop these pods from our index if they still point here
            for pod in pods {
                if held.get(&pod).is_some_and(|held_on| held_on == hostname) {
                    held.remove(&pod);
                }
            }
            event!(
                Level::INFO,
                hostname = hostname.as_str(),
                msg = "Reset expired holds"
            );
            reset.push(hostname.clone());
        }
        reset
    }

    /// Make any host whose lease has been outstanding too long ready again
    ///
    /// Returns the hosts that were reclaimed.
    ///
    /// # Arguments
    ///
    /// * `now` - The time to check leases against
    #[instrument(name = "HostCache::reset_expired_placing_host_summaries", skip(self))]
    pub fn reset_expired_placing_host_summaries(&self, now: DateTime<Utc>) -> Vec<String> {
        let timeout = self.conf.placing_timeout();
        let mut reset = Vec::new();
        for host in self.snapshot() {
            if host.reset_expired_lease(now, timeout) {
                event!(
                    Level::WARN,
                    hostname = host.hostname(),
                    msg = "Reclaimed expired lease"
                );
                reset.push(host.hostname().to_owned());
            }
        }
        reset
    }

    /// Apply a pod event to the host it happened on
    ///
    /// # Arguments
    ///
    /// * `event` - The pod event to apply
    #[instrument(name = "HostCache::handle_pod_event", skip(self), err(Display))]
    pub fn handle_pod_event(&self, event: &PodEvent) -> Result<(), Error> {
        // get the host this pod is on
        let host = match self.get(&event.hostname) {
            Some(host) => host,
            None => return not_found!("cannot find host {} in cache", event.hostname),
        };
        host.handle_pod_event(&event.pod, &event.kind)
    }

    /// Get the total capacity and allocation across every host
    #[must_use]
    pub fn get_cluster_capacity(&self) -> ClusterCapacity {
        // each host is read on its own so this is not one atomic snapshot
        self.snapshot()
            .iter()
            .fold(ClusterCapacity::default(), |mut total, host| {
                let (capacity, allocated) = host.usage();
                total.capacity += capacity;
                total.allocated += allocated;
                total
            })
    }

    /// Get a copy of every host sorted by hostname
    #[must_use]
    pub fn get_summaries(&self) -> Vec<HostSummarySnapshot> {
        self.hosts
            .read()
            .values()
            .map(|host| host.snapshot())
            .collect()
    }
}
