//! Tests holding hosts for pods

use chrono::prelude::*;
use hashbrown::HashMap;

use hostmgr::conf::HostCacheConf;
use hostmgr::models::{HostFilter, Resources};
use hostmgr::{Error, HostCache};

/// Build a cache with a few hosts in it
fn generate_cache() -> HostCache {
    let cache = HostCache::new(HostCacheConf::default());
    for i in 0..3 {
        cache.add_or_update_host(&format!("host-{i}"), Resources::new(10.0, 100.0));
    }
    cache
}

/// A time safely after any hold placed now has expired
fn after_hold_timeout(cache: &HostCache) -> DateTime<Utc> {
    Utc::now() + cache.conf().hold_timeout() + chrono::Duration::seconds(1)
}

#[test]
fn hold_for_pods() -> Result<(), Error> {
    let cache = generate_cache();
    cache.hold_for_pods("host-0", &["pod-0", "pod-1"])?;
    assert_eq!(cache.get_host_held_for_pod("pod-0"), Some("host-0".to_owned()));
    assert_eq!(cache.get_host_held_for_pod("pod-1"), Some("host-0".to_owned()));
    assert_eq!(cache.get_host_held_for_pod("pod-2"), None);
    let host = cache.get("host-0").expect("host is missing");
    assert!(host.is_held_for("pod-0"));
    assert_eq!(host.held_pods().len(), 2);
    // holding a missing host fails
    let err = cache.hold_for_pods("missing-host", &["pod-0"]).unwrap_err();
    assert!(err.is_not_found());
    Ok(())
}

#[test]
fn holds_are_exclusive() -> Result<(), Error> {
    let cache = generate_cache();
    cache.hold_for_pods("host-0", &["pod-0"])?;
    // holding the same pod elsewhere moves its hold
    cache.hold_for_pods("host-1", &["pod-0"])?;
    assert_eq!(cache.get_host_held_for_pod("pod-0"), Some("host-1".to_owned()));
    let old = cache.get("host-0").expect("host is missing");
    assert!(!old.is_held_for("pod-0"));
    assert!(old.held_pods().is_empty());
    let new = cache.get("host-1").expect("host is missing");
    assert!(new.is_held_for("pod-0"));
    // holding the same pod twice on one host is harmless
    cache.hold_for_pods("host-1", &["pod-0"])?;
    assert_eq!(new.held_pods().len(), 1);
    Ok(())
}

#[test]
fn release_hold_for_pods() -> Result<(), Error> {
    let cache = generate_cache();
    cache.hold_for_pods("host-0", &["pod-0", "pod-1"])?;
    cache.hold_for_pods("host-1", &["pod-2"])?;
    // pods held elsewhere are left alone
    cache.release_hold_for_pods("host-0", &["pod-0", "pod-2"])?;
    assert_eq!(cache.get_host_held_for_pod("pod-0"), None);
    assert_eq!(cache.get_host_held_for_pod("pod-1"), Some("host-0".to_owned()));
    assert_eq!(cache.get_host_held_for_pod("pod-2"), Some("host-1".to_owned()));
    // releasing pods that were never held is a no-op
    cache.release_hold_for_pods("host-2", &["pod-9"])?;
    let err = cache
        .release_hold_for_pods("missing-host", &["pod-1"])
        .unwrap_err();
    assert!(err.is_not_found());
    Ok(())
}

#[test]
fn reset_expired_holds() -> Result<(), Error> {
    let cache = generate_cache();
    cache.hold_for_pods("host-0", &["pod-0", "pod-1"])?;
    // nothing has expired yet
    assert!(cache.reset_expired_held_host_summaries(Utc::now()).is_empty());
    assert_eq!(cache.get_host_held_for_pod("pod-0"), Some("host-0".to_owned()));
    // every hold on this host has expired
    let reset = cache.reset_expired_held_host_summaries(after_hold_timeout(&cache));
    assert_eq!(reset, vec!["host-0".to_owned()]);
    assert_eq!(cache.get_host_held_for_pod("pod-0"), None);
    assert_eq!(cache.get_host_held_for_pod("pod-1"), None);
    let host = cache.get("host-0").expect("host is missing");
    assert!(host.held_pods().is_empty());
    // a second sweep has nothing left to do
    let reset = cache.reset_expired_held_host_summaries(after_hold_timeout(&cache));
    assert!(reset.is_empty());
    Ok(())
}

#[test]
fn live_holds_keep_host_held() -> Result<(), Error> {
    // holds only last a second so we can place one before the other expires
    let conf = HostCacheConf {
        hold_timeout: 1,
        ..HostCacheConf::default()
    };
    let cache = HostCache::new(conf);
    cache.add_or_update_host("host-0", Resources::new(10.0, 100.0));
    cache.hold_for_pods("host-0", &["pod-0"])?;
    let first_deadline = cache.get("host-0").expect("host is missing").held_pods()["pod-0"];
    // refresh a second pod so its deadline is later than the first
    std::thread::sleep(std::time::Duration::from_millis(50));
    cache.hold_for_pods("host-0", &["pod-1"])?;
    // once only the first hold has expired the host stays held for both pods
    let now = first_deadline + chrono::Duration::milliseconds(1);
    let reset = cache.reset_expired_held_host_summaries(now);
    assert!(reset.is_empty());
    assert_eq!(cache.get_host_held_for_pod("pod-0"), Some("host-0".to_owned()));
    assert_eq!(cache.get_host_held_for_pod("pod-1"), Some("host-0".to_owned()));
    Ok(())
}

#[test]
fn completing_lease_releases_holds() -> Result<(), Error> {
    let cache = generate_cache();
    cache.hold_for_pods("host-1", &["pod-0", "pod-1"])?;
    let filter = HostFilter::new(Resources::new(1.0, 1.0)).max_hosts(1);
    let (leases, _) = cache.acquire_leases(&filter);
    let lease = &leases[0];
    // place one of the held pods wherever we got a lease
    let pods = HashMap::from([("pod-0".to_owned(), Resources::new(1.0, 1.0))]);
    cache.complete_lease(lease.hostname(), lease.id(), &pods)?;
    assert_eq!(cache.get_host_held_for_pod("pod-0"), None);
    assert_eq!(cache.get_host_held_for_pod("pod-1"), Some("host-1".to_owned()));
    let host = cache.get("host-1").expect("host is missing");
    assert!(!host.is_held_for("pod-0"));
    Ok(())
}

#[test]
fn removing_host_drops_holds() -> Result<(), Error> {
    let cache = generate_cache();
    cache.hold_for_pods("host-2", &["pod-0"])?;
    cache.remove_host("host-2")?;
    assert_eq!(cache.get_host_held_for_pod("pod-0"), None);
    // the pod can be held somewhere else now
    cache.hold_for_pods("host-0", &["pod-0"])?;
    assert_eq!(cache.get_host_held_for_pod("pod-0"), Some("host-0".to_owned()));
    Ok(())
}

#[test]
fn huge_hold_timeout_never_expires() -> Result<(), Error> {
    let conf = HostCacheConf {
        hold_timeout: u64::MAX,
        ..HostCacheConf::default()
    };
    let cache = HostCache::new(conf);
    cache.add_or_update_host("host-0", Resources::new(10.0, 100.0));
    cache.hold_for_pods("host-0", &["pod-0"])?;
    let later = Utc::now() + chrono::Duration::days(365 * 1000);
    assert!(cache.reset_expired_held_host_summaries(later).is_empty());
    assert_eq!(cache.get_host_held_for_pod("pod-0"), Some("host-0".to_owned()));
    Ok(())
}
