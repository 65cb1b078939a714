//! Events about pods running on hosts

use super::Resources;

/// What happened to a pod
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum PodEventKind {
    /// The pod was observed running with these resources
    Launched(Resources),
    /// The pod is gone and its resources are free again
    Terminated,
}

/// An event about a pod on a specific host
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PodEvent {
    /// The host this pod is on
    pub hostname: String,
    /// The id of this pod
    pub pod: String,
    /// What happened to this pod
    pub kind: PodEventKind,
}

impl PodEvent {
    /// Build an event for a pod that was launched
    ///
    /// # Arguments
    ///
    /// * `hostname` - The host this pod is on
    /// * `pod` - The id of this pod
    /// * `resources` - The resources this pod is using
    pub fn launched<H: Into<String>, P: Into<String>>(
        hostname: H,
        pod: P,
        resources: Resources,
    ) -> Self {
        PodEvent {
            hostname: hostname.into(),
            pod: pod.into(),
            kind: PodEventKind::Launched(resources),
        }
    }

    /// Build an event for a pod that terminated
    ///
    /// # Arguments
    ///
    /// * `hostname` - The host this pod was on
    /// * `pod` - The id of this pod
    pub fn terminated<H: Into<String>, P: Into<String>>(hostname: H, pod: P) -> Self {
        PodEvent {
            hostname: hostname.into(),
            pod: pod.into(),
            kind: PodEventKind::Terminated,
        }
    }
}
