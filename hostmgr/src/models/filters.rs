//! The filters placement engines use to acquire hosts and the outcomes of them

use hashbrown::HashMap;
use std::fmt;

use super::Resources;

/// A request for hosts with at least some amount of resources available
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HostFilter {
    /// The minimum resources a host must have available to match
    #[serde(default)]
    pub minimum: Resources,
    /// The max number of hosts to return with 0 meaning no limit
    #[serde(default)]
    pub max_hosts: u32,
}

impl HostFilter {
    /// Create a new host filter with no host limit
    ///
    /// # Arguments
    ///
    /// * `minimum` - The minimum resources a host must have available
    #[must_use]
    pub fn new(minimum: Resources) -> Self {
        HostFilter {
            minimum,
            max_hosts: 0,
        }
    }

    /// Limit the number of hosts this filter can match
    ///
    /// # Arguments
    ///
    /// * `max_hosts` - The max number of hosts to match
    #[must_use]
    pub fn max_hosts(mut self, max_hosts: u32) -> Self {
        self.max_hosts = max_hosts;
        self
    }

    /// Check if we have matched as many hosts as this filter allows
    ///
    /// # Arguments
    ///
    /// * `matched` - The number of hosts matched so far
    #[must_use]
    pub fn is_full(&self, matched: usize) -> bool {
        self.max_hosts > 0 && matched >= self.max_hosts as usize
    }
}

/// Why a host did or did not match a filter
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterOutcome {
    /// This host matched and was leased
    Match,
    /// This host does not have enough available resources
    InsufficientResources,
    /// This host has gpus but the filter did not ask for any
    MismatchGpu,
}

impl FilterOutcome {
    /// Get the label for this outcome
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOutcome::Match => "match",
            FilterOutcome::InsufficientResources => "insufficient-resources",
            FilterOutcome::MismatchGpu => "mismatch-gpu",
        }
    }
}

impl fmt::Display for FilterOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The number of hosts that landed in each outcome for one acquisition
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct FilterResult {
    counts: HashMap<FilterOutcome, u32>,
}

impl FilterResult {
    /// Count a host towards an outcome
    ///
    /// # Arguments
    ///
    /// * `outcome` - The outcome to increment
    pub fn incr(&mut self, outcome: FilterOutcome) {
        *self.counts.entry(outcome).or_default() += 1;
    }

    /// Get the number of hosts for an outcome
    ///
    /// # Arguments
    ///
    /// * `outcome` - The outcome to get a count for
    #[must_use]
    pub fn get(&self, outcome: FilterOutcome) -> u32 {
        self.counts.get(&outcome).copied().unwrap_or_default()
    }

    /// The total number of hosts that were classified
    #[must_use]
    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    /// Check if no hosts were classified
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl<const N: usize> From<[(FilterOutcome, u32); N]> for FilterResult {
    fn from(counts: [(FilterOutcome, u32); N]) -> Self {
        FilterResult {
            counts: counts.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_counts() {
        let mut result = FilterResult::default();
        assert!(result.is_empty());
        result.incr(FilterOutcome::Match);
        result.incr(FilterOutcome::Match);
        result.incr(FilterOutcome::InsufficientResources);
        assert_eq!(result.get(FilterOutcome::Match), 2);
        assert_eq!(result.get(FilterOutcome::MismatchGpu), 0);
        assert_eq!(result.total(), 3);
        assert_eq!(
            result,
            FilterResult::from([
                (FilterOutcome::Match, 2),
                (FilterOutcome::InsufficientResources, 1)
            ])
        );
    }

    #[test]
    fn result_labels() {
        let result = FilterResult::from([(FilterOutcome::InsufficientResources, 10)]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json, serde_json::json!({"insufficient-resources": 10}));
        assert_eq!(FilterOutcome::MismatchGpu.to_string(), "mismatch-gpu");
    }

    #[test]
    fn full() {
        let filter = HostFilter::new(Resources::new(1.0, 1.0));
        assert!(!filter.is_full(10_000));
        let filter = filter.max_hosts(2);
        assert!(!filter.is_full(1));
        assert!(filter.is_full(2));
    }
}
