//! The authoritative list of hosts the host cache is rebuilt from

use std::path::Path;
use tracing::{Level, event, instrument};

use super::HostCache;
use crate::Error;
use crate::models::HostSpec;

/// A list of hosts and their capacities
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    /// The hosts in this inventory
    #[serde(default)]
    pub hosts: Vec<HostSpec>,
}

impl Inventory {
    /// Load an inventory from a yaml file
    ///
    /// # Arguments
    ///
    /// * `path` - The path to load this inventory from
    #[instrument(name = "Inventory::from_path", skip_all, err(Display))]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        // read in our inventory file
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    /// Parse an inventory from a yaml string
    ///
    /// # Arguments
    ///
    /// * `raw` - The yaml to parse
    pub fn from_yaml(raw: &str) -> Result<Self, Error> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Add or update every host in this inventory in a host cache
    ///
    /// # Arguments
    ///
    /// * `cache` - The host cache to populate
    pub fn apply(&self, cache: &HostCache) {
        for host in &self.hosts {
            cache.add_or_update_host(&host.hostname, host.capacity);
        }
        event!(Level::INFO, hosts = self.hosts.len(), msg = "Applied host inventory");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::HostCacheConf;
    use crate::models::Resources;

    #[test]
    fn parse_and_apply() {
        let raw = "
hosts:
  - hostname: host-0
    capacity:
      cpu: 10
      mem_mb: 100
  - hostname: host-1
    capacity:
      cpu: 4.5
      mem_mb: 64
      disk_mb: 1000
      gpu: 1
";
        let inventory = Inventory::from_yaml(raw).unwrap();
        assert_eq!(
            inventory.hosts,
            vec![
                HostSpec::new("host-0", Resources::new(10.0, 100.0)),
                HostSpec::new("host-1", Resources::new(4.5, 64.0).disk(1000.0).gpus(1.0)),
            ]
        );
        let cache = HostCache::new(HostCacheConf::default());
        inventory.apply(&cache);
        assert_eq!(cache.len(), 2);
        // applying again only updates capacities
        inventory.apply(&cache);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn bad_inventory() {
        let err = Inventory::from_yaml("hosts: [{hostname: 1}]").unwrap_err();
        assert_eq!(err.kind(), "SerdeYaml");
        let err = Inventory::from_path("/does/not/exist.yml").unwrap_err();
        assert_eq!(err.kind(), "IO");
    }
}
