//! The resources a host has or a pod needs

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// The tolerance to use when comparing fractional resource amounts
const EPSILON: f64 = 0.000_001;

/// Check if `left` is less than or equal to `right` within our tolerance
fn less_or_equal(left: f64, right: f64) -> bool {
    left <= right + EPSILON
}

/// Subtract `right` from `left` returning zero for anything below our tolerance
fn clamped_sub(left: f64, right: f64) -> f64 {
    let diff = left - right;
    if diff < EPSILON { 0.0 } else { diff }
}

/// The resources available on a host or required for a pod
///
/// Missing resources deserialize to zero which means no demand for that
/// resource when used as a minimum.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Resources {
    /// The number of cpu cores
    #[serde(default)]
    pub cpu: f64,
    /// The amount of memory in mebibytes
    #[serde(default)]
    pub mem_mb: f64,
    /// The amount of disk in mebibytes
    #[serde(default)]
    pub disk_mb: f64,
    /// The number of gpus
    #[serde(default)]
    pub gpu: f64,
}

impl Resources {
    /// Create a new resources struct without disk or gpus
    ///
    /// # Arguments
    ///
    /// * `cpu` - The number of cpu cores
    /// * `mem_mb` - The amount of memory in mebibytes
    #[must_use]
    pub fn new(cpu: f64, mem_mb: f64) -> Self {
        Resources {
            cpu,
            mem_mb,
            disk_mb: 0.0,
            gpu: 0.0,
        }
    }

    /// Set the amount of disk for these resources
    ///
    /// # Arguments
    ///
    /// * `disk_mb` - The amount of disk in mebibytes
    #[must_use]
    pub fn disk(mut self, disk_mb: f64) -> Self {
        self.disk_mb = disk_mb;
        self
    }

    /// Set the number of gpus for these resources
    ///
    /// # Arguments
    ///
    /// * `gpu` - The number of gpus
    #[must_use]
    pub fn gpus(mut self, gpu: f64) -> Self {
        self.gpu = gpu;
        self
    }

    /// Check if these resources are enough to satisfy a demand
    ///
    /// Every resource in `other` must be less than or equal to ours.
    ///
    /// # Arguments
    ///
    /// * `other` - The resources being demanded
    #[must_use]
    pub fn exceeds(&self, other: &Resources) -> bool {
        // check every resource type against our own
        less_or_equal(other.cpu, self.cpu)
            && less_or_equal(other.mem_mb, self.mem_mb)
            && less_or_equal(other.disk_mb, self.disk_mb)
            && less_or_equal(other.gpu, self.gpu)
    }

    /// Subtract some resources and clamp every resource at zero
    ///
    /// # Arguments
    ///
    /// * `other` - The resources to subtract
    #[must_use]
    pub fn subtract(&self, other: &Resources) -> Self {
        Resources {
            cpu: clamped_sub(self.cpu, other.cpu),
            mem_mb: clamped_sub(self.mem_mb, other.mem_mb),
            disk_mb: clamped_sub(self.disk_mb, other.disk_mb),
            gpu: clamped_sub(self.gpu, other.gpu),
        }
    }

    /// Check if these resources contain any gpus
    #[must_use]
    pub fn has_gpu(&self) -> bool {
        self.gpu > EPSILON
    }

    /// Check that every resource is a finite amount of zero or more
    #[must_use]
    pub fn is_valid(&self) -> bool {
        [self.cpu, self.mem_mb, self.disk_mb, self.gpu]
            .iter()
            .all(|amount| amount.is_finite() && *amount >= 0.0)
    }
}

impl AddAssign for Resources {
    fn add_assign(&mut self, other: Self) {
        // add our resource counts to their respective values
        self.cpu += other.cpu;
        self.mem_mb += other.mem_mb;
        self.disk_mb += other.disk_mb;
        self.gpu += other.gpu;
    }
}

impl Add for Resources {
    type Output = Self;

    /// Add a `Resources` to another `Resources`
    fn add(self, other: Self) -> Self {
        Resources {
            cpu: self.cpu + other.cpu,
            mem_mb: self.mem_mb + other.mem_mb,
            disk_mb: self.disk_mb + other.disk_mb,
            gpu: self.gpu + other.gpu,
        }
    }
}

impl Sum for Resources {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Resources::default(), |acc, res| acc + res)
    }
}

impl<'a> Sum<&'a Resources> for Resources {
    fn sum<I: Iterator<Item = &'a Resources>>(iter: I) -> Self {
        iter.fold(Resources::default(), |acc, res| acc + *res)
    }
}

impl fmt::Display for Resources {
    /// Implement display for Resources
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "cpu: {}, mem: {}Mi, disk: {}Mi, gpu: {}",
            self.cpu, self.mem_mb, self.disk_mb, self.gpu
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exceeds() {
        let host = Resources::new(10.0, 100.0);
        assert!(host.exceeds(&Resources::new(2.0, 2.0)));
        // equal resources are enough
        assert!(host.exceeds(&Resources::new(10.0, 100.0)));
        assert!(!host.exceeds(&Resources::new(10.5, 100.0)));
        assert!(!host.exceeds(&Resources::new(1.0, 100.1)));
        // a missing resource is zero demand
        assert!(host.exceeds(&Resources::default()));
        // but a demand for a resource we lack is not
        assert!(!host.exceeds(&Resources::new(1.0, 1.0).gpus(1.0)));
        assert!(!host.exceeds(&Resources::new(1.0, 1.0).disk(1.0)));
    }

    #[test]
    fn exceeds_tolerates_float_drift() {
        // 0.1 added ten times is not exactly 1.0
        let host: Resources = std::iter::repeat(Resources::new(0.1, 0.1)).take(10).sum();
        assert!(host.exceeds(&Resources::new(1.0, 1.0)));
    }

    #[test]
    fn subtract_clamps() {
        let available = Resources::new(1.0, 10.0).subtract(&Resources::new(2.0, 5.0));
        assert_eq!(available, Resources::new(0.0, 5.0));
        let available = Resources::new(4.0, 10.0).subtract(&Resources::new(1.0, 10.0));
        assert_eq!(available, Resources::new(3.0, 0.0));
    }

    #[test]
    fn add_and_sum() {
        let mut total = Resources::new(1.0, 10.0).gpus(1.0);
        total += Resources::new(2.0, 20.0).disk(5.0);
        assert_eq!(total, Resources::new(3.0, 30.0).disk(5.0).gpus(1.0));
        let pods = [Resources::new(1.0, 10.0), Resources::new(1.0, 10.0)];
        assert_eq!(pods.iter().sum::<Resources>(), Resources::new(2.0, 20.0));
    }

    #[test]
    fn validity() {
        assert!(Resources::default().is_valid());
        assert!(Resources::new(1.5, 10.0).disk(5.0).gpus(1.0).is_valid());
        assert!(!Resources::new(-5.0, 50.0).is_valid());
        assert!(!Resources::new(1.0, 1.0).disk(-0.5).is_valid());
        assert!(!Resources::new(f64::NAN, 1.0).is_valid());
        assert!(!Resources::new(1.0, 1.0).gpus(f64::INFINITY).is_valid());
    }
}
