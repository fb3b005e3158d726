use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Autoscaling bounds for a cluster of instances.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClusterSizingPolicy {
    /// When false the cluster scales to zero regardless of the bounds below.
    pub enabled: bool,
    pub min_replicas: u32,
    pub max_replicas: u32,
    /// Target average CPU utilization, in `(0.0, 1.0]`.
    pub cpu_target: f64,
}

impl ClusterSizingPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.min_replicas > self.max_replicas {
            bail!(
                "min_replicas ({}) must not exceed max_replicas ({})",
                self.min_replicas,
                self.max_replicas
            );
        }
        if !(self.cpu_target > 0.0 && self.cpu_target <= 1.0) {
            bail!(
                "cpu_target must be in (0.0, 1.0], got {}",
                self.cpu_target
            );
        }
        Ok(())
    }

    /// Effective `(min, max)` replica bounds.
    ///
    /// A disabled cluster collapses both bounds to zero so the autoscaler
    /// drives the instance group to empty.
    pub fn effective_bounds(&self) -> (u32, u32) {
        if self.enabled {
            (self.min_replicas, self.max_replicas)
        } else {
            (0, 0)
        }
    }
}
