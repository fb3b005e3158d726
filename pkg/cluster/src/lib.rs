//! Auto-scaling cluster component.
//!
//! Composes a service account, a private network, and a generated boot
//! configuration into a horizontally autoscaling pool of interruptible
//! instances running a single container image.

pub mod cloudinit;
pub mod cluster;
pub mod env;

pub use cloudinit::BootConfig;
pub use cluster::{AutoScalingCluster, ClusterSpec};
pub use env::{EnvValue, PartitionedEnv, partition_environment};
