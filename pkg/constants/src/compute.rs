//! Compute / autoscaling constants.

/// Boot image for cluster instances (Container-Optimized OS, stable channel).
pub const BOOT_IMAGE: &str = "cos-cloud/cos-stable";

/// Boot disk size in GB.
pub const BOOT_DISK_SIZE_GB: u64 = 20;

/// Seconds the autoscaler waits between scaling actions.
pub const AUTOSCALER_COOLDOWN_SECS: u64 = 60;

/// OAuth scope granted to cluster instances.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Rolling update: extra instances allowed during a rollout.
pub const UPDATE_MAX_SURGE: u64 = 10;
