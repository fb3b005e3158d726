//! IAM role constants.

/// Prefix every provider role identifier must carry.
pub const ROLE_PREFIX: &str = "roles/";

/// Role every cluster service account receives so instances can write
/// metrics to the monitoring console.
pub const METRIC_WRITER_ROLE: &str = "roles/monitoring.metricWriter";

/// Role granted on each secret a cluster reads at boot.
pub const SECRET_ACCESSOR_ROLE: &str = "roles/secretmanager.secretAccessor";
