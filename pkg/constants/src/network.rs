//! Network-related constants.

/// CIDR range assigned to the single subnet each network component declares.
pub const SUBNET_CIDR: &str = "10.10.0.0/24";

/// NAT configuration: translate the listed subnetworks only.
pub const NAT_SOURCE_RANGES: &str = "LIST_OF_SUBNETWORKS";

/// NAT configuration: let the provider allocate external IPs.
pub const NAT_IP_ALLOCATION: &str = "AUTO_ONLY";
