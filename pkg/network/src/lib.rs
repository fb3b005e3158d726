//! Private network component.

use anyhow::Result;
use pkg_constants::network::{NAT_IP_ALLOCATION, NAT_SOURCE_RANGES, SUBNET_CIDR};
use pkg_engine::{Input, ResourceDecl, ResourceRef, Stack};
use pkg_types::validate::validate_name;
use serde_json::json;
use tracing::debug;

/// Switches for the optional halves of a network component.
#[derive(Debug, Clone, Copy)]
pub struct NetworkOptions {
    /// Let instances reach provider APIs over internal addresses, so
    /// storage access does not incur egress charges.
    pub private_google_access: bool,
    /// Declare a router plus NAT for outbound internet access.
    pub internet_access: bool,
}

impl Default for NetworkOptions {
    fn default() -> Self {
        Self {
            private_google_access: true,
            internet_access: true,
        }
    }
}

/// A private network with one subnet and optional outbound NAT routing.
#[derive(Debug, Clone)]
pub struct Network {
    name: String,
    network: ResourceRef,
    subnet: ResourceRef,
    router: Option<ResourceRef>,
    nat: Option<ResourceRef>,
}

impl Network {
    /// Declare the network, its subnet, and (optionally) router plus NAT.
    pub fn declare(
        stack: &mut Stack,
        name: &str,
        region: &str,
        options: NetworkOptions,
    ) -> Result<Self> {
        validate_name(name)?;

        let network = stack.declare(
            ResourceDecl::new(format!("{name}-network"), "gcp:compute/network")
                .props(json!({
                    "name": format!("{name}-network"),
                    "auto_create_subnetworks": false,
                }))
                .parent(name),
        )?;
        let subnet = stack.declare(
            ResourceDecl::new(format!("{name}-subnet"), "gcp:compute/subnetwork")
                .props(json!({
                    "name": format!("{name}-subnet"),
                    "ip_cidr_range": SUBNET_CIDR,
                    "network": Input::output(network.output("self_link")),
                    "region": region,
                    "private_ip_google_access": options.private_google_access,
                }))
                .depends_on([network.clone()])
                .parent(name),
        )?;

        let mut router = None;
        let mut nat = None;
        if options.internet_access {
            let router_ref = stack.declare(
                ResourceDecl::new(format!("{name}-router"), "gcp:compute/router")
                    .props(json!({
                        "name": format!("{name}-router"),
                        "network": Input::output(network.output("self_link")),
                        "region": region,
                    }))
                    .depends_on([network.clone()])
                    .parent(name),
            )?;
            nat = Some(stack.declare(
                ResourceDecl::new(format!("{name}-nat"), "gcp:compute/router-nat")
                    .props(json!({
                        "name": format!("{name}-nat"),
                        "router": Input::output(router_ref.output("name")),
                        "region": region,
                        "source_subnetwork_ip_ranges_to_nat": NAT_SOURCE_RANGES,
                        "subnetworks": [{
                            "name": Input::output(subnet.output("id")),
                            "source_ip_ranges_to_nats": ["ALL_IP_RANGES"],
                        }],
                        "nat_ip_allocate_option": NAT_IP_ALLOCATION,
                    }))
                    .depends_on([router_ref.clone()])
                    .parent(name),
            )?);
            router = Some(router_ref);
        }
        debug!("declared network {name} (internet_access={})", options.internet_access);

        Ok(Self {
            name: name.to_string(),
            network,
            subnet,
            router,
            nat,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn network(&self) -> &ResourceRef {
        &self.network
    }

    pub fn subnet(&self) -> &ResourceRef {
        &self.subnet
    }

    pub fn router(&self) -> Option<&ResourceRef> {
        self.router.as_ref()
    }

    pub fn nat(&self) -> Option<&ResourceRef> {
        self.nat.as_ref()
    }
}
