use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use pkg_constants::compute::{
    AUTOSCALER_COOLDOWN_SECS, BOOT_DISK_SIZE_GB, BOOT_IMAGE, CLOUD_PLATFORM_SCOPE,
    UPDATE_MAX_SURGE,
};
use pkg_constants::iam::{METRIC_WRITER_ROLE, SECRET_ACCESSOR_ROLE};
use pkg_engine::{Input, ResourceDecl, ResourceRef, Stack};
use pkg_iam::{RoleConfig, SecretRole, ServiceAccount, ServiceAccountConfig};
use pkg_network::{Network, NetworkOptions};
use pkg_types::validate::validate_name;
use pkg_types::{ClusterSizingPolicy, ContainerReference};
use serde_json::json;
use tracing::info;

use crate::cloudinit::BootConfig;
use crate::env::{EnvValue, partition_environment};

/// Inputs for one auto-scaling cluster.
#[derive(Debug, Clone)]
pub struct ClusterSpec {
    pub name: String,
    pub container: ContainerReference,
    pub project: String,
    pub region: String,
    pub machine_type: String,
    pub sizing: ClusterSizingPolicy,
    /// Container environment; secret references become boot-time injections.
    pub environment: BTreeMap<String, EnvValue>,
    /// Extra roles for the cluster's service account, in either form.
    pub roles: Option<RoleConfig>,
}

/// An autoscaling pool of interruptible instances running one container.
///
/// Composes a service account (identity and permissions), a private
/// network (placement), and a rendered boot document into an instance
/// template, a regional instance group, and its autoscaler.
#[derive(Debug, Clone)]
pub struct AutoScalingCluster {
    name: String,
    service_account: ServiceAccount,
    network: Network,
    instance_template: ResourceRef,
    instance_group: ResourceRef,
    autoscaler: ResourceRef,
    boot_document: String,
}

impl AutoScalingCluster {
    pub fn declare(stack: &mut Stack, spec: ClusterSpec) -> Result<Self> {
        let name = spec.name.as_str();
        // All caller configuration is checked before the first declaration,
        // so a bad spec leaves the stack untouched.
        validate_name(name)?;
        spec.container.validate()?;
        spec.sizing.validate()?;

        let partitioned = partition_environment(spec.environment);

        // Baseline roles every cluster needs, unioned with caller roles.
        let mut config = match spec.roles {
            Some(roles) => roles.normalize()?,
            None => ServiceAccountConfig::default(),
        };
        let mut merged: BTreeSet<String> = config.roles.iter().cloned().collect();
        merged.insert(METRIC_WRITER_ROLE.to_string());
        config.roles = merged.into_iter().collect();

        // One accessor grant per referenced secret, deduplicated against
        // explicit grants by (secret, role).
        for secret in partitioned.used_secrets() {
            let already = config.secret_roles.iter().any(|grant| {
                &grant.secret == secret.secret() && grant.role == SECRET_ACCESSOR_ROLE
            });
            if !already {
                config.secret_roles.push(SecretRole {
                    secret_slug: secret.resource_name().to_string(),
                    secret: secret.secret().clone(),
                    role: SECRET_ACCESSOR_ROLE.to_string(),
                });
            }
        }

        let service_account = ServiceAccount::declare(stack, name, &spec.project, config)?;
        let network = Network::declare(stack, name, &spec.region, NetworkOptions::default())?;

        let boot = BootConfig {
            container_image: spec.container.qualified(),
            registry_hostname: spec.container.registry_hostname().to_string(),
            secrets: partitioned
                .secrets
                .iter()
                .map(|(key, secret)| (key.clone(), secret.access_path(&spec.project)))
                .collect(),
            environment_vars: partitioned.literals.clone(),
        };
        let boot_document = boot.render()?;

        let mut template_deps = vec![
            service_account.account().clone(),
            network.subnet().clone(),
        ];
        template_deps.extend(partitioned.used_secrets().map(|s| s.version().clone()));

        let instance_template = stack.declare(
            ResourceDecl::new(format!("{name}-template"), "gcp:compute/instance-template")
                .props(json!({
                    "machine_type": &spec.machine_type,
                    "metadata": {
                        "user-data": &boot_document,
                        // Ops agent metrics and OS Login on Container-Optimized OS.
                        "google-monitoring-enabled": "true",
                        "enable-oslogin": "TRUE",
                    },
                    "disks": [{
                        "source_image": BOOT_IMAGE,
                        "auto_delete": true,
                        "boot": true,
                        "disk_size_gb": BOOT_DISK_SIZE_GB,
                    }],
                    "network_interfaces": [{
                        "subnetwork": Input::output(network.subnet().output("self_link")),
                    }],
                    "service_account": {
                        "email": Input::output(service_account.email()),
                        "scopes": [CLOUD_PLATFORM_SCOPE],
                    },
                    // Spot instances; the provider requires this exact
                    // combination of scheduling options.
                    "scheduling": {
                        "provisioning_model": "SPOT",
                        "preemptible": true,
                        "automatic_restart": false,
                        "on_host_maintenance": "TERMINATE",
                        "instance_termination_action": "STOP",
                    },
                }))
                .depends_on(template_deps)
                .parent(name),
        )?;

        let instance_group = stack.declare(
            ResourceDecl::new(
                format!("{name}-mig"),
                "gcp:compute/region-instance-group-manager",
            )
            .props(json!({
                "base_instance_name": name,
                "region": &spec.region,
                "versions": [{
                    "instance_template": Input::output(instance_template.output("self_link")),
                    "name": "primary",
                }],
                "update_policy": {
                    "type": "PROACTIVE",
                    "minimal_action": "REPLACE",
                    "max_surge_fixed": UPDATE_MAX_SURGE,
                    "max_unavailable_fixed": 0,
                },
            }))
            .depends_on([instance_template.clone()])
            .parent(name),
        )?;

        let (min_replicas, max_replicas) = spec.sizing.effective_bounds();
        let autoscaler = stack.declare(
            ResourceDecl::new(format!("{name}-autoscaler"), "gcp:compute/region-autoscaler")
                .props(json!({
                    "target": Input::output(instance_group.output("self_link")),
                    "region": &spec.region,
                    "autoscaling_policy": {
                        "min_replicas": min_replicas,
                        "max_replicas": max_replicas,
                        "cooldown_period": AUTOSCALER_COOLDOWN_SECS,
                        "mode": "ON",
                        "cpu_utilization": {"target": spec.sizing.cpu_target},
                    },
                }))
                .depends_on([instance_group.clone()])
                .parent(name),
        )?;
        info!("declared cluster {name} ({min_replicas}..{max_replicas} replicas)");

        Ok(Self {
            name: name.to_string(),
            service_account,
            network,
            instance_template,
            instance_group,
            autoscaler,
            boot_document,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn service_account(&self) -> &ServiceAccount {
        &self.service_account
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn instance_template(&self) -> &ResourceRef {
        &self.instance_template
    }

    pub fn instance_group(&self) -> &ResourceRef {
        &self.instance_group
    }

    pub fn autoscaler(&self) -> &ResourceRef {
        &self.autoscaler
    }

    /// The rendered boot document injected as instance user-data.
    pub fn boot_document(&self) -> &str {
        &self.boot_document
    }
}
