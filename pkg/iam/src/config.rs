use anyhow::{Context, Result};
use pkg_engine::ResourceRef;
use serde::{Deserialize, Serialize};

/// Role granted on one storage bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketRole {
    /// Slug of the bucket, used as part of the grant resource name.
    pub bucket_slug: String,
    /// The bucket to grant the role for.
    pub bucket: ResourceRef,
    /// Bucket role to grant, e.g. `roles/storage.objectUser`.
    pub role: String,
}

/// Role granted on one managed service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRole {
    /// Slug of the service, used as part of the grant resource name.
    pub service_slug: String,
    /// The service to grant the role for.
    pub service: ResourceRef,
    /// Service role to grant, e.g. `roles/run.invoker`.
    pub role: String,
}

/// Role granted on one artifact registry repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryRole {
    /// Slug of the repository, used as part of the grant resource name.
    pub repository_slug: String,
    /// The repository to grant the role for.
    pub repository: ResourceRef,
    /// Repository role to grant, e.g. `roles/artifactregistry.writer`.
    pub role: String,
}

/// Role granted on one managed secret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretRole {
    /// Slug of the secret, used as part of the grant resource name.
    pub secret_slug: String,
    /// The secret to grant the role for.
    pub secret: ResourceRef,
    /// Secret role to grant, e.g. `roles/secretmanager.secretAccessor`.
    pub role: String,
}

/// Configuration for a service account and its roles.
///
/// Every list is optional; a missing key means no grants of that scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceAccountConfig {
    /// Plain project-level roles.
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub bucket_roles: Vec<BucketRole>,
    #[serde(default)]
    pub service_roles: Vec<ServiceRole>,
    #[serde(default)]
    pub repository_roles: Vec<RepositoryRole>,
    #[serde(default)]
    pub secret_roles: Vec<SecretRole>,
}

impl ServiceAccountConfig {
    /// Normalize the untyped key-mapping form.
    ///
    /// Recognized keys: `roles`, `bucket_roles`, `service_roles`,
    /// `repository_roles`, `secret_roles`. Missing keys default to empty;
    /// unknown keys are rejected. A mapping carrying the same data as a
    /// typed config normalizes to an identical value.
    pub fn from_mapping(mapping: serde_json::Value) -> Result<Self> {
        serde_json::from_value(mapping).context("invalid role configuration mapping")
    }
}

/// Role configuration in either accepted form.
#[derive(Debug, Clone)]
pub enum RoleConfig {
    /// Strongly-typed form.
    Config(ServiceAccountConfig),
    /// Untyped key-mapping form, normalized on use.
    Mapping(serde_json::Value),
}

impl RoleConfig {
    pub fn normalize(self) -> Result<ServiceAccountConfig> {
        match self {
            RoleConfig::Config(config) => Ok(config),
            RoleConfig::Mapping(mapping) => ServiceAccountConfig::from_mapping(mapping),
        }
    }
}

impl From<ServiceAccountConfig> for RoleConfig {
    fn from(config: ServiceAccountConfig) -> Self {
        RoleConfig::Config(config)
    }
}

impl From<serde_json::Value> for RoleConfig {
    fn from(mapping: serde_json::Value) -> Self {
        RoleConfig::Mapping(mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn typed() -> ServiceAccountConfig {
        ServiceAccountConfig {
            roles: vec!["roles/monitoring.metricWriter".into()],
            bucket_roles: vec![BucketRole {
                bucket_slug: "datasets".into(),
                bucket: ResourceRef::new("datasets-bucket"),
                role: "roles/storage.objectUser".into(),
            }],
            secret_roles: vec![SecretRole {
                secret_slug: "api-key".into(),
                secret: ResourceRef::new("api-key"),
                role: "roles/secretmanager.secretAccessor".into(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn mapping_and_typed_forms_normalize_identically() {
        let mapping = json!({
            "roles": ["roles/monitoring.metricWriter"],
            "bucket_roles": [{
                "bucket_slug": "datasets",
                "bucket": "datasets-bucket",
                "role": "roles/storage.objectUser",
            }],
            "secret_roles": [{
                "secret_slug": "api-key",
                "secret": "api-key",
                "role": "roles/secretmanager.secretAccessor",
            }],
        });
        let normalized = RoleConfig::from(mapping).normalize().unwrap();
        assert_eq!(normalized, typed());
    }

    #[test]
    fn missing_keys_default_to_empty() {
        let normalized = ServiceAccountConfig::from_mapping(json!({})).unwrap();
        assert_eq!(normalized, ServiceAccountConfig::default());

        let only_roles =
            ServiceAccountConfig::from_mapping(json!({"roles": ["roles/editor"]})).unwrap();
        assert_eq!(only_roles.roles, vec!["roles/editor"]);
        assert!(only_roles.bucket_roles.is_empty());
        assert!(only_roles.secret_roles.is_empty());
    }

    #[test]
    fn unknown_keys_rejected() {
        let err = ServiceAccountConfig::from_mapping(json!({"bucket_rolez": []})).unwrap_err();
        assert!(err.to_string().contains("invalid role configuration"));
    }

    #[test]
    fn typed_form_survives_serde_round_trip() {
        let config = typed();
        let value = serde_json::to_value(&config).unwrap();
        let back = ServiceAccountConfig::from_mapping(value).unwrap();
        assert_eq!(back, config);
    }
}
