use anyhow::Result;
use pkg_engine::{Input, OutputRef, ResourceDecl, ResourceRef, Stack};
use pkg_types::validate::validate_name;
use serde_json::json;
use tracing::debug;

use crate::config::{RoleConfig, ServiceAccountConfig};
use crate::slug::role_slug;

/// A service account identity plus one grant resource per configured role.
///
/// The identity and grants are fixed at declaration time; grant names are
/// derived from the account name, the scope slug, and the role slug, and
/// the stack rejects any collision.
#[derive(Debug, Clone)]
pub struct ServiceAccount {
    name: String,
    account: ResourceRef,
    grants: Vec<ResourceRef>,
}

impl ServiceAccount {
    /// Declare the identity and all grants from a normalized config.
    pub fn declare(
        stack: &mut Stack,
        name: &str,
        project: &str,
        config: ServiceAccountConfig,
    ) -> Result<Self> {
        validate_name(name)?;

        // Resolve every role slug first, so a malformed role fails the
        // whole declaration before any resource is recorded.
        let project_slugs: Vec<String> = config
            .roles
            .iter()
            .map(|role| role_slug(role))
            .collect::<Result<_>>()?;
        let bucket_slugs: Vec<String> = config
            .bucket_roles
            .iter()
            .map(|grant| role_slug(&grant.role))
            .collect::<Result<_>>()?;
        let service_slugs: Vec<String> = config
            .service_roles
            .iter()
            .map(|grant| role_slug(&grant.role))
            .collect::<Result<_>>()?;
        let repository_slugs: Vec<String> = config
            .repository_roles
            .iter()
            .map(|grant| role_slug(&grant.role))
            .collect::<Result<_>>()?;
        let secret_slugs: Vec<String> = config
            .secret_roles
            .iter()
            .map(|grant| role_slug(&grant.role))
            .collect::<Result<_>>()?;

        let account = stack.declare(
            ResourceDecl::new(format!("{name}-service-account"), "gcp:serviceaccount/account")
                .props(json!({
                    "account_id": name,
                    "display_name": format!("Cumulus {name} service account"),
                    "project": project,
                }))
                .parent(name),
        )?;
        // `member` resolves to "serviceAccount:{email}" once the identity exists.
        let member = Input::output(account.output("member"));

        let mut grants = Vec::new();
        for (role, slug) in config.roles.iter().zip(&project_slugs) {
            grants.push(stack.declare(
                ResourceDecl::new(format!("{name}-role-{slug}"), "gcp:projects/iam-member")
                    .props(json!({
                        "project": project,
                        "role": role,
                        "member": member.clone(),
                    }))
                    .depends_on([account.clone()])
                    .parent(name),
            )?);
        }
        for (grant, slug) in config.bucket_roles.iter().zip(&bucket_slugs) {
            grants.push(stack.declare(
                ResourceDecl::new(
                    format!("{name}-bucket-{}-role-{slug}", grant.bucket_slug),
                    "gcp:storage/bucket-iam-member",
                )
                .props(json!({
                    "bucket": Input::output(grant.bucket.output("name")),
                    "role": &grant.role,
                    "member": member.clone(),
                }))
                .depends_on([account.clone(), grant.bucket.clone()])
                .parent(name),
            )?);
        }
        for (grant, slug) in config.service_roles.iter().zip(&service_slugs) {
            grants.push(stack.declare(
                ResourceDecl::new(
                    format!("{name}-service-{}-role-{slug}", grant.service_slug),
                    "gcp:cloudrun/iam-member",
                )
                .props(json!({
                    "service": Input::output(grant.service.output("name")),
                    "role": &grant.role,
                    "member": member.clone(),
                }))
                .depends_on([account.clone(), grant.service.clone()])
                .parent(name),
            )?);
        }
        for (grant, slug) in config.repository_roles.iter().zip(&repository_slugs) {
            grants.push(stack.declare(
                ResourceDecl::new(
                    format!("{name}-repository-{}-role-{slug}", grant.repository_slug),
                    "gcp:artifactregistry/repository-iam-member",
                )
                .props(json!({
                    "project": Input::output(grant.repository.output("project")),
                    "location": Input::output(grant.repository.output("location")),
                    "repository": Input::output(grant.repository.output("name")),
                    "role": &grant.role,
                    "member": member.clone(),
                }))
                .depends_on([account.clone(), grant.repository.clone()])
                .parent(name),
            )?);
        }
        for (grant, slug) in config.secret_roles.iter().zip(&secret_slugs) {
            grants.push(stack.declare(
                ResourceDecl::new(
                    format!("{name}-secret-{}-role-{slug}", grant.secret_slug),
                    "gcp:secretmanager/secret-iam-member",
                )
                .props(json!({
                    "secret_id": Input::output(grant.secret.output("id")),
                    "role": &grant.role,
                    "member": member.clone(),
                }))
                .depends_on([account.clone(), grant.secret.clone()])
                .parent(name),
            )?);
        }
        debug!("declared service account {name} with {} grants", grants.len());

        Ok(Self {
            name: name.to_string(),
            account,
            grants,
        })
    }

    /// Create a service account from a config in either form.
    /// `None` declares the bare identity with no extra grants.
    pub fn from_config(
        stack: &mut Stack,
        name: &str,
        project: &str,
        config: Option<RoleConfig>,
    ) -> Result<Self> {
        let config = match config {
            Some(config) => config.normalize()?,
            None => ServiceAccountConfig::default(),
        };
        Self::declare(stack, name, project, config)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn account(&self) -> &ResourceRef {
        &self.account
    }

    /// Deferred account email, resolved at apply time.
    pub fn email(&self) -> OutputRef {
        self.account.output("email")
    }

    pub fn grants(&self) -> &[ResourceRef] {
        &self.grants
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BucketRole, SecretRole};
    use serde_json::json;

    #[test]
    fn bare_identity_from_empty_config() {
        let mut stack = Stack::new("test");
        let sa = ServiceAccount::from_config(&mut stack, "worker", "my-project", None).unwrap();
        assert_eq!(stack.len(), 1);
        assert!(sa.grants().is_empty());
        assert_eq!(sa.account().name(), "worker-service-account");
    }

    #[test]
    fn plain_roles_get_project_grants() {
        let mut stack = Stack::new("test");
        let config = ServiceAccountConfig {
            roles: vec!["roles/monitoring.metricWriter".into()],
            ..Default::default()
        };
        let sa = ServiceAccount::declare(&mut stack, "worker", "my-project", config).unwrap();
        assert_eq!(sa.grants().len(), 1);

        let grant = stack
            .get("worker-role-monitoring-metric-writer")
            .expect("grant name derived from role slug");
        assert_eq!(grant.props["role"], "roles/monitoring.metricWriter");
        assert_eq!(grant.props["project"], "my-project");
        assert_eq!(grant.depends_on, vec![sa.account().clone()]);
        assert_eq!(
            grant.props["member"]["output"]["resource"],
            "worker-service-account"
        );
    }

    #[test]
    fn scoped_grant_names_embed_scope_and_slugs() {
        let mut stack = Stack::new("test");
        let config = ServiceAccountConfig {
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
        };
        ServiceAccount::declare(&mut stack, "worker", "my-project", config).unwrap();

        let bucket_grant = stack
            .get("worker-bucket-datasets-role-storage-object-user")
            .unwrap();
        assert_eq!(bucket_grant.depends_on.len(), 2);

        let secret_grant = stack
            .get("worker-secret-api-key-role-secretmanager-secret-accessor")
            .unwrap();
        assert_eq!(
            secret_grant.props["secret_id"]["output"]["resource"],
            "api-key"
        );
    }

    #[test]
    fn mapping_form_declares_the_same_grants() {
        let declare = |config: Option<RoleConfig>| {
            let mut stack = Stack::new("test");
            ServiceAccount::from_config(&mut stack, "worker", "my-project", config).unwrap();
            stack.manifest().unwrap()
        };
        let typed = ServiceAccountConfig {
            roles: vec!["roles/editor".into()],
            secret_roles: vec![SecretRole {
                secret_slug: "api-key".into(),
                secret: ResourceRef::new("api-key"),
                role: "roles/secretmanager.secretAccessor".into(),
            }],
            ..Default::default()
        };
        let mapping = json!({
            "roles": ["roles/editor"],
            "secret_roles": [{
                "secret_slug": "api-key",
                "secret": "api-key",
                "role": "roles/secretmanager.secretAccessor",
            }],
        });
        assert_eq!(
            declare(Some(typed.into())),
            declare(Some(mapping.into()))
        );
    }

    #[test]
    fn malformed_role_fails_before_any_declaration() {
        let mut stack = Stack::new("test");
        let config = ServiceAccountConfig {
            roles: vec!["monitoring.metricWriter".into()],
            ..Default::default()
        };
        let err = ServiceAccount::declare(&mut stack, "worker", "my-project", config).unwrap_err();
        assert!(err.to_string().contains("must start with 'roles/'"));
        assert!(stack.is_empty());
    }

    #[test]
    fn duplicate_slug_and_role_collide() {
        let mut stack = Stack::new("test");
        let config = ServiceAccountConfig {
            secret_roles: vec![
                SecretRole {
                    secret_slug: "api-key".into(),
                    secret: ResourceRef::new("api-key"),
                    role: "roles/secretmanager.secretAccessor".into(),
                },
                SecretRole {
                    secret_slug: "api-key".into(),
                    secret: ResourceRef::new("api-key"),
                    role: "roles/secretmanager.secretAccessor".into(),
                },
            ],
            ..Default::default()
        };
        assert!(ServiceAccount::declare(&mut stack, "worker", "my-project", config).is_err());
    }
}
