use std::collections::BTreeMap;

use anyhow::Result;
use serde::Serialize;

/// Template variables rendered into the instance boot document.
///
/// The output is a cloud-init document for Container-Optimized OS: an
/// env file with the literal variables, a boot-time script that resolves
/// secret access paths into a second env file, and a systemd unit that
/// runs the container with both.
#[derive(Debug, Clone)]
pub struct BootConfig {
    /// Fully qualified image, `repository/path:tag`.
    pub container_image: String,
    /// Registry to authenticate against before pulling.
    pub registry_hostname: String,
    /// Environment variable name → secret access path.
    pub secrets: BTreeMap<String, String>,
    /// Environment variable name → literal value.
    pub environment_vars: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct CloudConfig {
    write_files: Vec<WriteFile>,
    runcmd: Vec<String>,
}

#[derive(Serialize)]
struct WriteFile {
    path: String,
    permissions: String,
    content: String,
}

impl BootConfig {
    /// Render the `#cloud-config` document. Rendering is pure: identical
    /// inputs produce byte-identical output.
    pub fn render(&self) -> Result<String> {
        let doc = CloudConfig {
            write_files: vec![
                WriteFile {
                    path: "/etc/workload/workload.env".to_string(),
                    permissions: "0600".to_string(),
                    content: env_file(&self.environment_vars),
                },
                WriteFile {
                    path: "/var/lib/workload/fetch-secrets.sh".to_string(),
                    permissions: "0755".to_string(),
                    content: self.fetch_secrets_script(),
                },
                WriteFile {
                    path: "/etc/systemd/system/workload.service".to_string(),
                    permissions: "0644".to_string(),
                    content: self.service_unit(),
                },
            ],
            runcmd: vec![
                "systemctl daemon-reload".to_string(),
                "systemctl start workload.service".to_string(),
            ],
        };
        Ok(format!("#cloud-config\n{}", serde_yaml::to_string(&doc)?))
    }

    /// Script resolving each secret access path into `secrets.env`,
    /// authenticated with the instance's service account token.
    fn fetch_secrets_script(&self) -> String {
        let mut script = String::from(
            "#!/bin/sh\nset -eu\numask 077\n: > /etc/workload/secrets.env\n",
        );
        if !self.secrets.is_empty() {
            script.push_str(
                "TOKEN=$(curl -s -H \"Metadata-Flavor: Google\" \
                 \"http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token\" \
                 | cut -d '\"' -f 4)\n",
            );
            for (key, access_path) in &self.secrets {
                script.push_str(&format!(
                    "{key}=$(curl -s -H \"Authorization: Bearer ${{TOKEN}}\" \
                     \"https://secretmanager.googleapis.com/v1/{access_path}:access\" \
                     | grep -o '\"data\": *\"[^\"]*\"' | cut -d '\"' -f 4 | base64 -d)\n\
                     echo \"{key}=${{{key}}}\" >> /etc/workload/secrets.env\n"
                ));
            }
        }
        script
    }

    fn service_unit(&self) -> String {
        format!(
            "[Unit]\n\
             Description=Container workload\n\
             Wants=docker.service\n\
             After=docker.service network-online.target\n\
             \n\
             [Service]\n\
             ExecStartPre=/var/lib/workload/fetch-secrets.sh\n\
             ExecStartPre=/usr/bin/docker-credential-gcr configure-docker --registries={registry}\n\
             ExecStart=/usr/bin/docker run --rm --name=workload \
             --log-driver=gcplogs \
             --env-file=/etc/workload/workload.env \
             --env-file=/etc/workload/secrets.env {image}\n\
             ExecStop=/usr/bin/docker stop workload\n\
             Restart=always\n\
             RestartSec=5\n\
             \n\
             [Install]\n\
             WantedBy=multi-user.target\n",
            registry = self.registry_hostname,
            image = self.container_image,
        )
    }
}

fn env_file(vars: &BTreeMap<String, String>) -> String {
    let mut content = String::new();
    for (key, value) in vars {
        content.push_str(key);
        content.push('=');
        content.push_str(value);
        content.push('\n');
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BootConfig {
        BootConfig {
            container_image: "europe-west4-docker.pkg.dev/p/images/worker:abc123".to_string(),
            registry_hostname: "europe-west4-docker.pkg.dev".to_string(),
            secrets: BTreeMap::from([(
                "WORKER_API_KEY".to_string(),
                "projects/p/secrets/worker-api-key/versions/latest".to_string(),
            )]),
            environment_vars: BTreeMap::from([("LOG_LEVEL".to_string(), "info".to_string())]),
        }
    }

    #[test]
    fn renders_a_parseable_cloud_config() {
        let rendered = sample().render().unwrap();
        let body = rendered.strip_prefix("#cloud-config\n").unwrap();
        let doc: serde_yaml::Value = serde_yaml::from_str(body).unwrap();
        assert_eq!(doc["write_files"].as_sequence().unwrap().len(), 3);
    }

    #[test]
    fn image_and_registry_embedded_in_unit() {
        let rendered = sample().render().unwrap();
        assert!(rendered.contains("worker:abc123"));
        assert!(rendered.contains("--registries=europe-west4-docker.pkg.dev"));
    }

    #[test]
    fn secrets_fetched_by_access_path() {
        let rendered = sample().render().unwrap();
        assert!(rendered.contains("WORKER_API_KEY="));
        assert!(
            rendered.contains("projects/p/secrets/worker-api-key/versions/latest:access")
        );
    }

    #[test]
    fn no_secrets_skips_token_fetch() {
        let mut config = sample();
        config.secrets.clear();
        let rendered = config.render().unwrap();
        assert!(!rendered.contains("TOKEN="));
    }

    #[test]
    fn rendering_is_deterministic() {
        assert_eq!(sample().render().unwrap(), sample().render().unwrap());
    }
}
