use pkg_constants::build::{BUILD_MACHINE_TYPE, BUILD_TIMEOUT, BUILDER_IMAGE, LATEST_TAG};
use serde_json::{Value, json};

/// Cloud Build request document for one image build.
///
/// Three sequential steps: warm the layer cache from the previous build,
/// build with inline cache metadata, then push the content tag and
/// re-point `latest` in parallel. Machine type and timeout are fixed.
pub fn build_descriptor(
    hostname: &str,
    project: &str,
    repository: &str,
    name: &str,
    tag: &str,
) -> Value {
    let image = format!("{hostname}/{project}/{repository}/{name}");
    json!({
        "options": {
            "machineType": BUILD_MACHINE_TYPE,
            "env": ["DOCKER_BUILDKIT=1"],
        },
        "steps": [
            {
                "name": BUILDER_IMAGE,
                "entrypoint": "bash",
                "args": [
                    "-c",
                    format!("docker pull {image}:{LATEST_TAG} || true &\nwait"),
                ],
            },
            {
                "name": BUILDER_IMAGE,
                "env": ["DOCKER_BUILDKIT=1"],
                "args": [
                    "build",
                    "-t",
                    format!("{image}:{tag}"),
                    "--cache-from",
                    format!("{image}:{LATEST_TAG}"),
                    "--build-arg",
                    "BUILDKIT_INLINE_CACHE=1",
                    ".",
                ],
            },
            {
                "name": BUILDER_IMAGE,
                "entrypoint": "bash",
                "args": [
                    "-c",
                    format!(
                        "docker push {image}:{tag} &\n\
                         docker tag {image}:{tag} {image}:{LATEST_TAG}\n\
                         docker push {image}:{LATEST_TAG} &\n\
                         wait"
                    ),
                ],
            },
        ],
        "images": [
            format!("{image}:{tag}"),
            format!("{image}:{LATEST_TAG}"),
        ],
        "timeout": BUILD_TIMEOUT,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> Value {
        build_descriptor(
            "europe-west4-docker.pkg.dev",
            "my-project",
            "images",
            "worker",
            "abc123",
        )
    }

    #[test]
    fn images_list_has_exactly_two_entries() {
        let images = descriptor()["images"].as_array().unwrap().clone();
        assert_eq!(
            images,
            vec![
                Value::from("europe-west4-docker.pkg.dev/my-project/images/worker:abc123"),
                Value::from("europe-west4-docker.pkg.dev/my-project/images/worker:latest"),
            ]
        );
    }

    #[test]
    fn three_sequential_steps() {
        let doc = descriptor();
        assert_eq!(doc["steps"].as_array().unwrap().len(), 3);
        assert_eq!(doc["timeout"], "600s");
        assert_eq!(doc["options"]["machineType"], "E2_HIGHCPU_8");
    }

    #[test]
    fn build_step_reuses_latest_as_cache() {
        let doc = descriptor();
        let args = doc["steps"][1]["args"].as_array().unwrap();
        let cache_from = args
            .iter()
            .position(|a| a == "--cache-from")
            .map(|i| &args[i + 1])
            .unwrap();
        assert_eq!(
            cache_from,
            "europe-west4-docker.pkg.dev/my-project/images/worker:latest"
        );
    }
}
