use anyhow::{Result, bail};
use pkg_constants::iam::ROLE_PREFIX;

/// Convert a provider role identifier to a lowercase, hyphen-delimited
/// slug usable inside resource names.
///
/// `roles/iam.serviceAccountUser` → `iam-service-account-user`
///
/// Roles missing the `roles/` prefix are rejected rather than silently
/// producing a degraded slug.
pub fn role_slug(role: &str) -> Result<String> {
    let Some(stripped) = role.strip_prefix(ROLE_PREFIX) else {
        bail!("role '{role}' must start with '{ROLE_PREFIX}'");
    };
    if stripped.is_empty() {
        bail!("role '{role}' names no role");
    }
    let parts: Vec<String> = stripped.split('.').map(kebab_case).collect();
    Ok(parts.join("-"))
}

/// camelCase → kebab-case: hyphen before every internal uppercase letter.
fn kebab_case(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len() + 4);
    for (i, c) in segment.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i != 0 {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
