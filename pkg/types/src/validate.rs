use anyhow::{Result, bail};

/// Validate a cloud resource name.
/// Rules: starts with a lowercase letter, then `[a-z0-9-]`, max 63 chars,
/// no trailing hyphen. Generated grant and resource names embed these, so
/// rejecting bad names here keeps every derived name valid too.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("name must not be empty");
    }
    if name.len() > 63 {
        bail!("name '{}' exceeds 63 characters (got {})", name, name.len());
    }
    if !name.chars().next().is_some_and(|c| c.is_ascii_lowercase()) {
        bail!("name '{}' must start with a lowercase letter", name);
    }
    if name.ends_with('-') {
        bail!("name '{}' must not end with a hyphen", name);
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        bail!(
            "name '{}' must contain only lowercase letters, digits, and hyphens [a-z0-9-]",
            name
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        assert!(validate_name("worker").is_ok());
        assert!(validate_name("my-cluster").is_ok());
        assert!(validate_name("app-123").is_ok());
        assert!(validate_name("a").is_ok());
    }

    #[test]
    fn invalid_names() {
        assert!(validate_name("").is_err());
        assert!(validate_name("My-Cluster").is_err());
        assert!(validate_name("my_cluster").is_err());
        assert!(validate_name("1cluster").is_err());
        assert!(validate_name("-leading").is_err());
        assert!(validate_name("trailing-").is_err());
        assert!(validate_name(&"a".repeat(64)).is_err());
    }
}
