//! Config file versioning.
//!
//! The first line of `wavescrub.toml` records the release that wrote it:
//! `config_version = "X.Y.Z"`. Comparing it with the running binary tells
//! setup whether the file needs migrating.

use anyhow::anyhow;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::path::Path;

/// Current application version from Cargo.toml
const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A semantic version (major.minor.patch).
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd)]
struct SemanticVersion {
    major: u32,
    minor: u32,
    patch: u32,
}

impl SemanticVersion {
    /// Parses "0.1.0" style strings.
    fn parse(version_str: &str) -> anyhow::Result<Self> {
        let parts: Vec<&str> = version_str.trim().split('.').collect();
        let [major, minor, patch] = parts.as_slice() else {
            return Err(anyhow!(
                "Invalid version format: '{version_str}'. Expected 'major.minor.patch'"
            ));
        };

        let component = |name: &str, value: &str| {
            value
                .parse::<u32>()
                .map_err(|_| anyhow!("Invalid {name} version: '{value}'"))
        };

        Ok(SemanticVersion {
            major: component("major", *major)?,
            minor: component("minor", *minor)?,
            patch: component("patch", *patch)?,
        })
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Extracts the version from the first line of `content`.
///
/// The line must start with `config_version`; a commented-out version does
/// not count.
fn parse_config_version(content: &str) -> anyhow::Result<Option<String>> {
    let Some(first_line) = content.lines().next() else {
        return Ok(None);
    };
    let regex = Regex::new(r#"^\s*config_version\s*=\s*"([^"]+)""#)?;
    Ok(regex.captures(first_line).map(|caps| caps[1].to_string()))
}

/// Returns the version the config file should be migrated from, or `None` if
/// it is missing or already current.
///
/// An unversioned file counts as a legacy config and needs migrating.
///
/// # Errors
/// - If the file cannot be read
/// - If either version string is malformed
pub fn check_setup_needed(config_path: &Path) -> anyhow::Result<Option<String>> {
    if !config_path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(config_path)?;
    let Some(config_version) = parse_config_version(&content)? else {
        return Ok(Some("unknown (legacy config)".to_string()));
    };

    let config_parsed = SemanticVersion::parse(&config_version)?;
    let current_parsed = SemanticVersion::parse(CURRENT_VERSION)?;

    match config_parsed.cmp(&current_parsed) {
        Ordering::Less => Ok(Some(config_version)),
        Ordering::Equal => Ok(None),
        Ordering::Greater => {
            tracing::warn!(
                "Config version {} is newer than app version {}",
                config_parsed,
                current_parsed
            );
            Ok(None)
        }
    }
}

/// Rewrites `content` with the current version as its first line.
fn with_current_version(content: &str) -> String {
    let version_line = format!(r#"config_version = "{CURRENT_VERSION}""#);
    let rest: Vec<&str> = content
        .lines()
        .filter(|line| !line.trim().starts_with("config_version"))
        .collect();

    if rest.is_empty() {
        version_line
    } else {
        format!("{}\n{}", version_line, rest.join("\n"))
    }
}

/// Stamps the config file with the current version, keeping everything else.
///
/// # Errors
/// - If the file cannot be read or written
pub fn update_config_version(config_path: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(config_path)?;
    std::fs::write(config_path, with_current_version(&content))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semantic_version_parse() {
        let v = SemanticVersion::parse("0.1.5").unwrap();
        assert_eq!(v.major, 0);
        assert_eq!(v.minor, 1);
        assert_eq!(v.patch, 5);
        assert_eq!(v.to_string(), "0.1.5");
    }

    #[test]
    fn test_semantic_version_comparison() {
        let v1 = SemanticVersion::parse("0.0.9").unwrap();
        let v2 = SemanticVersion::parse("0.1.0").unwrap();
        let v3 = SemanticVersion::parse("1.0.0").unwrap();

        assert!(v1 < v2);
        assert!(v2 < v3);
        assert_eq!(v1, v1.clone());
    }

    #[test]
    fn test_invalid_version_format() {
        assert!(SemanticVersion::parse("0.1").is_err());
        assert!(SemanticVersion::parse("0.1.0.1").is_err());
        assert!(SemanticVersion::parse("0.x.0").is_err());
    }

    #[test]
    fn test_version_must_be_first_line() {
        let parse = |content: &str| parse_config_version(content).unwrap();
        assert_eq!(
            parse("config_version = \"0.1.0\"\n[player]"),
            Some("0.1.0".to_string())
        );
        assert_eq!(parse("# config_version = \"0.1.0\""), None);
        assert_eq!(parse("[player]\nconfig_version = \"0.1.0\""), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn test_with_current_version_replaces_old_line() {
        let updated = with_current_version("config_version = \"0.0.1\"\n[player]\nautoplay = true");
        let lines: Vec<&str> = updated.lines().collect();
        assert_eq!(lines[0], format!(r#"config_version = "{CURRENT_VERSION}""#));
        assert_eq!(&lines[1..], &["[player]", "autoplay = true"]);
    }

    #[test]
    fn test_legacy_file_needs_setup() {
        let path = std::env::temp_dir().join(format!("wavescrub-legacy-{}.toml", std::process::id()));
        std::fs::write(&path, "[player]\nautoplay = true\n").unwrap();
        assert!(check_setup_needed(&path).unwrap().is_some());

        update_config_version(&path).unwrap();
        assert_eq!(check_setup_needed(&path).unwrap(), None);
        std::fs::remove_file(&path).unwrap();
    }
}
