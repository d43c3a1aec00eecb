use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A named software product. The name is its identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SoftwarePackage {
    pub name: String,
}

impl SoftwarePackage {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for SoftwarePackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// One release of one package, keyed by (package, label).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SoftwareVersion {
    pub package: SoftwarePackage,
    pub name: String,
}

impl SoftwareVersion {
    pub fn new(package: SoftwarePackage, name: impl Into<String>) -> Self {
        Self {
            package,
            name: name.into(),
        }
    }

    /// Whether the label contains `hint`, ignoring case and surrounding whitespace.
    pub fn matches_hint(&self, hint: &str) -> bool {
        let hint = hint.trim().to_lowercase();
        self.name.trim().to_lowercase().contains(&hint)
    }
}

impl fmt::Display for SoftwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.package, self.name)
    }
}

impl Ord for SoftwareVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.package
            .cmp(&other.package)
            .then_with(|| compare_labels(&self.name, &other.name))
    }
}

impl PartialOrd for SoftwareVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compares two version labels.
///
/// Labels that both parse as semver (optionally prefixed with `v`) compare
/// semantically; everything else, and semver ties, fall back to string order
/// so the ordering stays consistent with equality.
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    let semantic = match (parse_label(a), parse_label(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => Ordering::Equal,
    };
    semantic.then_with(|| a.cmp(b))
}

fn parse_label(label: &str) -> Option<semver::Version> {
    let label = label.trim().trim_start_matches('v');
    if let Ok(version) = semver::Version::parse(label) {
        return Some(version);
    }

    // Release labels like "5.4" are common; pad them to three components
    let parts: Vec<&str> = label.split('.').collect();
    if parts.len() < 3 && parts.iter().all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit())) {
        let mut padded = parts.join(".");
        for _ in parts.len()..3 {
            padded.push_str(".0");
        }
        return semver::Version::parse(&padded).ok();
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn version(label: &str) -> SoftwareVersion {
        SoftwareVersion::new(SoftwarePackage::new("WordPress"), label)
    }

    #[test]
    fn test_version_identity() {
        let mut set = HashSet::new();
        set.insert(version("5.4"));
        set.insert(version("5.4"));
        set.insert(SoftwareVersion::new(SoftwarePackage::new("Drupal"), "5.4"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_matches_hint() {
        assert!(version("5.4.1").matches_hint("5.4"));
        assert!(version("v5.4-RC1").matches_hint(" rc1 "));
        assert!(!version("5.3").matches_hint("5.4"));
    }

    #[test]
    fn test_compare_labels_semver() {
        assert_eq!(compare_labels("1.10.0", "1.9.0"), Ordering::Greater);
        assert_eq!(compare_labels("v2.0.0", "1.0.0"), Ordering::Greater);
        assert_eq!(compare_labels("5.4", "5.10"), Ordering::Less);
        assert_eq!(compare_labels("5.4", "5.4.1"), Ordering::Less);
    }

    #[test]
    fn test_compare_labels_fallback() {
        assert_eq!(compare_labels("trunk", "beta"), Ordering::Greater);
        // Semantically equal, textually different
        assert_eq!(compare_labels("v1.0.0", "1.0.0"), Ordering::Greater);
        assert_eq!(compare_labels("1.0", "1.0"), Ordering::Equal);
    }

    #[test]
    fn test_version_sort() {
        let mut versions = vec![version("2.0"), version("1.10"), version("1.2")];
        versions.sort();
        let labels: Vec<&str> = versions.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(labels, vec!["1.2", "1.10", "2.0"]);
    }

    #[test]
    fn test_display() {
        assert_eq!(version("5.4").to_string(), "WordPress 5.4");
    }
}
