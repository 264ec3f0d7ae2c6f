use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static SEMVER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.(\d+)\.(\d+)").expect("valid semver regex"));

/// How far a dependency moved between two lock snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateType {
    Major,
    Minor,
    Patch,
    Unknown,
}

impl UpdateType {
    /// Patch and minor bumps may be merged without a human.
    pub fn auto_merge_eligible(&self) -> bool {
        matches!(self, UpdateType::Patch | UpdateType::Minor)
    }
}

impl fmt::Display for UpdateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UpdateType::Major => "major",
            UpdateType::Minor => "minor",
            UpdateType::Patch => "patch",
            UpdateType::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// First `X.Y.Z` triple found in `version`.
pub fn parse_semver(version: &str) -> Option<(u64, u64, u64)> {
    let captures = SEMVER.captures(version)?;
    let part = |i: usize| captures.get(i)?.as_str().parse::<u64>().ok();
    Some((part(1)?, part(2)?, part(3)?))
}

/// Classify by the most significant component that grew. Downgrades and
/// unparseable versions are `Unknown`.
pub fn determine_update_type(old_version: Option<&str>, new_version: Option<&str>) -> UpdateType {
    let (Some(old), Some(new)) = (
        old_version.and_then(parse_semver),
        new_version.and_then(parse_semver),
    ) else {
        return UpdateType::Unknown;
    };

    use std::cmp::Ordering::{Equal, Greater};

    match (new.0.cmp(&old.0), new.1.cmp(&old.1), new.2.cmp(&old.2)) {
        (Greater, _, _) => UpdateType::Major,
        (Equal, Greater, _) => UpdateType::Minor,
        (Equal, Equal, Greater) => UpdateType::Patch,
        _ => UpdateType::Unknown,
    }
}

/// `>=X.Y.Z,<X+1.0.0` for the first patched version.
pub fn fallback_constraint(first_patched_version: &str) -> Option<String> {
    let (major, minor, patch) = parse_semver(first_patched_version)?;
    Some(format!(
        ">={major}.{minor}.{patch},<{}.0.0",
        major.checked_add(1)?
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_semver() {
        assert_eq!(parse_semver("1.2.3"), Some((1, 2, 3)));
        assert_eq!(parse_semver("v10.0.12rc1"), Some((10, 0, 12)));
        assert_eq!(parse_semver("1.2"), None);
        assert_eq!(parse_semver(""), None);
    }

    #[test]
    fn test_determine_update_type() {
        assert_eq!(determine_update_type(Some("1.2.3"), Some("2.0.0")), UpdateType::Major);
        assert_eq!(determine_update_type(Some("1.2.3"), Some("1.3.0")), UpdateType::Minor);
        assert_eq!(determine_update_type(Some("1.2.3"), Some("1.2.4")), UpdateType::Patch);
        assert_eq!(determine_update_type(Some("1.2.3"), Some("1.2.3")), UpdateType::Unknown);
    }

    #[test]
    fn test_downgrade_is_unknown() {
        assert_eq!(determine_update_type(Some("2.0.0"), Some("1.5.0")), UpdateType::Unknown);
        assert_eq!(determine_update_type(Some("1.3.0"), Some("1.2.9")), UpdateType::Unknown);
    }

    #[test]
    fn test_determine_update_type_missing_versions() {
        assert_eq!(determine_update_type(None, Some("1.2.4")), UpdateType::Unknown);
        assert_eq!(determine_update_type(Some("1.2.3"), None), UpdateType::Unknown);
        assert_eq!(determine_update_type(Some("latest"), Some("1.2.4")), UpdateType::Unknown);
    }

    #[test]
    fn test_auto_merge_eligibility() {
        assert!(UpdateType::Patch.auto_merge_eligible());
        assert!(UpdateType::Minor.auto_merge_eligible());
        assert!(!UpdateType::Major.auto_merge_eligible());
        assert!(!UpdateType::Unknown.auto_merge_eligible());
    }

    #[test]
    fn test_fallback_constraint() {
        assert_eq!(fallback_constraint("3.1.3").as_deref(), Some(">=3.1.3,<4.0.0"));
        assert_eq!(fallback_constraint("0.9.0").as_deref(), Some(">=0.9.0,<1.0.0"));
        assert_eq!(fallback_constraint("3.1"), None);
    }
}
