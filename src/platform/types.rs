use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Advisory severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Moderate,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Moderate => "moderate",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "moderate" => Ok(Severity::Moderate),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(format!("Unknown severity: {other}")),
        }
    }
}

/// Normalized view of a Dependabot alert. Missing values are empty strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertFields {
    pub alert_id: Option<u64>,
    pub state: String,
    pub severity: String,
    pub package: String,
    pub ecosystem: String,
    pub manifest_path: String,
    pub summary: String,
    pub ghsa_id: String,
    pub cve_id: String,
    pub first_patched_version: String,
    pub html_url: String,
}

/// The subset of an alert reported by the `list` subcommand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertSummary {
    pub alert_id: Option<u64>,
    pub package: String,
    pub severity: String,
    pub ecosystem: String,
    pub first_patched_version: String,
    pub html_url: String,
}

impl From<&AlertFields> for AlertSummary {
    fn from(fields: &AlertFields) -> Self {
        Self {
            alert_id: fields.alert_id,
            package: fields.package.clone(),
            severity: fields.severity.clone(),
            ecosystem: fields.ecosystem.clone(),
            first_patched_version: fields.first_patched_version.clone(),
            html_url: fields.html_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertListing {
    pub alerts: Vec<AlertSummary>,
    pub count: usize,
}

impl AlertListing {
    pub fn new(alerts: Vec<AlertSummary>) -> Self {
        let count = alerts.len();
        Self { alerts, count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Moderate);
        assert!(Severity::Moderate < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn test_severity_parse_is_case_insensitive() {
        assert_eq!("HIGH".parse::<Severity>(), Ok(Severity::High));
        assert_eq!(" critical ".parse::<Severity>(), Ok(Severity::Critical));
        assert!("urgent".parse::<Severity>().is_err());
    }
}
