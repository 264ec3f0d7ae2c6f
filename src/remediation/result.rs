use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::platform::types::AlertFields;
use crate::remediation::version::UpdateType;

pub const LABELS: [&str; 3] = ["security", "dependabot", "auto-remediation"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationStatus {
    DryRun,
    Skipped,
    ValidationFailed,
    Remediated,
    /// Lock file state could not be read, or the alert feed was unreachable.
    Failed,
}

/// Branch, title and bookkeeping for a remediation that got past the filters.
#[derive(Debug, Clone, Serialize)]
pub struct RemediationPlan {
    pub branch: String,
    pub title: String,
    pub labels: Vec<String>,
    pub update_type: UpdateType,
    pub auto_merge_eligible: bool,
    pub commands: Vec<String>,
    #[serde(flatten)]
    pub change: Option<VersionChange>,
}

/// Only present once a remediation succeeded.
#[derive(Debug, Clone, Serialize)]
pub struct VersionChange {
    pub old_version: Option<String>,
    pub new_version: Option<String>,
    pub pr_body: String,
}

/// Outcome of one `remediate` invocation, written to disk as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct RemediationResult {
    pub status: RemediationStatus,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<AlertFields>,
    #[serde(flatten)]
    pub plan: Option<RemediationPlan>,
}

impl RemediationResult {
    pub fn skipped(reason: impl Into<String>, alert: Option<AlertFields>) -> Self {
        Self {
            status: RemediationStatus::Skipped,
            reason: reason.into(),
            alert,
            plan: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: RemediationStatus::Failed,
            reason: reason.into(),
            alert: None,
            plan: None,
        }
    }

    pub fn commands(&self) -> &[String] {
        match &self.plan {
            Some(plan) => &plan.commands,
            None => &[],
        }
    }
}

/// Write `payload` as pretty JSON with sorted keys and a trailing newline,
/// creating the parent directory when needed.
pub async fn write_json<T: Serialize>(path: &Path, payload: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    // serde_json's Map is ordered by key, so going through Value sorts them.
    let value = serde_json::to_value(payload)?;
    let mut text = serde_json::to_string_pretty(&value)?;
    text.push('\n');

    tokio::fs::write(path, text).await?;
    Ok(())
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

/// Markdown description for the pull request a CI job opens afterwards.
pub fn format_pr_body(
    fields: &AlertFields,
    update_type: UpdateType,
    old_version: Option<&str>,
    new_version: Option<&str>,
    validation_commands: &[String],
) -> String {
    let alert_id = fields
        .alert_id
        .map_or_else(|| "unknown".to_string(), |id| id.to_string());

    let mut lines = vec![
        "## Automated Security Remediation".to_string(),
        String::new(),
        format!("- Alert: `{alert_id}`"),
        format!("- Package: `{}`", fields.package),
        format!("- Severity: `{}`", fields.severity),
        format!("- GHSA: `{}`", or_default(&fields.ghsa_id, "n/a")),
        format!("- CVE: `{}`", or_default(&fields.cve_id, "n/a")),
        format!(
            "- First patched version: `{}`",
            or_default(&fields.first_patched_version, "unknown")
        ),
        format!("- Previous version: `{}`", old_version.unwrap_or("unknown")),
        format!("- New version: `{}`", new_version.unwrap_or("unknown")),
        format!("- Update type: `{update_type}`"),
        String::new(),
        "### Validation".to_string(),
        "Executed:".to_string(),
    ];
    lines.extend(validation_commands.iter().map(|c| format!("- `{c}`")));
    lines.extend([
        String::new(),
        "### Source Alert".to_string(),
        or_default(&fields.html_url, "Unavailable").to_string(),
    ]);

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields() -> AlertFields {
        AlertFields {
            alert_id: Some(17),
            state: "open".to_string(),
            severity: "high".to_string(),
            package: "jinja2".to_string(),
            ecosystem: "pip".to_string(),
            manifest_path: "poetry.lock".to_string(),
            summary: "HTML attribute injection".to_string(),
            ghsa_id: "GHSA-h5c8-rqwp-cp95".to_string(),
            cve_id: String::new(),
            first_patched_version: "3.1.3".to_string(),
            html_url: String::new(),
        }
    }

    #[test]
    fn test_skipped_result_serializes_status_and_reason_only() {
        let result = RemediationResult::skipped("Alert 5 is not open or not found.", None);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({"status": "skipped", "reason": "Alert 5 is not open or not found."})
        );
    }

    #[test]
    fn test_plan_fields_are_flattened() {
        let result = RemediationResult {
            status: RemediationStatus::DryRun,
            reason: "Dry run".to_string(),
            alert: Some(fields()),
            plan: Some(RemediationPlan {
                branch: "secfix/alert-17-jinja2".to_string(),
                title: "fix(security): remediate alert 17 for jinja2".to_string(),
                labels: LABELS.iter().map(|l| l.to_string()).collect(),
                update_type: UpdateType::Unknown,
                auto_merge_eligible: false,
                commands: Vec::new(),
                change: None,
            }),
        };

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["status"], "dry_run");
        assert_eq!(value["branch"], "secfix/alert-17-jinja2");
        assert_eq!(value["update_type"], "unknown");
        assert_eq!(value["alert"]["package"], "jinja2");
        assert!(value.get("pr_body").is_none());
        assert!(value.get("plan").is_none());
    }

    #[test]
    fn test_format_pr_body() {
        let body = format_pr_body(
            &fields(),
            UpdateType::Patch,
            Some("3.1.2"),
            Some("3.1.3"),
            &["python3 -m poetry install".to_string()],
        );

        assert!(body.starts_with("## Automated Security Remediation\n"));
        assert!(body.contains("- Alert: `17`"));
        assert!(body.contains("- CVE: `n/a`"));
        assert!(body.contains("- Previous version: `3.1.2`"));
        assert!(body.contains("- Update type: `patch`"));
        assert!(body.contains("- `python3 -m poetry install`"));
        assert!(body.ends_with("### Source Alert\nUnavailable"));
    }

    #[tokio::test]
    async fn test_write_json_sorts_keys_and_creates_parent() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out").join("result.json");

        write_json(&path, &json!({"zeta": 1, "alpha": [1, 2]})).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("}\n"));
        assert!(text.find("\"alpha\"").unwrap() < text.find("\"zeta\"").unwrap());
    }
}
