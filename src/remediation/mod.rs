//! Dependabot alert remediation for Poetry projects.
//!
//! One invocation handles one alert: locate it, re-check the filters, try
//! `poetry update` (falling back to a constrained `poetry add`), run the
//! quality gates and classify the resulting version bump. Every path ends in
//! a [`RemediationResult`]; nothing short of a programming error escapes.

pub mod filter;
pub mod lockfile;
pub mod result;
pub mod runner;
pub mod version;

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::error::Result;
use crate::platform::github::mapper;
use crate::platform::types::{AlertFields, AlertListing, AlertSummary, Severity};
use crate::platform::Platform;

use filter::passes_filters;
use lockfile::{manifest_fingerprint, LockSnapshot, LOCK_FILE};
use result::{
    format_pr_body, RemediationPlan, RemediationResult, RemediationStatus, VersionChange, LABELS,
};
use runner::{shell_join, CommandOutput, CommandRunner};
use version::{determine_update_type, fallback_constraint, UpdateType};

static UNSAFE_BRANCH_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("valid branch regex"));

/// `python3 -m poetry <args>`
fn poetry(args: &[&str]) -> Vec<String> {
    ["python3", "-m", "poetry"]
        .iter()
        .chain(args)
        .map(|part| part.to_string())
        .collect()
}

/// Validation commands, in the order they must pass.
pub fn quality_gates() -> Vec<Vec<String>> {
    vec![
        poetry(&["install"]),
        poetry(&["run", "pytest"]),
        poetry(&["run", "ruff", "check", "."]),
    ]
}

/// Reduce a package name to something git accepts in a branch name.
pub fn safe_branch_component(value: &str) -> String {
    let lowered = value.trim().to_lowercase();
    let cleaned = UNSAFE_BRANCH_CHARS.replace_all(&lowered, "-");
    let cleaned = cleaned.trim_matches('-');
    if cleaned.is_empty() {
        "dependency".to_string()
    } else {
        cleaned.to_string()
    }
}

pub struct Remediator {
    platform: Arc<dyn Platform>,
    runner: Arc<dyn CommandRunner>,
    workdir: PathBuf,
    threshold: Severity,
}

impl Remediator {
    pub fn new(
        platform: Arc<dyn Platform>,
        runner: Arc<dyn CommandRunner>,
        workdir: impl Into<PathBuf>,
        threshold: Severity,
    ) -> Self {
        Self {
            platform,
            runner,
            workdir: workdir.into(),
            threshold,
        }
    }

    /// Open alerts that pass the filters, capped at `max_alerts`.
    pub async fn list_alerts(&self, max_alerts: usize) -> Result<AlertListing> {
        let alerts = self.platform.list_open_alerts().await?;

        let selected: Vec<AlertSummary> = alerts
            .iter()
            .map(mapper::map_alert)
            .filter(|fields| passes_filters(fields, self.threshold))
            .take(max_alerts)
            .map(|fields| AlertSummary::from(&fields))
            .collect();

        tracing::info!(
            fetched = alerts.len(),
            selected = selected.len(),
            threshold = %self.threshold,
            "Selected alert(s) for remediation"
        );

        Ok(AlertListing::new(selected))
    }

    /// Remediate a single alert.
    pub async fn remediate(&self, alert_id: u64, dry_run: bool) -> RemediationResult {
        let alerts = match self.platform.list_open_alerts().await {
            Ok(alerts) => alerts,
            Err(e) => {
                tracing::error!(alert_id, error = %e, "Failed to fetch open alerts");
                return RemediationResult::failed(format!("Failed to fetch open alerts: {e}"));
            }
        };

        let Some(alert) = alerts
            .iter()
            .find(|alert| mapper::alert_id(alert) == Some(alert_id))
        else {
            tracing::info!(alert_id, "Alert not found among open alerts");
            return RemediationResult::skipped(
                format!("Alert {alert_id} is not open or not found."),
                None,
            );
        };

        let fields = mapper::map_alert(alert);
        if !passes_filters(&fields, self.threshold) {
            tracing::info!(
                alert_id,
                severity = %fields.severity,
                ecosystem = %fields.ecosystem,
                "Alert does not match filters"
            );
            return RemediationResult::skipped(
                format!("Alert {alert_id} does not match filters."),
                Some(fields),
            );
        }

        if fields.package.is_empty() {
            return RemediationResult::skipped("Alert has no package name.", Some(fields));
        }

        let mut plan = RemediationPlan {
            branch: format!(
                "secfix/alert-{alert_id}-{}",
                safe_branch_component(&fields.package)
            ),
            title: format!(
                "fix(security): remediate alert {alert_id} for {}",
                fields.package
            ),
            labels: LABELS.iter().map(|label| label.to_string()).collect(),
            update_type: UpdateType::Unknown,
            auto_merge_eligible: false,
            commands: Vec::new(),
            change: None,
        };

        let (status, reason) = if dry_run {
            (
                RemediationStatus::DryRun,
                "Dry run requested; no dependency updates performed.".to_string(),
            )
        } else {
            self.apply_update(&fields, &mut plan).await
        };

        tracing::info!(
            alert_id,
            package = %fields.package,
            status = ?status,
            update_type = %plan.update_type,
            "Remediation finished"
        );

        RemediationResult {
            status,
            reason,
            alert: Some(fields),
            plan: Some(plan),
        }
    }

    async fn run_recorded(&self, plan: &mut RemediationPlan, command: &[String]) -> CommandOutput {
        plan.commands.push(shell_join(command));
        self.runner.run(command, &self.workdir).await
    }

    async fn apply_update(
        &self,
        fields: &AlertFields,
        plan: &mut RemediationPlan,
    ) -> (RemediationStatus, String) {
        let package = fields.package.as_str();
        let lock_path = self.workdir.join(LOCK_FILE);

        let before = match LockSnapshot::load(&lock_path) {
            Ok(snapshot) => snapshot,
            Err(e) => return (RemediationStatus::Failed, format!("Failed to read {LOCK_FILE}: {e}")),
        };
        let fingerprint_before = match manifest_fingerprint(&self.workdir) {
            Ok(fingerprint) => fingerprint,
            Err(e) => {
                return (
                    RemediationStatus::Failed,
                    format!("Failed to inspect dependency files: {e}"),
                )
            }
        };
        let old_version = before.version_of(package).map(str::to_string);

        tracing::info!(package, old_version = ?old_version, "Updating dependency");

        let mut attempts = vec![self.run_recorded(plan, &poetry(&["update", package])).await];

        if !attempts[0].success() {
            if let Some(constraint) = fallback_constraint(&fields.first_patched_version) {
                tracing::info!(package, constraint = %constraint, "Update failed, pinning patched range");
                let pinned = format!("{package}@{constraint}");
                attempts.push(self.run_recorded(plan, &poetry(&["add", pinned.as_str()])).await);
            }
        }

        match manifest_fingerprint(&self.workdir) {
            Ok(fingerprint_after) if fingerprint_after == fingerprint_before => {
                return (RemediationStatus::Skipped, no_change_reason(fields, &attempts));
            }
            Ok(_) => {}
            Err(e) => {
                return (
                    RemediationStatus::Failed,
                    format!("Failed to inspect dependency files after remediation: {e}"),
                )
            }
        }

        for command in quality_gates() {
            let output = self.run_recorded(plan, &command).await;
            if !output.success() {
                return (
                    RemediationStatus::ValidationFailed,
                    format!(
                        "Quality gate failed: {}\nstdout:\n{}\nstderr:\n{}",
                        command.join(" "),
                        output.stdout.trim(),
                        output.stderr.trim()
                    ),
                );
            }
        }

        let after = match LockSnapshot::load(&lock_path) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                return (
                    RemediationStatus::Failed,
                    format!("Failed to read {LOCK_FILE} after remediation: {e}"),
                )
            }
        };
        let new_version = after.version_of(package).map(str::to_string);

        let update_type = determine_update_type(old_version.as_deref(), new_version.as_deref());
        plan.update_type = update_type;
        plan.auto_merge_eligible = update_type.auto_merge_eligible();

        let gate_commands: Vec<String> = quality_gates().iter().map(|c| shell_join(c)).collect();
        let pr_body = format_pr_body(
            fields,
            update_type,
            old_version.as_deref(),
            new_version.as_deref(),
            &gate_commands,
        );

        let reason = format!(
            "Updated {package} from {} to {} ({update_type}).",
            old_version.as_deref().unwrap_or("unknown"),
            new_version.as_deref().unwrap_or("unknown"),
        );
        plan.change = Some(VersionChange {
            old_version,
            new_version,
            pr_body,
        });

        (RemediationStatus::Remediated, reason)
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }
}

fn no_change_reason(fields: &AlertFields, attempts: &[CommandOutput]) -> String {
    if fields.first_patched_version.is_empty() {
        return "No resolvable first patched version in alert metadata.".to_string();
    }

    let stderr = attempts
        .iter()
        .map(|attempt| attempt.stderr.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if stderr.is_empty() {
        "Remediation produced no dependency changes.".to_string()
    } else {
        format!("Remediation produced no dependency changes. Last error: {stderr}")
    }
}
