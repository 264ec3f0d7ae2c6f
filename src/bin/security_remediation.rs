use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use phrase_pulse::logging;
use phrase_pulse::platform::github::GitHubPlatform;
use phrase_pulse::platform::types::Severity;
use phrase_pulse::remediation::result::write_json;
use phrase_pulse::remediation::runner::ProcessRunner;
use phrase_pulse::remediation::Remediator;

#[derive(Parser)]
#[command(
    name = "security-remediation",
    about = "Dependabot security remediation agent for Poetry projects"
)]
struct Cli {
    /// Repository in owner/name format
    #[arg(long)]
    repo: String,

    /// GitHub token for API access
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: String,

    /// Minimum alert severity to remediate
    #[arg(long, value_enum, default_value_t = Threshold::High)]
    severity_threshold: Threshold,

    /// Path for output JSON
    #[arg(long, default_value = "security-remediation-output.json")]
    output: PathBuf,

    /// Poetry project directory
    #[arg(long, default_value = ".")]
    workdir: PathBuf,

    /// Kill any package-manager or test command running longer than this
    #[arg(long, default_value_t = 1800)]
    command_timeout_secs: u64,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List alerts that match remediation criteria
    List {
        /// Maximum alerts to return
        #[arg(long, default_value_t = 10)]
        max_alerts: usize,
    },
    /// Remediate a single alert
    Remediate {
        /// Dependabot alert id/number
        #[arg(long)]
        alert_id: u64,

        /// Plan actions without changing dependencies
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Threshold {
    High,
    Critical,
}

impl From<Threshold> for Severity {
    fn from(threshold: Threshold) -> Self {
        match threshold {
            Threshold::High => Severity::High,
            Threshold::Critical => Severity::Critical,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init_cli(cli.debug);

    let platform = Arc::new(GitHubPlatform::new(&cli.repo, &cli.token)?);
    let runner = Arc::new(ProcessRunner::new(Duration::from_secs(
        cli.command_timeout_secs,
    )));
    let remediator = Remediator::new(
        platform,
        runner,
        cli.workdir.clone(),
        cli.severity_threshold.into(),
    );

    tracing::info!(
        repo = %cli.repo,
        workdir = %remediator.workdir().display(),
        "Starting security remediation"
    );

    match cli.command {
        Command::List { max_alerts } => {
            let listing = remediator.list_alerts(max_alerts).await?;
            write_json(&cli.output, &listing).await?;
            tracing::info!("Selected {} alert(s) for remediation.", listing.count);
        }
        Command::Remediate { alert_id, dry_run } => {
            let result = remediator.remediate(alert_id, dry_run).await;
            write_json(&cli.output, &result).await?;
            tracing::info!(
                alert_id,
                status = ?result.status,
                output = %cli.output.display(),
                "Wrote remediation result"
            );
        }
    }

    Ok(())
}
