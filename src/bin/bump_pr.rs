//! Release Bump Pull-Request Tool
//!
//! Opens a version-bump pull request: branches off the highest semver tag,
//! commits a one-line mutation to a tracked file, opens the pull request
//! and optionally approves it with a second token.
//!
//! ## Usage
//! ```bash
//! # Bump via the README with a deterministic branch name
//! bump-pr --repo acme/widgets --token <TOKEN> --target-branch main --postfix rel-42
//!
//! # Extend renovate.json baseBranches and auto-approve
//! bump-pr --repo acme/widgets \
//!   --token <TOKEN> \
//!   --approval-token <SECOND_TOKEN> \
//!   --file renovate.json \
//!   --branch release-2 \
//!   --target-branch main
//!
//! # With environment variables
//! GITHUB_REPOSITORY=acme/widgets \
//! GITHUB_TOKEN=<TOKEN> \
//! bump-pr --target-branch main
//! ```

use anyhow::Result;
use clap::Parser;
use release_bump_bot::github::{GitHost, GitHubClient};
use release_bump_bot::workflow::{self, BumpRequest};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

// ============================================================
// CLI Definition
// ============================================================

/// Release Bump Pull-Request Tool
#[derive(Parser, Debug)]
#[command(name = "bump-pr")]
#[command(about = "Open a release-management version bump pull request")]
#[command(version)]
struct Args {
    /// Repository in format owner/repo
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repo: String,

    /// GitHub token used for the branch, commit and pull-request calls
    #[arg(long, env = "GITHUB_TOKEN")]
    token: String,

    /// Second token used to approve the pull request (approval is skipped
    /// if absent)
    #[arg(long, env = "GITHUB_APPROVAL_TOKEN")]
    approval_token: Option<String>,

    /// File the bump commit touches
    #[arg(long, default_value = "README.md")]
    file: String,

    /// Branch the pull request targets
    #[arg(long)]
    target_branch: String,

    /// Suffix pinning the generated branch name (timestamp otherwise)
    #[arg(long)]
    postfix: Option<String>,

    /// Base branch to insert into renovate.json (required for renovate
    /// files)
    #[arg(long)]
    branch: Option<String>,

    /// GitHub API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = "https://api.github.com")]
    api_url: String,

    /// Output format: text (default), json
    #[arg(long, default_value = "text")]
    format: String,

    /// Compute the plan and print it without creating anything
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

// ============================================================
// Main Entry Point
// ============================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let parts: Vec<&str> = args.repo.split('/').collect();
    if parts.len() != 2 {
        anyhow::bail!(
            "Invalid repository format: {}. Expected: owner/repo",
            args.repo
        );
    }
    let (owner, repo) = (parts[0], parts[1]);

    let host = GitHubClient::new(owner, repo, &args.token).with_api_url(&args.api_url);
    let approver = args
        .approval_token
        .as_ref()
        .map(|token| GitHubClient::new(owner, repo, token).with_api_url(&args.api_url));

    let request = BumpRequest {
        file: args.file.clone(),
        target_branch: args.target_branch.clone(),
        postfix: args.postfix.clone(),
        branch: args.branch.clone(),
    };

    if args.dry_run {
        eprintln!("🔍 Planning bump for {} (no writes)...", args.repo);
        let plan = workflow::plan(&host, &request).await?;

        match args.format.as_str() {
            "json" => println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "base_tag": plan.base_tag.tag,
                    "base_sha": plan.base_tag.sha,
                    "branch": plan.branch_name,
                    "file": plan.file.path,
                }))?
            ),
            _ => {
                eprintln!(
                    "✅ Would branch {} from tag {} ({})",
                    plan.branch_name, plan.base_tag.tag, plan.base_tag.sha
                );
                eprintln!(
                    "✅ Would commit {} bytes to {}",
                    plan.updated_content.len(),
                    plan.file.path
                );
            }
        }
        return Ok(());
    }

    eprintln!(
        "🤖 Opening bump pull request in {} ({} -> {})...",
        args.repo,
        args.file,
        args.target_branch
    );

    let pull_request = workflow::run(
        &host,
        approver.as_ref().map(|approver| approver as &dyn GitHost),
        &request,
    )
    .await?;

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&pull_request)?),
        _ => {
            println!("{}", pull_request.number);
            eprintln!(
                "✅ Opened pull request #{} ({} -> {})",
                pull_request.number, pull_request.head.git_ref, pull_request.base.git_ref
            );
        }
    }

    Ok(())
}
