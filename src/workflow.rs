//! Version-Bump Workflow
//!
//! The single linear procedure this crate exists for: resolve the highest
//! tag, mutate the tracked file in memory, create a branch at the tag's
//! commit, commit the mutation, open the pull request, optionally approve
//! it with a second identity. Each step is one remote call; the first
//! failure aborts the run. There is no compensation, so a branch created
//! before a failed commit is left behind.

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, info};

use crate::content::ContentUpdate;
use crate::github::{self, FileContent, FileUpdate, GitHost, NewPullRequest, PullRequest};
use crate::tags::{highest_tag, TagSummary};

const BRANCH_PREFIX: &str = "bump-to-next-minor-version";
const COMMIT_MESSAGE: &str =
    "feat(release-management): Bump minor version for release management";
const PULL_REQUEST_TITLE: &str = "Bump minor version for release management";
const PULL_REQUEST_BODY: &str = "## Motivation\n\nBump minor version for release management\n";
const APPROVAL_BODY: &str = "Automated approval for the release-management bump";

/// Caller-facing parameters for one bump run.
///
/// Credentials are not part of the request; they travel in the [`GitHost`]
/// implementations handed to [`run`].
#[derive(Debug, Clone)]
pub struct BumpRequest {
    /// File the bump commit touches (e.g. `README.md` or `renovate.json`).
    pub file: String,
    /// Branch the pull request targets.
    pub target_branch: String,
    /// Suffix pinning the generated branch name for idempotent re-runs.
    pub postfix: Option<String>,
    /// Base branch to insert into a renovate configuration.
    pub branch: Option<String>,
}

/// Everything computed before the first write.
#[derive(Debug, Clone)]
pub struct BumpPlan {
    /// Highest semver tag (or the sentinel) the branch will start from.
    pub base_tag: TagSummary,
    /// Name of the disposable bump branch.
    pub branch_name: String,
    /// Current committed state of the tracked file.
    pub file: FileContent,
    /// Mutated file content, not yet base64-encoded.
    pub updated_content: String,
}

/// Name for the disposable bump branch.
///
/// A postfix pins the name; without one the current millisecond timestamp
/// keeps successive runs from colliding.
pub fn branch_name(postfix: Option<&str>) -> String {
    match postfix {
        Some(postfix) => format!("{}-{}", BRANCH_PREFIX, postfix),
        None => format!("{}-{}", BRANCH_PREFIX, Utc::now().timestamp_millis()),
    }
}

/// Compute the plan without touching any write endpoint.
///
/// Local precondition failures (renovate strategy without a branch, missing
/// `baseBranches` array) surface here, before any side effect.
pub async fn plan(host: &dyn GitHost, request: &BumpRequest) -> Result<BumpPlan> {
    let update = ContentUpdate::for_file(&request.file, request.branch.as_deref())?;

    let tags = host.list_tags().await?;
    let base_tag = highest_tag(&tags);
    info!(tag = %base_tag.tag, sha = %base_tag.sha, "Resolved highest tag");

    let file = host.get_content(&request.file).await?;
    debug!(path = %file.path, sha = %file.sha, "Fetched file content");

    let original = github::decode_content(&file.content)?;
    let updated_content = update.apply(&original)?;

    Ok(BumpPlan {
        base_tag,
        branch_name: branch_name(request.postfix.as_deref()),
        file,
        updated_content,
    })
}

/// Execute the full workflow and return the created pull request.
///
/// Approval only happens when `approver` is supplied; its absence is not an
/// error. The review references the commit produced by the content update.
pub async fn run(
    host: &dyn GitHost,
    approver: Option<&dyn GitHost>,
    request: &BumpRequest,
) -> Result<PullRequest> {
    let plan = plan(host, request).await?;

    info!(branch = %plan.branch_name, sha = %plan.base_tag.sha, "Creating bump branch");
    host.create_branch(&plan.branch_name, &plan.base_tag.sha)
        .await?;

    let updated = host
        .update_content(&FileUpdate {
            path: plan.file.path.clone(),
            message: COMMIT_MESSAGE.to_string(),
            content: github::encode_content(&plan.updated_content),
            sha: plan.file.sha.clone(),
            branch: plan.branch_name.clone(),
        })
        .await?;
    info!(commit = %updated.commit.sha, "Committed bump to branch");

    let pull_request = host
        .create_pull_request(&NewPullRequest {
            title: PULL_REQUEST_TITLE.to_string(),
            head: plan.branch_name.clone(),
            base: request.target_branch.clone(),
            body: PULL_REQUEST_BODY.to_string(),
        })
        .await?;
    info!(number = pull_request.number, "Opened pull request");

    if let Some(approver) = approver {
        let review = approver
            .approve_pull_request(pull_request.number, &updated.commit.sha, APPROVAL_BODY)
            .await?;
        info!(review_id = review.id, "Approved pull request");
    }

    Ok(pull_request)
}
