//! Release Bump Bot Library
//!
//! Opens a version-bump pull request against a GitHub repository: resolve
//! the highest semver tag, commit a one-line mutation to a tracked file on
//! a branch cut from the tag's commit, open the pull request into a target
//! branch, and optionally approve it with a second token.
//!
//! ## Binaries
//!
//! - `bump-pr`: run the workflow from the command line

pub mod content;
pub mod github;
pub mod tags;
pub mod workflow;

pub use github::{GitHubClient, GitHost};
pub use workflow::{BumpPlan, BumpRequest};
