//! Highest-Tag Resolution
//!
//! Reduces a tag listing to the tag with the greatest semantic version.
//! Tag names that do not parse as semantic versions never fail the
//! reduction; they are skipped. An empty or all-invalid listing yields a
//! sentinel lower than any real tag.

use semver::Version;

use crate::github::Tag;

/// Sentinel tag returned when no listed tag parses as a semantic version.
pub const SENTINEL_TAG: &str = "0.0.1";
/// Sentinel sha paired with [`SENTINEL_TAG`].
pub const SENTINEL_SHA: &str = "0000";

/// The winning tag of a listing reduction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSummary {
    /// Tag name as listed (a `v` prefix is kept).
    pub tag: String,
    /// Commit sha the tag points at.
    pub sha: String,
}

impl TagSummary {
    fn sentinel() -> Self {
        Self {
            tag: SENTINEL_TAG.to_string(),
            sha: SENTINEL_SHA.to_string(),
        }
    }
}

/// Pick the highest semantic-version tag from a listing.
///
/// Comparison is by semver precedence; a leading `v` is tolerated. For
/// equal versions the last occurrence in listing order wins.
pub fn highest_tag(tags: &[Tag]) -> TagSummary {
    let mut best = TagSummary::sentinel();
    let mut best_version = Version::new(0, 0, 1);

    for tag in tags {
        let name = tag.name.strip_prefix('v').unwrap_or(&tag.name);
        let Ok(version) = Version::parse(name) else {
            continue;
        };

        if version >= best_version {
            best = TagSummary {
                tag: tag.name.clone(),
                sha: tag.commit.sha.clone(),
            };
            best_version = version;
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::CommitRef;

    fn tag(name: &str, sha: &str) -> Tag {
        Tag {
            name: name.to_string(),
            commit: CommitRef {
                sha: sha.to_string(),
            },
        }
    }

    #[test]
    fn test_highest_tag_picks_greatest_valid() {
        let tags = vec![
            tag("0.9.0", "aaa"),
            tag("1.2.0", "bbb"),
            tag("1.0.3", "ccc"),
        ];

        let best = highest_tag(&tags);
        assert_eq!(best.tag, "1.2.0");
        assert_eq!(best.sha, "bbb");
    }

    #[test]
    fn test_highest_tag_ignores_invalid_names() {
        let tags = vec![tag("0.9.0", "aaa"), tag("1.2.0", "bbb"), tag("abc", "ccc")];

        let best = highest_tag(&tags);
        assert_eq!(best.tag, "1.2.0");
        assert_eq!(best.sha, "bbb");
    }

    #[test]
    fn test_highest_tag_empty_returns_sentinel() {
        let best = highest_tag(&[]);
        assert_eq!(best.tag, SENTINEL_TAG);
        assert_eq!(best.sha, SENTINEL_SHA);
    }

    #[test]
    fn test_highest_tag_all_invalid_returns_sentinel() {
        let tags = vec![tag("latest", "aaa"), tag("nightly-2024", "bbb")];

        let best = highest_tag(&tags);
        assert_eq!(best.tag, SENTINEL_TAG);
        assert_eq!(best.sha, SENTINEL_SHA);
    }

    #[test]
    fn test_highest_tag_below_sentinel_returns_sentinel() {
        let tags = vec![tag("0.0.0", "aaa")];

        let best = highest_tag(&tags);
        assert_eq!(best.tag, SENTINEL_TAG);
        assert_eq!(best.sha, SENTINEL_SHA);
    }

    #[test]
    fn test_highest_tag_equal_versions_last_wins() {
        let tags = vec![tag("1.0.0", "first"), tag("1.0.0", "second")];

        let best = highest_tag(&tags);
        assert_eq!(best.sha, "second");
    }

    #[test]
    fn test_highest_tag_accepts_v_prefix() {
        let tags = vec![tag("1.0.0", "aaa"), tag("v2.0.0", "bbb")];

        let best = highest_tag(&tags);
        assert_eq!(best.tag, "v2.0.0");
        assert_eq!(best.sha, "bbb");
    }

    #[test]
    fn test_highest_tag_prerelease_below_release() {
        let tags = vec![tag("1.2.0-rc.1", "aaa"), tag("1.2.0", "bbb")];

        let best = highest_tag(&tags);
        assert_eq!(best.tag, "1.2.0");
    }
}
