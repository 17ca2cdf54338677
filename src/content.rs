//! Content Mutation Strategies
//!
//! The bump commit touches exactly one file. Which mutation applies is a
//! closed choice selected by filename: renovate configurations get a new
//! entry appended to `baseBranches`, everything else gets a leading blank
//! line so the pull request has a non-empty diff.

use jsonc_parser::ast::{ObjectPropName, Value};
use jsonc_parser::common::Ranged;
use jsonc_parser::{parse_to_ast, CollectOptions, ParseOptions};
use thiserror::Error;

/// Filenames recognized as renovate configurations. The caller-supplied
/// path is compared whole, so `config/renovate.json` takes the text path.
const RENOVATE_FILES: [&str; 2] = ["renovate.json", "renovate.json5"];

/// Precondition failures raised before any remote write is attempted.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// The renovate strategy needs a branch to insert.
    #[error("branch is required for renovate.json")]
    BranchRequired,

    /// The configuration has no array-valued `baseBranches` field.
    #[error("can't extend renovate.json baseBranches with {0}")]
    BaseBranchesMissing(String),

    /// The configuration is not parseable JSONC.
    #[error("Failed to parse renovate configuration: {0}")]
    InvalidConfig(String),
}

/// One of the two supported single-file mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentUpdate {
    /// Append a branch to the `baseBranches` array of a renovate config.
    RenovateBaseBranches { branch: String },
    /// Prepend a newline and a space, guaranteeing a non-empty diff.
    TextPrepend,
}

impl ContentUpdate {
    /// Select the mutation for a file path.
    ///
    /// The renovate strategy requires `branch`; its absence fails here,
    /// before any remote call.
    pub fn for_file(file: &str, branch: Option<&str>) -> Result<Self, UpdateError> {
        if RENOVATE_FILES.contains(&file) {
            let branch = branch.ok_or(UpdateError::BranchRequired)?;
            Ok(Self::RenovateBaseBranches {
                branch: branch.to_string(),
            })
        } else {
            Ok(Self::TextPrepend)
        }
    }

    /// Apply the mutation to the decoded file content.
    pub fn apply(&self, original: &str) -> Result<String, UpdateError> {
        match self {
            Self::RenovateBaseBranches { branch } => append_base_branch(original, branch),
            Self::TextPrepend => Ok(format!("\n {}", original)),
        }
    }
}

/// Splice `branch` onto the end of the top-level `baseBranches` array.
///
/// The new element is inserted into the original text, so comments, key
/// order and formatting elsewhere survive byte-for-byte.
fn append_base_branch(config: &str, branch: &str) -> Result<String, UpdateError> {
    let parsed = parse_to_ast(config, &CollectOptions::default(), &ParseOptions::default())
        .map_err(|err| UpdateError::InvalidConfig(err.to_string()))?;

    let root = match parsed.value {
        Some(Value::Object(object)) => object,
        _ => return Err(UpdateError::BaseBranchesMissing(branch.to_string())),
    };

    let array = root
        .properties
        .iter()
        .find(|prop| prop_name(&prop.name) == "baseBranches")
        .and_then(|prop| match &prop.value {
            Value::Array(array) => Some(array),
            _ => None,
        })
        .ok_or_else(|| UpdateError::BaseBranchesMissing(branch.to_string()))?;

    // Insert after the last element, or right inside an empty array.
    let (insert_at, element) = match array.elements.last() {
        Some(last) => (last.end(), format!(", \"{}\"", branch)),
        None => (array.start() + 1, format!("\"{}\"", branch)),
    };

    let mut updated = String::with_capacity(config.len() + element.len());
    updated.push_str(&config[..insert_at]);
    updated.push_str(&element);
    updated.push_str(&config[insert_at..]);
    Ok(updated)
}

fn prop_name<'a>(name: &'a ObjectPropName<'a>) -> &'a str {
    match name {
        ObjectPropName::String(string) => string.value.as_ref(),
        ObjectPropName::Word(word) => word.value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renovate_filenames_select_json_path() {
        let update = ContentUpdate::for_file("renovate.json", Some("release-2")).unwrap();
        assert_eq!(
            update,
            ContentUpdate::RenovateBaseBranches {
                branch: "release-2".to_string()
            }
        );

        let update = ContentUpdate::for_file("renovate.json5", Some("release-2")).unwrap();
        assert!(matches!(update, ContentUpdate::RenovateBaseBranches { .. }));
    }

    #[test]
    fn test_other_filenames_select_text_path() {
        let update = ContentUpdate::for_file("README.md", None).unwrap();
        assert_eq!(update, ContentUpdate::TextPrepend);
    }

    #[test]
    fn test_nested_renovate_path_selects_text_path() {
        let update = ContentUpdate::for_file("config/renovate.json", None).unwrap();
        assert_eq!(update, ContentUpdate::TextPrepend);
    }

    #[test]
    fn test_renovate_requires_branch() {
        let err = ContentUpdate::for_file("renovate.json", None).unwrap_err();
        assert_eq!(err.to_string(), "branch is required for renovate.json");
    }

    #[test]
    fn test_append_preserves_every_other_byte() {
        let config = "{\n  // automerge everything\n  \"extends\": [\"config:base\"],\n  \"baseBranches\": [\"main\"]\n}\n";
        let update = ContentUpdate::RenovateBaseBranches {
            branch: "release-2".to_string(),
        };

        let updated = update.apply(config).unwrap();
        assert_eq!(
            updated,
            "{\n  // automerge everything\n  \"extends\": [\"config:base\"],\n  \"baseBranches\": [\"main\", \"release-2\"]\n}\n"
        );
    }

    #[test]
    fn test_append_to_empty_array() {
        let update = ContentUpdate::RenovateBaseBranches {
            branch: "release-2".to_string(),
        };

        let updated = update.apply("{\"baseBranches\": []}").unwrap();
        assert_eq!(updated, "{\"baseBranches\": [\"release-2\"]}");
    }

    #[test]
    fn test_missing_base_branches_fails() {
        let update = ContentUpdate::RenovateBaseBranches {
            branch: "release-2".to_string(),
        };

        let err = update.apply("{\"extends\": [\"config:base\"]}").unwrap_err();
        assert_eq!(
            err.to_string(),
            "can't extend renovate.json baseBranches with release-2"
        );
    }

    #[test]
    fn test_non_array_base_branches_fails() {
        let update = ContentUpdate::RenovateBaseBranches {
            branch: "release-2".to_string(),
        };

        let err = update.apply("{\"baseBranches\": \"main\"}").unwrap_err();
        assert!(matches!(err, UpdateError::BaseBranchesMissing(_)));
    }

    #[test]
    fn test_invalid_jsonc_fails() {
        let update = ContentUpdate::RenovateBaseBranches {
            branch: "release-2".to_string(),
        };

        let err = update.apply("{\"baseBranches\": [").unwrap_err();
        assert!(matches!(err, UpdateError::InvalidConfig(_)));
    }

    #[test]
    fn test_text_prepend_adds_leading_blank_line() {
        let updated = ContentUpdate::TextPrepend.apply("# Widgets\n").unwrap();
        assert_eq!(updated, "\n # Widgets\n");
    }
}
