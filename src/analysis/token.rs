//! Token detection (which privileged-token references exist) and token-input
//! classification (how the action receives the token).

use std::collections::BTreeSet;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ir::ActionManifest;

/// How the matched token reaches the action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TokenInput {
    /// A declared `inputs:` entry carries the token.
    DeclaredInput { input: String, is_default: bool },
    /// No input correlates; the token is read from an environment variable
    /// whose name is left for a human to determine.
    EnvironmentVariable,
    /// Classification did not run: no token was found, or the action is
    /// Docker/composite or has no top language. A `TypeExcluded` result is the
    /// one case where matches exist and the input stays undetermined.
    Undetermined,
}

/// Every literal matched by any of `patterns` in `text`.
pub fn find_tokens(patterns: &[Regex], text: &str) -> BTreeSet<String> {
    patterns
        .iter()
        .flat_map(|re| re.find_iter(text).map(|m| m.as_str().to_string()))
        .collect()
}

/// Classify the token input. Total: always `DeclaredInput` or
/// `EnvironmentVariable`.
pub fn classify_input(
    manifest: &ActionManifest,
    matches: &BTreeSet<String>,
    default_token: &Regex,
) -> TokenInput {
    let needles: Vec<String> = matches.iter().map(|m| normalize(m)).collect();

    let declared = manifest.inputs.iter().find(|input| {
        [
            Some(input.name.as_str()),
            input.description.as_deref(),
            input.default.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(normalize)
        .any(|field| needles.iter().any(|n| field.contains(n.as_str())))
    });

    match declared {
        Some(input) => TokenInput::DeclaredInput {
            input: input.name.clone(),
            is_default: input
                .default
                .as_deref()
                .is_some_and(|d| default_token.is_match(d)),
        },
        None => TokenInput::EnvironmentVariable,
    }
}

/// Lower-case and treat `-`/`_` as spaces so `github-token`, `GITHUB_TOKEN`
/// and "GitHub token" compare equal.
fn normalize(s: &str) -> String {
    s.to_lowercase().replace(['-', '_'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleTable;

    fn manifest(text: &str) -> ActionManifest {
        ActionManifest::parse("action.yml", text).unwrap()
    }

    #[test]
    fn finds_and_dedups_tokens() {
        let rules = RuleTable::default().compile().unwrap();
        let found = find_tokens(
            &rules.token_patterns,
            "env:\n  GITHUB_TOKEN: ${{ secrets.GITHUB_TOKEN }}\n  X: ${{ secrets.GITHUB_TOKEN }}\n",
        );
        assert_eq!(
            found.into_iter().collect::<Vec<_>>(),
            vec!["${{ secrets.GITHUB_TOKEN }}".to_string(), "GITHUB_TOKEN".to_string()]
        );
    }

    #[test]
    fn no_tokens_in_unrelated_text() {
        let rules = RuleTable::default().compile().unwrap();
        assert!(find_tokens(&rules.token_patterns, "name: lint\nNPM_TOKEN: x").is_empty());
    }

    #[test]
    fn declared_input_by_default_value() {
        let rules = RuleTable::default().compile().unwrap();
        let m = manifest(
            "name: x\ninputs:\n  token:\n    default: '${{ github.token }}'\nruns:\n  using: node20\n",
        );
        let matches = BTreeSet::from(["${{ github.token }}".to_string()]);
        assert_eq!(
            classify_input(&m, &matches, &rules.default_token),
            TokenInput::DeclaredInput {
                input: "token".into(),
                is_default: true
            }
        );
    }

    #[test]
    fn declared_input_by_name() {
        let rules = RuleTable::default().compile().unwrap();
        let m = manifest("name: x\ninputs:\n  repo-token:\n    required: true\nruns:\n  using: node20\n");
        let matches = BTreeSet::from(["repo_token".to_string()]);
        assert_eq!(
            classify_input(&m, &matches, &rules.default_token),
            TokenInput::DeclaredInput {
                input: "repo-token".into(),
                is_default: false
            }
        );
    }

    #[test]
    fn falls_back_to_environment_variable() {
        let rules = RuleTable::default().compile().unwrap();
        let m = manifest("name: x\ninputs:\n  path:\n    description: where\nruns:\n  using: node20\n");
        let matches = BTreeSet::from(["GITHUB_TOKEN".to_string()]);
        assert_eq!(
            classify_input(&m, &matches, &rules.default_token),
            TokenInput::EnvironmentVariable
        );
    }
}
