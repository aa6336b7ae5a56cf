//! The declarative rule table behind the inference engine.
//!
//! `RuleTable` is plain data (loaded from `[rules]` in `.action-kb.toml`,
//! falling back to [`builtin`]). `CompiledRules` is the immutable, validated
//! form the engine evaluates against.

pub mod builtin;
pub mod permission;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{KbError, Result};

pub use permission::{AccessLevel, HttpVerb, PermissionRecord, PermissionScope};

/// A language whose source the engine will scan for endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageRule {
    /// Linguist-style language name, compared case-insensitively.
    pub name: String,
    /// File holding the dependency list (e.g. `package.json`).
    pub dependency_manifest: String,
    /// Dependencies that indicate the action talks to the GitHub API.
    pub client_libraries: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodVerbRule {
    pub prefix: String,
    pub verb: HttpVerb,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeRule {
    pub fragment: String,
    pub scope: PermissionScope,
}

/// Rule table as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    #[serde(default = "builtin::token_patterns")]
    pub token_patterns: Vec<String>,
    #[serde(default = "builtin::default_token_pattern")]
    pub default_token_pattern: String,
    #[serde(default = "builtin::languages")]
    pub languages: Vec<LanguageRule>,
    #[serde(default = "builtin::method_verbs")]
    pub method_verbs: Vec<MethodVerbRule>,
    #[serde(default = "builtin::scopes")]
    pub scopes: Vec<ScopeRule>,
}

impl Default for RuleTable {
    fn default() -> Self {
        Self {
            token_patterns: builtin::token_patterns(),
            default_token_pattern: builtin::default_token_pattern(),
            languages: builtin::languages(),
            method_verbs: builtin::method_verbs(),
            scopes: builtin::scopes(),
        }
    }
}

impl RuleTable {
    /// Validate the table and compile its patterns.
    pub fn compile(&self) -> Result<CompiledRules> {
        if self.token_patterns.is_empty() {
            return Err(KbError::Config(
                "rules.token_patterns must contain at least one pattern".into(),
            ));
        }
        let token_patterns = self
            .token_patterns
            .iter()
            .map(|p| compile_pattern(p.as_str()))
            .collect::<Result<Vec<_>>>()?;
        let default_token = compile_pattern(&self.default_token_pattern)?;

        for lang in &self.languages {
            if lang.dependency_manifest.trim().is_empty() {
                return Err(KbError::Config(format!(
                    "language '{}' has no dependency_manifest",
                    lang.name
                )));
            }
        }

        Ok(CompiledRules {
            token_patterns,
            default_token,
            languages: self.languages.clone(),
            method_verbs: self.method_verbs.clone(),
            scopes: self.scopes.clone(),
        })
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| KbError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Validated rule table. Immutable for the lifetime of an engine.
#[derive(Debug, Clone)]
pub struct CompiledRules {
    pub token_patterns: Vec<Regex>,
    pub default_token: Regex,
    pub languages: Vec<LanguageRule>,
    pub method_verbs: Vec<MethodVerbRule>,
    pub scopes: Vec<ScopeRule>,
}

impl CompiledRules {
    pub fn language(&self, name: &str) -> Option<&LanguageRule> {
        self.languages
            .iter()
            .find(|l| l.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn scope_for(&self, fragment: &str) -> Option<PermissionScope> {
        self.scopes
            .iter()
            .find(|r| r.fragment == fragment)
            .map(|r| r.scope)
    }

    /// Verb of the first rule whose prefix starts `method`, ignoring case
    /// (`reRunWorkflow` matches `rerun`).
    pub fn verb_for_method(&self, method: &str) -> Option<HttpVerb> {
        let method = method.to_ascii_lowercase();
        self.method_verbs
            .iter()
            .find(|r| method.starts_with(&r.prefix.to_ascii_lowercase()))
            .map(|r| r.verb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_compiles() {
        let rules = RuleTable::default().compile().unwrap();
        assert_eq!(rules.token_patterns.len(), 3);
        assert!(rules.default_token.is_match("${{ github.token }}"));
        assert!(!rules.default_token.is_match("${{ secrets.GITHUB_TOKEN }}"));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let table = RuleTable {
            token_patterns: vec!["(unclosed".into()],
            ..Default::default()
        };
        let err = table.compile().unwrap_err();
        assert!(matches!(err, KbError::Pattern { .. }));
    }

    #[test]
    fn empty_token_patterns_rejected() {
        let table = RuleTable {
            token_patterns: vec![],
            ..Default::default()
        };
        assert!(matches!(table.compile(), Err(KbError::Config(_))));
    }

    #[test]
    fn language_lookup_is_case_insensitive() {
        let rules = RuleTable::default().compile().unwrap();
        assert!(rules.language("typescript").is_some());
        assert!(rules.language("Go").is_none());
    }

    #[test]
    fn lookups() {
        let rules = RuleTable::default().compile().unwrap();
        assert_eq!(rules.scope_for("pulls"), Some(PermissionScope::PullRequests));
        assert_eq!(rules.scope_for("gists"), None);
        assert_eq!(rules.verb_for_method("createComment"), Some(HttpVerb::Post));
        assert_eq!(rules.verb_for_method("listForRepo"), Some(HttpVerb::Get));
        assert_eq!(rules.verb_for_method("paginate"), None);
        assert_eq!(rules.verb_for_method("reRunWorkflow"), Some(HttpVerb::Post));
        assert_eq!(rules.verb_for_method("cancelWorkflowRun"), Some(HttpVerb::Post));
        assert_eq!(rules.verb_for_method("approveWorkflowRun"), Some(HttpVerb::Post));
        assert_eq!(rules.verb_for_method("submitReview"), Some(HttpVerb::Post));
        assert_eq!(rules.verb_for_method("dismissReview"), Some(HttpVerb::Put));
        assert_eq!(rules.verb_for_method("enableWorkflow"), Some(HttpVerb::Put));
        assert_eq!(rules.verb_for_method("disableWorkflow"), Some(HttpVerb::Put));
    }

    #[test]
    fn minimal_table_from_toml() {
        let table: RuleTable = toml::from_str(
            r#"
token_patterns = ["MY_TOKEN"]

[[scopes]]
fragment = "issues"
scope = "issues"
"#,
        )
        .unwrap();
        assert_eq!(table.token_patterns, vec!["MY_TOKEN".to_string()]);
        assert_eq!(table.scopes.len(), 1);
        assert_eq!(table.languages, builtin::languages());
    }
}
