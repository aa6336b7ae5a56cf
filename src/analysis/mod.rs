//! The token/permission inference engine.
//!
//! `Engine::analyze` is a pure function of an [`AnalysisInput`]: it never
//! touches the network or the filesystem. Analysis walks a fixed sequence of
//! gates and stops in one of the [`Outcome`] states; each state documents
//! which fields of [`AnalysisResult`] it populates.

pub mod endpoint;
pub mod permissions;
pub mod token;

use std::collections::BTreeSet;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use sha2::Digest;
use url::Url;

use crate::error::Result;
use crate::ir::{
    ActionManifest, ActionRef, ActionType, DependencyManifest, DependencySurface, RepoMetadata,
    SourceFile,
};
use crate::rules::{CompiledRules, PermissionRecord, RuleTable};

pub use endpoint::{EndpointHit, EndpointScanner};
pub use token::TokenInput;

/// Everything the engine needs, already fetched by the caller.
#[derive(Debug, Clone)]
pub struct AnalysisInput {
    pub action: ActionRef,
    /// Name of the manifest file, used in error messages.
    pub manifest_file: String,
    pub manifest: String,
    pub readme: Option<String>,
    /// Top language of the repository; `None` or `"not found"` when it could
    /// not be determined.
    pub top_language: Option<String>,
    pub dependency_manifest: Option<DependencyManifest>,
    /// Source files already known to reference a token.
    pub source_files: Vec<SourceFile>,
    pub repo: RepoMetadata,
    /// Git ref used in follow-up links.
    pub git_ref: String,
}

impl AnalysisInput {
    pub fn new(action: ActionRef, manifest: impl Into<String>) -> Self {
        Self {
            action,
            manifest_file: "action.yml".into(),
            manifest: manifest.into(),
            readme: None,
            top_language: None,
            dependency_manifest: None,
            source_files: Vec::new(),
            repo: RepoMetadata::default(),
            git_ref: "HEAD".into(),
        }
    }
}

/// Terminal state of an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Neither manifest nor README references the token. Only identity,
    /// type and repository metadata are populated.
    NoToken,
    /// Docker/composite action, or no top language: token matches and
    /// default-token flag are populated, nothing downstream.
    TypeExcluded,
    /// Language not in the rule table: token input and follow-up links are
    /// populated, endpoints are not inferred.
    LanguageExcluded,
    /// Every step ran. Endpoints are present only if the action depends on a
    /// known API client.
    FullAnalysis,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoToken => write!(f, "no token reference"),
            Self::TypeExcluded => write!(f, "excluded by action type"),
            Self::LanguageExcluded => write!(f, "excluded by language"),
            Self::FullAnalysis => write!(f, "full analysis"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub action: ActionRef,
    pub action_name: String,
    pub action_type: ActionType,
    pub outcome: Outcome,
    pub top_language: Option<String>,
    pub recognized_language: bool,
    pub token_matches: BTreeSet<String>,
    pub is_default_token: bool,
    pub token_input: TokenInput,
    pub github_api_used: bool,
    pub endpoint_hits: Vec<EndpointHit>,
    pub permissions: PermissionRecord,
    pub follow_up_links: Vec<String>,
    pub repo: RepoMetadata,
    /// SHA-256 of the analyzed manifest text.
    pub manifest_sha256: String,
}

impl AnalysisResult {
    fn empty(input: &AnalysisInput, manifest: &ActionManifest) -> Self {
        Self {
            action: input.action.clone(),
            action_name: manifest.name.clone(),
            action_type: manifest.action_type,
            outcome: Outcome::NoToken,
            top_language: top_language(input).map(str::to_string),
            recognized_language: false,
            token_matches: BTreeSet::new(),
            is_default_token: false,
            token_input: TokenInput::Undetermined,
            github_api_used: false,
            endpoint_hits: Vec::new(),
            permissions: PermissionRecord::new(),
            follow_up_links: Vec::new(),
            repo: input.repo.clone(),
            manifest_sha256: hex::encode(sha2::Sha256::digest(input.manifest.as_bytes())),
        }
    }
}

/// The inference engine. Holds the compiled rule table for its lifetime.
pub struct Engine {
    rules: CompiledRules,
    scanners: Vec<Box<dyn EndpointScanner>>,
}

impl Engine {
    pub fn new(table: &RuleTable) -> Result<Self> {
        Ok(Self {
            rules: table.compile()?,
            scanners: endpoint::all_scanners(),
        })
    }

    pub fn rules(&self) -> &CompiledRules {
        &self.rules
    }

    /// Union of token references in the manifest and README.
    pub fn token_matches(&self, manifest: &str, readme: Option<&str>) -> BTreeSet<String> {
        let mut matches = token::find_tokens(&self.rules.token_patterns, manifest);
        if let Some(readme) = readme {
            matches.extend(token::find_tokens(&self.rules.token_patterns, readme));
        }
        matches
    }

    /// Keep the files whose text contains one of `matches`.
    pub fn select_token_files(
        &self,
        matches: &BTreeSet<String>,
        files: Vec<SourceFile>,
    ) -> Vec<SourceFile> {
        files
            .into_iter()
            .filter(|f| matches.iter().any(|m| f.content.contains(m.as_str())))
            .collect()
    }

    pub fn analyze(&self, input: &AnalysisInput) -> Result<AnalysisResult> {
        let manifest = ActionManifest::parse(&input.manifest_file, &input.manifest)?;
        let mut result = AnalysisResult::empty(input, &manifest);

        let matches = self.token_matches(&input.manifest, input.readme.as_deref());
        if matches.is_empty() {
            tracing::info!(action = %input.action, "no GITHUB_TOKEN reference found");
            return Ok(result);
        }
        tracing::debug!(action = %input.action, ?matches, "token matches");
        result.token_matches = matches;
        result.is_default_token = self.rules.default_token.is_match(&input.manifest);

        let language = match top_language(input) {
            Some(lang)
                if !matches!(
                    manifest.action_type,
                    ActionType::Docker | ActionType::Composite
                ) =>
            {
                lang
            }
            _ => {
                tracing::info!(
                    action = %input.action,
                    action_type = %manifest.action_type,
                    "skipping endpoint inference for action type"
                );
                result.outcome = Outcome::TypeExcluded;
                return Ok(result);
            }
        };

        result.token_input =
            token::classify_input(&manifest, &result.token_matches, &self.rules.default_token);
        result.follow_up_links = follow_up_links(&input.action, &input.git_ref, &input.source_files);

        let Some(language_rule) = self.rules.language(language) else {
            tracing::info!(action = %input.action, language, "language not recognized");
            result.outcome = Outcome::LanguageExcluded;
            return Ok(result);
        };
        result.recognized_language = true;
        result.github_api_used = input
            .dependency_manifest
            .as_ref()
            .map(|m| DependencySurface::parse(m).uses_any(&language_rule.client_libraries))
            .unwrap_or(false);
        tracing::info!(
            action = %input.action,
            github_api_used = result.github_api_used,
            "dependency check"
        );

        if result.github_api_used && !input.source_files.is_empty() {
            result.endpoint_hits =
                endpoint::scan_files(&self.scanners, &input.source_files, &self.rules);
            result.permissions = permissions::normalize(&result.endpoint_hits);
        }
        result.outcome = Outcome::FullAnalysis;
        Ok(result)
    }
}

/// The caller's top language, with `"not found"` and its spellings read as absent.
fn top_language(input: &AnalysisInput) -> Option<&str> {
    input
        .top_language
        .as_deref()
        .map(str::trim)
        .filter(|l| {
            !l.is_empty()
                && !l.eq_ignore_ascii_case("not found")
                && !l.eq_ignore_ascii_case("not_found")
                && !l.eq_ignore_ascii_case("none")
        })
}

fn follow_up_links(action: &ActionRef, git_ref: &str, files: &[SourceFile]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    files
        .iter()
        .filter_map(|f| blob_url(action, git_ref, &f.path))
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

fn blob_url(action: &ActionRef, git_ref: &str, path: &Path) -> Option<String> {
    let mut url = Url::parse("https://github.com/").ok()?;
    {
        let mut segments = url.path_segments_mut().ok()?;
        segments
            .pop_if_empty()
            .push(&action.owner)
            .push(&action.repo)
            .push("blob")
            .push(git_ref);
        for component in path.components() {
            if let Component::Normal(part) = component {
                segments.push(&part.to_string_lossy());
            }
        }
    }
    Some(url.to_string())
}
