//! Intermediate representation of an action under analysis.
//!
//! The adapter produces these values from a checkout; the engine consumes
//! them without touching the filesystem.

pub mod dependency_surface;
pub mod manifest;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{KbError, Result};

pub use dependency_surface::{DependencyManifest, DependencySurface};
pub use manifest::{ActionInput, ActionManifest};

/// `owner/repo[/path]` reference to an action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionRef {
    pub owner: String,
    pub repo: String,
    /// Sub-directory of the action inside the repository, if any.
    pub path: Option<String>,
}

impl ActionRef {
    /// Parse `owner/repo`, `owner/repo/sub/dir`, optionally with a
    /// `https://github.com/` prefix or an `@ref` suffix.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim().trim_end_matches('/');
        let trimmed = trimmed
            .strip_prefix("https://github.com/")
            .or_else(|| trimmed.strip_prefix("github.com/"))
            .unwrap_or(trimmed);
        let trimmed = trimmed.split('@').next().unwrap_or_default();

        let mut parts = trimmed.split('/').filter(|p| !p.is_empty());
        let owner = parts.next();
        let repo = parts.next();
        let rest: Vec<&str> = parts.collect();
        if !rest.iter().all(|p| is_name(p)) {
            return Err(KbError::InvalidActionRef(s.to_string()));
        }

        match (owner, repo) {
            (Some(owner), Some(repo)) if is_name(owner) && is_name(repo) => Ok(Self {
                owner: owner.to_string(),
                repo: repo.to_string(),
                path: (!rest.is_empty()).then(|| rest.join("/")),
            }),
            _ => Err(KbError::InvalidActionRef(s.to_string())),
        }
    }

    /// Repository name plus the action's sub-path, as used in KB paths.
    pub fn repo_path(&self) -> String {
        match &self.path {
            Some(path) => format!("{}/{}", self.repo, path),
            None => self.repo.clone(),
        }
    }
}

/// One path segment: no separators, not `.` or `..`.
fn is_name(s: &str) -> bool {
    !matches!(s, "" | "." | "..")
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

impl std::fmt::Display for ActionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo_path())
    }
}

/// Execution model declared by `runs.using`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Node,
    Docker,
    Composite,
    Unknown,
}

impl ActionType {
    pub fn from_using(using: &str) -> Self {
        let using = using.trim().to_lowercase();
        if using.starts_with("node") {
            Self::Node
        } else if using == "docker" {
            Self::Docker
        } else if using == "composite" {
            Self::Composite
        } else {
            Self::Unknown
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Node => write!(f, "Node"),
            Self::Docker => write!(f, "Docker"),
            Self::Composite => write!(f, "Composite"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Repository facts reported alongside the analysis. Supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoMetadata {
    pub stars: Option<u64>,
    pub forks: Option<u64>,
    pub private: Option<bool>,
}

/// A source file of the action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path relative to the repository root.
    pub path: PathBuf,
    pub language: Language,
    pub content: String,
    pub size_bytes: u64,
    pub content_hash: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        use sha2::Digest;
        let path = path.into();
        let content = content.into();
        let language = path
            .extension()
            .map(|e| Language::from_extension(&e.to_string_lossy()))
            .unwrap_or(Language::Unknown);
        let content_hash = hex::encode(sha2::Sha256::digest(content.as_bytes()));
        Self {
            path,
            language,
            size_bytes: content.len() as u64,
            content_hash,
            content,
        }
    }
}

/// Programming language of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    TypeScript,
    Python,
    Shell,
    Go,
    Ruby,
    PowerShell,
    Dockerfile,
    Json,
    Yaml,
    Markdown,
    Unknown,
}

impl Language {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "js" | "jsx" | "mjs" | "cjs" => Self::JavaScript,
            "ts" | "tsx" | "mts" | "cts" => Self::TypeScript,
            "py" => Self::Python,
            "sh" | "bash" | "zsh" => Self::Shell,
            "go" => Self::Go,
            "rb" => Self::Ruby,
            "ps1" | "psm1" => Self::PowerShell,
            "json" => Self::Json,
            "yml" | "yaml" => Self::Yaml,
            "md" | "markdown" => Self::Markdown,
            _ => Self::Unknown,
        }
    }

    /// Detect from a file name, including extension-less files like `Dockerfile`.
    pub fn from_file_name(name: &str) -> Self {
        if name == "Dockerfile" || name.ends_with(".dockerfile") {
            return Self::Dockerfile;
        }
        match name.rsplit_once('.') {
            Some((_, ext)) => Self::from_extension(ext),
            None => Self::Unknown,
        }
    }

    /// Whether the language counts toward the repository's top language.
    pub fn is_programming(&self) -> bool {
        !matches!(
            self,
            Self::Json | Self::Yaml | Self::Markdown | Self::Unknown
        )
    }

    /// Name as GitHub's language statistics report it.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::JavaScript => "JavaScript",
            Self::TypeScript => "TypeScript",
            Self::Python => "Python",
            Self::Shell => "Shell",
            Self::Go => "Go",
            Self::Ruby => "Ruby",
            Self::PowerShell => "PowerShell",
            Self::Dockerfile => "Dockerfile",
            Self::Json => "JSON",
            Self::Yaml => "YAML",
            Self::Markdown => "Markdown",
            Self::Unknown => "Unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_ref() {
        let r = ActionRef::parse("peter-evans/create-pull-request").unwrap();
        assert_eq!(r.owner, "peter-evans");
        assert_eq!(r.repo, "create-pull-request");
        assert_eq!(r.path, None);
        assert_eq!(r.to_string(), "peter-evans/create-pull-request");
    }

    #[test]
    fn parses_nested_ref_with_url_and_version() {
        let r = ActionRef::parse("https://github.com/github/codeql-action/init@v2").unwrap();
        assert_eq!(r.repo, "codeql-action");
        assert_eq!(r.path.as_deref(), Some("init"));
        assert_eq!(r.repo_path(), "codeql-action/init");
    }

    #[test]
    fn rejects_single_segment() {
        assert!(ActionRef::parse("checkout").is_err());
        assert!(ActionRef::parse("owner/re po").is_err());
    }

    #[test]
    fn rejects_dot_segments() {
        assert!(ActionRef::parse("a/b/../../x").is_err());
        assert!(ActionRef::parse("../b").is_err());
        assert!(ActionRef::parse("a/b/./init").is_err());
        assert!(ActionRef::parse("a/b/sub.dir/init").is_ok());
    }

    #[test]
    fn action_type_from_using() {
        assert_eq!(ActionType::from_using("node16"), ActionType::Node);
        assert_eq!(ActionType::from_using("node20"), ActionType::Node);
        assert_eq!(ActionType::from_using("docker"), ActionType::Docker);
        assert_eq!(ActionType::from_using("Composite"), ActionType::Composite);
        assert_eq!(ActionType::from_using("wasm"), ActionType::Unknown);
    }

    #[test]
    fn source_file_language_and_hash() {
        let sf = SourceFile::new("src/main.ts", "export {}");
        assert_eq!(sf.language, Language::TypeScript);
        assert_eq!(sf.size_bytes, 9);
        assert_eq!(sf.content_hash.len(), 64);
    }

    #[test]
    fn dockerfile_detection() {
        assert_eq!(Language::from_file_name("Dockerfile"), Language::Dockerfile);
        assert!(!Language::from_file_name("README.md").is_programming());
    }
}
