//! Loads engine inputs from a local checkout of an action.
//!
//! This is the offline stand-in for fetching `action.yml`, the README, the
//! language statistics and the code-search results over the GitHub API.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::CheckoutConfig;
use crate::error::{KbError, Result};
use crate::ir::{ActionRef, DependencyManifest, Language, SourceFile};
use crate::rules::CompiledRules;

const MANIFEST_NAMES: &[&str] = &["action.yml", "action.yaml"];

/// Everything read from the checkout, before token-file selection.
#[derive(Debug, Clone)]
pub struct Checkout {
    pub root: PathBuf,
    pub manifest_file: String,
    pub manifest: String,
    pub readme: Option<String>,
    /// Language with the most bytes of source, if any source exists.
    pub top_language: Option<String>,
    pub dependency_manifest: Option<DependencyManifest>,
    /// Source files, with paths relative to the repository root.
    pub source_files: Vec<SourceFile>,
}

/// Path of the action manifest in `root`, if there is one.
pub fn detect(root: &Path) -> Option<PathBuf> {
    MANIFEST_NAMES
        .iter()
        .map(|name| root.join(name))
        .find(|p| p.is_file())
}

/// Read a checkout rooted at the action's directory. Source paths are
/// prefixed with the action's sub-path so they are relative to the repository.
pub fn load(
    root: &Path,
    action: &ActionRef,
    config: &CheckoutConfig,
    rules: &CompiledRules,
) -> Result<Checkout> {
    let manifest_path =
        detect(root).ok_or_else(|| KbError::NotAnAction(root.display().to_string()))?;
    let manifest = std::fs::read_to_string(&manifest_path)?;
    let manifest_file = manifest_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "action.yml".into());

    let readme = find_readme(root)?;
    let (source_files, top_language) = collect_sources(root, action, config)?;

    let dependency_manifest = top_language
        .as_deref()
        .and_then(|lang| rules.language(lang))
        .and_then(|rule| {
            let path = root.join(&rule.dependency_manifest);
            match std::fs::read_to_string(&path) {
                Ok(contents) => Some(DependencyManifest {
                    file_name: rule.dependency_manifest.clone(),
                    contents,
                }),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "no dependency manifest");
                    None
                }
            }
        });

    tracing::info!(
        root = %root.display(),
        files = source_files.len(),
        top_language = top_language.as_deref().unwrap_or("not found"),
        "loaded checkout"
    );

    Ok(Checkout {
        root: root.to_path_buf(),
        manifest_file,
        manifest,
        readme,
        top_language,
        dependency_manifest,
        source_files,
    })
}

fn find_readme(root: &Path) -> Result<Option<String>> {
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(root)?
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.file_name()
                    .map(|n| n.to_string_lossy().to_lowercase())
                    .is_some_and(|n| n == "readme" || n.starts_with("readme."))
        })
        .collect();
    candidates.sort();

    match candidates.first() {
        Some(path) => Ok(std::fs::read_to_string(path).ok()),
        None => Ok(None),
    }
}

fn collect_sources(
    root: &Path,
    action: &ActionRef,
    config: &CheckoutConfig,
) -> Result<(Vec<SourceFile>, Option<String>)> {
    let excludes = config.exclude_patterns()?;
    let prefix = action.path.as_deref().map(PathBuf::from).unwrap_or_default();

    let mut source_files = Vec::new();
    let mut bytes_by_language: HashMap<Language, u64> = HashMap::new();

    let walker = ignore::WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .build();

    for entry in walker.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let relative = path.strip_prefix(root).unwrap_or(path);
        if excludes.iter().any(|p| p.matches_path(relative)) {
            continue;
        }
        let language = path
            .file_name()
            .map(|n| Language::from_file_name(&n.to_string_lossy()))
            .unwrap_or(Language::Unknown);
        if !language.is_programming() {
            continue;
        }

        let metadata = std::fs::metadata(path)?;
        if metadata.len() > config.max_file_bytes {
            tracing::debug!(path = %relative.display(), size = metadata.len(), "skipping large file");
            continue;
        }
        *bytes_by_language.entry(language).or_default() += metadata.len();

        match std::fs::read_to_string(path) {
            Ok(content) => {
                let mut file = SourceFile::new(prefix.join(relative), content);
                file.language = language;
                source_files.push(file);
            }
            Err(e) => tracing::warn!(path = %relative.display(), error = %e, "unreadable file"),
        }
    }

    source_files.sort_by(|a, b| a.path.cmp(&b.path));

    let top_language = bytes_by_language
        .into_iter()
        .max_by(|a, b| {
            a.1.cmp(&b.1)
                .then_with(|| b.0.display_name().cmp(a.0.display_name()))
        })
        .map(|(lang, _)| lang.display_name().to_string());

    Ok((source_files, top_language))
}
