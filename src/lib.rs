//! action-kb: GITHUB_TOKEN usage and permission inference for CI actions.
//!
//! Reads an action's manifest, README and source, decides whether it uses
//! the privileged `GITHUB_TOKEN`, how the token is passed in, and which
//! permission scopes its API calls need. Produces an analysis comment and
//! an `action-security.yml` manifest for the knowledge base.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use actionkb::{analyze, AnalyzeOptions};
//! use actionkb::ir::ActionRef;
//!
//! let options = AnalyzeOptions::new(ActionRef::parse("actions/stale").unwrap());
//! let report = analyze(Path::new("./stale"), &options).unwrap();
//! println!("{}: {:?}", report.result.action, report.result.permissions);
//! ```

pub mod adapter;
pub mod analysis;
pub mod config;
pub mod error;
pub mod ir;
pub mod kb;
pub mod output;
pub mod rules;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use analysis::{AnalysisInput, AnalysisResult, Engine};
use config::Config;
use error::Result;
use ir::{ActionRef, RepoMetadata};
use output::OutputFormat;

/// Options for an analysis invocation.
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub action: ActionRef,
    /// Path to config file (defaults to `.action-kb.toml` in the checkout).
    pub config_path: Option<PathBuf>,
    /// Overrides the top language detected from the checkout.
    pub language_override: Option<String>,
    /// Overrides `checkout.git_ref` from the config.
    pub git_ref_override: Option<String>,
    pub repo: RepoMetadata,
}

impl AnalyzeOptions {
    pub fn new(action: ActionRef) -> Self {
        Self {
            action,
            config_path: None,
            language_override: None,
            git_ref_override: None,
            repo: RepoMetadata::default(),
        }
    }
}

/// Complete analysis report.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    /// Location of the manifest relative to the knowledge-base root.
    pub kb_path: PathBuf,
    pub result: AnalysisResult,
}

/// Analyze a local checkout of an action: load config, read the checkout,
/// select token-referencing files, run the engine.
pub fn analyze(path: &Path, options: &AnalyzeOptions) -> Result<AnalysisReport> {
    let config_path = options
        .config_path
        .clone()
        .unwrap_or_else(|| path.join(".action-kb.toml"));
    let config = Config::load(&config_path)?;

    let engine = Engine::new(&config.rules)?;
    let checkout = adapter::load(path, &options.action, &config.checkout, engine.rules())?;

    let matches = engine.token_matches(&checkout.manifest, checkout.readme.as_deref());
    let source_files = engine.select_token_files(&matches, checkout.source_files);
    tracing::debug!(files = source_files.len(), "source files referencing a token");

    let input = AnalysisInput {
        action: options.action.clone(),
        manifest_file: checkout.manifest_file,
        manifest: checkout.manifest,
        readme: checkout.readme,
        top_language: options
            .language_override
            .clone()
            .or(checkout.top_language),
        dependency_manifest: checkout.dependency_manifest,
        source_files,
        repo: options.repo.clone(),
        git_ref: options
            .git_ref_override
            .clone()
            .unwrap_or_else(|| config.checkout.git_ref.clone()),
    };

    let result = engine.analyze(&input)?;
    tracing::info!(action = %result.action, outcome = %result.outcome, "analysis complete");

    Ok(AnalysisReport {
        generated_at: Utc::now(),
        kb_path: kb::manifest_path(&options.action),
        result,
    })
}

/// Render an analysis report in the specified format.
pub fn render_report(report: &AnalysisReport, format: OutputFormat) -> Result<String> {
    output::render(report, format)
}
