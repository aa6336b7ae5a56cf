//! Endpoint inference: literal evidence in source text that a file calls the
//! GitHub REST API.

use std::collections::HashSet;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ir::SourceFile;
use crate::rules::{CompiledRules, HttpVerb, PermissionScope};

/// One piece of endpoint evidence. `scope` is `None` when the fragment is not
/// in the rule table; such hits are reported but never become permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointHit {
    pub file: PathBuf,
    pub line: usize,
    pub api_path: String,
    pub verb: Option<HttpVerb>,
    pub scope: Option<PermissionScope>,
}

impl EndpointHit {
    /// `VERB path`, or just the path when the verb is unknown.
    pub fn label(&self) -> String {
        match self.verb {
            Some(verb) => format!("{} {}", verb, self.api_path),
            None => self.api_path.clone(),
        }
    }
}

/// A scanner recognizes one syntactic form of API usage.
pub trait EndpointScanner: Send + Sync {
    fn name(&self) -> &'static str;

    fn scan(&self, file: &SourceFile, rules: &CompiledRules) -> Vec<EndpointHit>;
}

pub fn all_scanners() -> Vec<Box<dyn EndpointScanner>> {
    vec![Box::new(RestPathScanner), Box::new(ClientCallScanner)]
}

/// `"/repos/{owner}/{repo}/issues"`, optionally prefixed by a verb as in
/// `octokit.request("POST /repos/{owner}/{repo}/issues")`.
pub struct RestPathScanner;

static REST_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?:\b(GET|HEAD|POST|PUT|PATCH|DELETE)\s+)?(/repos/[^/\s"'`]+/[^/\s"'`]+(?:/[^\s"'`?,)]*)?)"#,
    )
    .unwrap()
});

impl EndpointScanner for RestPathScanner {
    fn name(&self) -> &'static str {
        "rest-path"
    }

    fn scan(&self, file: &SourceFile, rules: &CompiledRules) -> Vec<EndpointHit> {
        let mut hits = Vec::new();
        for cap in REST_PATH_RE.captures_iter(&file.content) {
            let Some(path) = cap.get(2) else { continue };
            let api_path = path.as_str().trim_end_matches('/').to_string();
            let verb = cap
                .get(1)
                .and_then(|v| HttpVerb::from_str_lenient(v.as_str()));
            // ["", "repos", owner, repo, fragment, ...]
            let scope = api_path
                .split('/')
                .nth(4)
                .and_then(|fragment| rules.scope_for(fragment));
            hits.push(EndpointHit {
                file: file.path.clone(),
                line: line_of(&file.content, path.start()),
                api_path,
                verb,
                scope,
            });
        }
        hits
    }
}

/// Client-library calls such as `octokit.rest.issues.createComment(` or
/// `octokit.paginate(github.pulls.list, ...)`.
pub struct ClientCallScanner;

static CLIENT_CALL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:\b(?:octokit|github|client|api|gh)\s*\.\s*(?:rest\s*\.\s*)?|\.rest\s*\.\s*)([a-z][A-Za-z]*)\s*\.\s*([a-z][A-Za-z]*)\s*[(,]",
    )
    .unwrap()
});

impl EndpointScanner for ClientCallScanner {
    fn name(&self) -> &'static str {
        "client-call"
    }

    fn scan(&self, file: &SourceFile, rules: &CompiledRules) -> Vec<EndpointHit> {
        let mut hits = Vec::new();
        for cap in CLIENT_CALL_RE.captures_iter(&file.content) {
            let (Some(namespace), Some(method)) = (cap.get(1), cap.get(2)) else {
                continue;
            };
            // `rest` itself is not a namespace: `octokit.rest.issues` is
            // matched by the `(?:rest\.)?` branch. `github.context` is the
            // workflow payload, not an API call.
            if matches!(namespace.as_str(), "rest" | "context") {
                continue;
            }
            hits.push(EndpointHit {
                file: file.path.clone(),
                line: line_of(&file.content, namespace.start()),
                api_path: format!("{}.{}", namespace.as_str(), method.as_str()),
                verb: rules.verb_for_method(method.as_str()),
                scope: rules.scope_for(namespace.as_str()),
            });
        }
        hits
    }
}

/// Run every scanner over every file. Hits are kept per file; within one
/// file, repeated `(verb, path)` pairs collapse onto their first occurrence.
pub fn scan_files(
    scanners: &[Box<dyn EndpointScanner>],
    files: &[SourceFile],
    rules: &CompiledRules,
) -> Vec<EndpointHit> {
    let mut all = Vec::new();
    for file in files {
        let mut seen = HashSet::new();
        for scanner in scanners {
            let hits = scanner.scan(file, rules);
            tracing::debug!(
                scanner = scanner.name(),
                file = %file.path.display(),
                hits = hits.len(),
                "scanned source file"
            );
            for hit in hits {
                if seen.insert((hit.verb, hit.api_path.clone())) {
                    all.push(hit);
                }
            }
        }
    }
    all
}

fn line_of(content: &str, offset: usize) -> usize {
    content[..offset].matches('\n').count() + 1
}
