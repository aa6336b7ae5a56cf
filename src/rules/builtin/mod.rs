//! Built-in rule table: the defaults used when `.action-kb.toml` does not
//! override a section.

use super::permission::{HttpVerb, PermissionScope};
use super::{LanguageRule, MethodVerbRule, ScopeRule};

/// Patterns that count as a reference to the privileged token.
pub fn token_patterns() -> Vec<String> {
    vec![
        r"\$\{\{\s*secrets\.GITHUB_TOKEN\s*\}\}".into(),
        r"\$\{\{\s*github\.token\s*\}\}".into(),
        r"(?i)\b(?:github|repo|gh)[-_]token\b".into(),
    ]
}

/// The conventional "use the ambient default token" expression.
pub fn default_token_pattern() -> String {
    r"\$\{\{.*github\.token.*\}\}".into()
}

pub fn languages() -> Vec<LanguageRule> {
    let node_clients = vec![
        "@actions/github".to_string(),
        "@octokit/rest".to_string(),
        "@octokit/core".to_string(),
        "@octokit/action".to_string(),
        "@octokit/request".to_string(),
    ];
    vec![
        LanguageRule {
            name: "JavaScript".into(),
            dependency_manifest: "package.json".into(),
            client_libraries: node_clients.clone(),
        },
        LanguageRule {
            name: "TypeScript".into(),
            dependency_manifest: "package.json".into(),
            client_libraries: node_clients,
        },
        LanguageRule {
            name: "Python".into(),
            dependency_manifest: "requirements.txt".into(),
            client_libraries: vec!["PyGithub".into(), "ghapi".into(), "github3.py".into()],
        },
    ]
}

/// Method-name prefixes of API client calls and the verb they imply.
pub fn method_verbs() -> Vec<MethodVerbRule> {
    [
        ("get", HttpVerb::Get),
        ("list", HttpVerb::Get),
        ("check", HttpVerb::Get),
        ("compare", HttpVerb::Get),
        ("download", HttpVerb::Get),
        ("create", HttpVerb::Post),
        ("add", HttpVerb::Post),
        ("upload", HttpVerb::Post),
        ("rerun", HttpVerb::Post),
        ("cancel", HttpVerb::Post),
        ("approve", HttpVerb::Post),
        ("submit", HttpVerb::Post),
        ("request", HttpVerb::Post),
        ("update", HttpVerb::Patch),
        ("merge", HttpVerb::Put),
        ("set", HttpVerb::Put),
        ("replace", HttpVerb::Put),
        ("lock", HttpVerb::Put),
        ("dismiss", HttpVerb::Put),
        ("enable", HttpVerb::Put),
        ("disable", HttpVerb::Put),
        ("unlock", HttpVerb::Delete),
        ("delete", HttpVerb::Delete),
        ("remove", HttpVerb::Delete),
    ]
    .into_iter()
    .map(|(prefix, verb)| MethodVerbRule {
        prefix: prefix.into(),
        verb,
    })
    .collect()
}

/// Endpoint fragments (first path segment after `/repos/{owner}/{repo}`, or
/// the namespace of a client call) and the scope they require.
pub fn scopes() -> Vec<ScopeRule> {
    use PermissionScope::*;
    [
        ("actions", Actions),
        ("check-runs", Checks),
        ("check-suites", Checks),
        ("checks", Checks),
        ("contents", Contents),
        ("git", Contents),
        ("commits", Contents),
        ("branches", Contents),
        ("releases", Contents),
        ("tags", Contents),
        ("merges", Contents),
        ("repos", Contents),
        ("deployments", Deployments),
        ("environments", Deployments),
        ("issues", Issues),
        ("labels", Issues),
        ("milestones", Issues),
        ("assignees", Issues),
        ("reactions", Issues),
        ("packages", Packages),
        ("pages", Pages),
        ("pulls", PullRequests),
        ("projects", RepositoryProjects),
        ("code-scanning", SecurityEvents),
        ("codeScanning", SecurityEvents),
        ("statuses", Statuses),
    ]
    .into_iter()
    .map(|(fragment, scope)| ScopeRule {
        fragment: fragment.into(),
        scope,
    })
    .collect()
}
