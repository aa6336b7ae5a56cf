use std::collections::BTreeMap;

use crate::analysis::{AnalysisResult, Outcome};
use crate::ir::RepoMetadata;

use super::manifest;

/// Render the analysis comment posted back on the knowledge-base issue.
pub fn render(result: &AnalysisResult) -> String {
    let manifest = manifest::render(result);

    if result.outcome == Outcome::NoToken {
        return format!(
            "This action's `action.yml` & `README.md` do not contain any reference to GITHUB_TOKEN\n\
             ### action-security.yml\n```yaml\n{}```\n",
            manifest
        );
    }

    let mut out = String::from("### Analysis\n```yml\n");
    out.push_str(&format!("Action Name: {}\n", result.action));
    out.push_str(&format!("Action Type: {}\n", result.action_type));
    out.push_str(&format!(
        "GITHUB_TOKEN Matches: {}\n",
        manifest::join_matches(result)
    ));
    out.push_str(&format!(
        "Top language: {}\n",
        result.top_language.as_deref().unwrap_or("not found")
    ));
    push_repo_metadata(&mut out, &result.repo);
    if result.outcome != Outcome::TypeExcluded {
        out.push_str(&format!("GitHub API used: {}\n", result.github_api_used));
    }
    out.push_str("```\n");

    if !result.endpoint_hits.is_empty() {
        out.push_str("### Endpoints Found\n");
        // Same endpoint from several files is listed once, with every location.
        let mut grouped: BTreeMap<(String, String), Vec<String>> = BTreeMap::new();
        for hit in &result.endpoint_hits {
            let scope = hit
                .scope
                .map(|s| s.to_string())
                .unwrap_or_else(|| "unmapped".into());
            grouped
                .entry((scope, hit.label()))
                .or_default()
                .push(format!("{}:{}", hit.file.display(), hit.line));
        }
        for ((scope, label), locations) in grouped {
            out.push_str(&format!(
                "- {}: `{}` ({})\n",
                scope,
                label,
                locations.join(", ")
            ));
        }
    }

    if !result.follow_up_links.is_empty() {
        out.push_str(&format!(
            "\n#### FollowUp Links.\n{}\n",
            result.follow_up_links.join("\n")
        ));
    }

    out.push_str(&format!(
        "\n### action-security.yml\n```yaml\n{}```\n",
        manifest
    ));
    out
}

fn push_repo_metadata(out: &mut String, repo: &RepoMetadata) {
    let or_unknown = |v: Option<String>| v.unwrap_or_else(|| "unknown".into());
    out.push_str(&format!("Stars: {}\n", or_unknown(repo.stars.map(|s| s.to_string()))));
    out.push_str(&format!(
        "Private: {}\n",
        or_unknown(repo.private.map(|p| p.to_string()))
    ));
    out.push_str(&format!("Forks: {}\n", or_unknown(repo.forks.map(|f| f.to_string()))));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisInput, Engine};
    use crate::ir::{ActionRef, DependencyManifest, SourceFile};
    use crate::rules::RuleTable;
    use pretty_assertions::assert_eq;

    fn analyze(input: &AnalysisInput) -> AnalysisResult {
        Engine::new(&RuleTable::default())
            .unwrap()
            .analyze(input)
            .unwrap()
    }

    #[test]
    fn no_token_comment() {
        let input = AnalysisInput::new(
            ActionRef::parse("acme/lint").unwrap(),
            "name: Lint\nruns:\n  using: node20\n",
        );
        let expected = "This action's `action.yml` & `README.md` do not contain any reference to GITHUB_TOKEN\n\
                        ### action-security.yml\n```yaml\nname: 'Lint' # acme/lint\n# GITHUB_TOKEN not used\n```\n";
        assert_eq!(render(&analyze(&input)), expected);
    }

    #[test]
    fn docker_comment_has_metadata_only() {
        let mut input = AnalysisInput::new(
            ActionRef::parse("acme/container").unwrap(),
            "name: c\nruns:\n  using: docker\nenv:\n  GITHUB_TOKEN: x\n",
        );
        input.repo.stars = Some(12);
        input.repo.private = Some(false);
        let comment = render(&analyze(&input));
        assert!(comment.starts_with("### Analysis\n```yml\nAction Name: acme/container\n"));
        assert!(comment.contains("Action Type: Docker\n"));
        assert!(comment.contains("Stars: 12\nPrivate: false\nForks: unknown\n"));
        assert!(!comment.contains("### Endpoints Found"));
        assert!(!comment.contains("GitHub API used"));
    }

    #[test]
    fn endpoints_are_grouped_across_files() {
        let mut input = AnalysisInput::new(
            ActionRef::parse("acme/commenter").unwrap(),
            "name: c\ninputs:\n  token:\n    default: '${{ secrets.GITHUB_TOKEN }}'\nruns:\n  using: node20\n",
        );
        input.top_language = Some("JavaScript".into());
        input.dependency_manifest = Some(DependencyManifest {
            file_name: "package.json".into(),
            contents: r#"{"dependencies":{"@octokit/rest":"19"}}"#.into(),
        });
        input.source_files = vec![
            SourceFile::new("a.js", "octokit.issues.createComment({})\n"),
            SourceFile::new("b.js", "\n\noctokit.issues.createComment({})\n"),
        ];
        let comment = render(&analyze(&input));
        assert!(comment.contains(
            "### Endpoints Found\n- issues: `POST issues.createComment` (a.js:1, b.js:3)\n"
        ));
        assert!(comment.contains("#### FollowUp Links.\nhttps://github.com/acme/commenter/blob/HEAD/a.js\n"));
        assert!(comment.contains("GitHub API used: true\n"));
        assert!(comment.ends_with("    issues-reason: 'to call POST issues.createComment'\n```\n"));
    }
}
