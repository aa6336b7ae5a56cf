use crate::analysis::{AnalysisResult, Outcome, TokenInput};

/// Render the `action-security.yml` permission manifest.
pub fn render(result: &AnalysisResult) -> String {
    let mut out = format!(
        "name: {} # {}\n",
        yaml_quote(&result.action_name),
        result.action
    );

    match result.outcome {
        Outcome::NoToken => out.push_str("# GITHUB_TOKEN not used\n"),
        Outcome::TypeExcluded => {
            out.push_str(&format!(
                "# GITHUB_TOKEN matches: {}\n",
                join_matches(result)
            ));
            out.push_str(&format!(
                "# permissions not inferred (action type: {}, top language: {})\n",
                result.action_type,
                result.top_language.as_deref().unwrap_or("not found"),
            ));
        }
        Outcome::LanguageExcluded | Outcome::FullAnalysis => {
            out.push_str("github-token:\n");
            match &result.token_input {
                TokenInput::DeclaredInput { input, is_default } => {
                    out.push_str("  action-input:\n");
                    out.push_str(&format!("    input: {}\n", input));
                    out.push_str(&format!("    is-default: {}\n", is_default));
                }
                TokenInput::EnvironmentVariable | TokenInput::Undetermined => {
                    out.push_str("  environment-variable-name: <FigureOutYourself>\n");
                }
            }

            if !result.permissions.is_empty() {
                out.push_str("  permissions:\n");
                for (scope, entry) in result.permissions.iter() {
                    let endpoints: Vec<&str> = entry.endpoints.iter().map(String::as_str).collect();
                    out.push_str(&format!("    {}: {}\n", scope, entry.level));
                    out.push_str(&format!(
                        "    {}-reason: {}\n",
                        scope,
                        yaml_quote(&format!("to call {}", endpoints.join(", ")))
                    ));
                }
            } else if result.outcome == Outcome::LanguageExcluded {
                out.push_str(&format!(
                    "  # permissions not inferred for {} source\n",
                    result.top_language.as_deref().unwrap_or("unknown")
                ));
            } else if !result.github_api_used {
                out.push_str("  # no GitHub API client dependency found\n");
            } else {
                out.push_str("  # no GitHub API endpoints found in source\n");
            }
        }
    }

    out
}

pub(crate) fn join_matches(result: &AnalysisResult) -> String {
    result
        .token_matches
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

fn yaml_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
