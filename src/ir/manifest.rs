use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use super::ActionType;
use crate::error::{KbError, Result};

/// A declared entry of the manifest's `inputs:` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionInput {
    pub name: String,
    pub description: Option<String>,
    pub default: Option<String>,
}

/// The parts of `action.yml` the engine relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionManifest {
    pub name: String,
    pub description: Option<String>,
    pub inputs: Vec<ActionInput>,
    pub runs_using: Option<String>,
    pub action_type: ActionType,
    /// False when the YAML could not be parsed and fields were recovered by
    /// line scanning; `inputs` is empty in that case.
    pub structured: bool,
}

static NAME_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^name:[ \t]*(.*)$").unwrap());

static RUNS_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^runs:").unwrap());

static USING_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^[ \t]+using:[ \t]*['"]?([\w.-]+)"#).unwrap());

impl ActionManifest {
    /// Parse manifest text. Falls back to line scanning when the document is
    /// not valid YAML; fails only when the name or `runs:` section is absent.
    pub fn parse(file: &str, text: &str) -> Result<Self> {
        match serde_yaml::from_str::<Value>(text) {
            Ok(doc @ Value::Mapping(_)) => Self::from_document(file, &doc),
            Ok(_) => Self::from_text(file, text),
            Err(e) => {
                tracing::warn!(file, error = %e, "manifest is not valid YAML, scanning lines");
                Self::from_text(file, text)
            }
        }
    }

    fn from_document(file: &str, doc: &Value) -> Result<Self> {
        let name = doc
            .get("name")
            .and_then(scalar_string)
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| KbError::input(file, "manifest has no `name:` field"))?;

        let runs = doc
            .get("runs")
            .filter(|r| r.is_mapping())
            .ok_or_else(|| KbError::input(file, "manifest has no `runs:` section"))?;
        let runs_using = runs.get("using").and_then(scalar_string);
        let action_type = runs_using
            .as_deref()
            .map(ActionType::from_using)
            .unwrap_or(ActionType::Unknown);

        let inputs = match doc.get("inputs") {
            Some(Value::Mapping(map)) => map
                .iter()
                .filter_map(|(key, spec)| {
                    Some(ActionInput {
                        name: scalar_string(key)?,
                        description: spec.get("description").and_then(scalar_string),
                        default: spec.get("default").and_then(scalar_string),
                    })
                })
                .collect(),
            _ => Vec::new(),
        };

        Ok(Self {
            name: name.trim().to_string(),
            description: doc.get("description").and_then(scalar_string),
            inputs,
            runs_using,
            action_type,
            structured: true,
        })
    }

    fn from_text(file: &str, text: &str) -> Result<Self> {
        let name = NAME_LINE_RE
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| unquote(m.as_str()))
            .filter(|n| !n.is_empty())
            .ok_or_else(|| KbError::input(file, "manifest has no `name:` field"))?;

        if !RUNS_LINE_RE.is_match(text) {
            return Err(KbError::input(file, "manifest has no `runs:` section"));
        }
        let runs_using = USING_LINE_RE
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string());
        let action_type = runs_using
            .as_deref()
            .map(ActionType::from_using)
            .unwrap_or(ActionType::Unknown);

        Ok(Self {
            name,
            description: None,
            inputs: Vec::new(),
            runs_using,
            action_type,
            structured: false,
        })
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn unquote(raw: &str) -> String {
    let raw = raw.split(" #").next().unwrap_or_default().trim();
    raw.trim_matches(|c| c == '\'' || c == '"').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NODE_ACTION: &str = r#"
name: 'Issue commenter'
description: 'Comments on issues'
inputs:
  token:
    description: 'GitHub token used to post the comment'
    default: '${{ secrets.GITHUB_TOKEN }}'
  body:
    description: 'Comment body'
    required: true
  retries:
    default: 3
runs:
  using: 'node16'
  main: 'dist/index.js'
"#;

    #[test]
    fn parses_structured_manifest() {
        let m = ActionManifest::parse("action.yml", NODE_ACTION).unwrap();
        assert!(m.structured);
        assert_eq!(m.name, "Issue commenter");
        assert_eq!(m.action_type, ActionType::Node);
        assert_eq!(m.inputs.len(), 3);
        assert_eq!(m.inputs[0].name, "token");
        assert_eq!(
            m.inputs[0].default.as_deref(),
            Some("${{ secrets.GITHUB_TOKEN }}")
        );
        assert_eq!(m.inputs[1].default, None);
        assert_eq!(m.inputs[2].default.as_deref(), Some("3"));
    }

    #[test]
    fn missing_name_is_input_error() {
        let err = ActionManifest::parse("action.yml", "runs:\n  using: docker\n").unwrap_err();
        assert!(matches!(err, KbError::Input { .. }));
    }

    #[test]
    fn missing_runs_is_input_error() {
        let err = ActionManifest::parse("action.yml", "name: x\n").unwrap_err();
        assert!(matches!(err, KbError::Input { .. }));
    }

    #[test]
    fn unknown_runner_is_unknown_type() {
        let m = ActionManifest::parse("action.yml", "name: x\nruns:\n  main: a.js\n").unwrap();
        assert_eq!(m.action_type, ActionType::Unknown);
        assert_eq!(m.runs_using, None);
    }

    #[test]
    fn falls_back_to_line_scan_on_invalid_yaml() {
        let text = "name: \"Broken\" # comment\ninputs:\n  token: [\nruns:\n  using: docker\n";
        let m = ActionManifest::parse("action.yml", text).unwrap();
        assert!(!m.structured);
        assert_eq!(m.name, "Broken");
        assert_eq!(m.action_type, ActionType::Docker);
        assert!(m.inputs.is_empty());
    }
}
