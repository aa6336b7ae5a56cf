use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{KbError, Result};
use crate::rules::RuleTable;

/// Top-level configuration from `.action-kb.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rules: RuleTable,
    #[serde(default)]
    pub checkout: CheckoutConfig,
}

/// How a local checkout of an action is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// Files larger than this are skipped.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    /// Glob patterns (relative to the checkout root) excluded from the scan.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
    /// Git ref used in follow-up links.
    #[serde(default = "default_git_ref")]
    pub git_ref: String,
}

fn default_max_file_bytes() -> u64 {
    1_048_576
}

fn default_exclude() -> Vec<String> {
    vec!["node_modules/**".into(), "dist/**".into(), ".git/**".into()]
}

fn default_git_ref() -> String {
    "HEAD".into()
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
            exclude: default_exclude(),
            git_ref: default_git_ref(),
        }
    }
}

impl CheckoutConfig {
    pub fn exclude_patterns(&self) -> Result<Vec<glob::Pattern>> {
        self.exclude
            .iter()
            .map(|p| {
                glob::Pattern::new(p)
                    .map_err(|e| KbError::Config(format!("invalid exclude pattern '{p}': {e}")))
            })
            .collect()
    }
}

impl Config {
    /// Load config from a TOML file. Returns default if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Generate a starter config file.
    pub fn starter_toml() -> &'static str {
        r#"# action-kb configuration

[checkout]
# Files larger than this many bytes are not scanned.
max_file_bytes = 1048576

# Paths excluded from the source scan (bundled output is mostly library code).
exclude = ["node_modules/**", "dist/**", ".git/**"]

# Git ref used when building follow-up links.
git_ref = "HEAD"

# Every [rules] key is optional; omitted keys use the built-in table.
# Run `action-kb list-rules --format json` to see the defaults.
[rules]
# token_patterns = ['(?i)\b(?:github|repo|gh)[-_]token\b']
# default_token_pattern = '\$\{\{.*github\.token.*\}\}'

# [[rules.languages]]
# name = "JavaScript"
# dependency_manifest = "package.json"
# client_libraries = ["@actions/github", "@octokit/rest"]

# [[rules.scopes]]
# fragment = "issues"
# scope = "issues"
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_default() {
        let config = Config::load(Path::new("/nonexistent/.action-kb.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn starter_toml_parses_to_default() {
        let config: Config = toml::from_str(Config::starter_toml()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn loads_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".action-kb.toml");
        std::fs::write(
            &path,
            "[checkout]\ngit_ref = \"main\"\n\n[rules]\ntoken_patterns = [\"BOT_TOKEN\"]\n",
        )
        .unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.checkout.git_ref, "main");
        assert_eq!(config.checkout.max_file_bytes, 1_048_576);
        assert_eq!(config.rules.token_patterns, vec!["BOT_TOKEN".to_string()]);
    }

    #[test]
    fn rejects_unknown_scope() {
        let parsed: std::result::Result<Config, _> =
            toml::from_str("[[rules.scopes]]\nfragment = \"gists\"\nscope = \"gists\"\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn invalid_exclude_is_config_error() {
        let checkout = CheckoutConfig {
            exclude: vec!["[".into()],
            ..Default::default()
        };
        assert!(matches!(checkout.exclude_patterns(), Err(KbError::Config(_))));
    }
}
