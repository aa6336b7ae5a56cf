use thiserror::Error;

pub type Result<T> = std::result::Result<T, KbError>;

#[derive(Error, Debug)]
pub enum KbError {
    /// Required metadata (action name, `runs:` section) missing from the manifest.
    #[error("Input error in {file}: {message}")]
    Input { file: String, message: String },

    #[error("Invalid action reference '{0}' (expected owner/repo[/path])")]
    InvalidActionRef(String),

    #[error("No action.yml or action.yaml found in: {0}")]
    NotAnAction(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl KbError {
    pub fn input(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Input {
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        2
    }
}
