//! Knowledge-base conventions: issue titles and the on-disk layout of
//! `actions/<owner>/<repo>/action-security.yml`.

use std::path::PathBuf;

use crate::error::{KbError, Result};
use crate::ir::ActionRef;

pub const MANIFEST_FILE_NAME: &str = "action-security.yml";

const TITLE_MARKER: &str = "[kb]";

/// Whether an issue/PR title requests a knowledge-base entry.
pub fn is_kb_title(title: &str) -> bool {
    title.trim_start().to_lowercase().starts_with(TITLE_MARKER)
}

/// Extract the action from a title such as `[KB] Add KB for owner/repo`.
pub fn action_from_title(title: &str) -> Result<ActionRef> {
    if !is_kb_title(title) {
        return Err(KbError::InvalidActionRef(title.to_string()));
    }
    title
        .split_whitespace()
        .rev()
        .map(|word| word.trim_matches(|c: char| matches!(c, '`' | '"' | '\'' | '.' | ',' | '(' | ')')))
        .find(|word| word.contains('/'))
        .ok_or_else(|| KbError::InvalidActionRef(title.to_string()))
        .and_then(ActionRef::parse)
}

/// Directory of an action's entry, relative to the knowledge-base root.
pub fn entry_dir(action: &ActionRef) -> PathBuf {
    let mut dir = PathBuf::from("actions");
    dir.push(action.owner.to_lowercase());
    for part in action.repo_path().to_lowercase().split('/') {
        dir.push(part);
    }
    dir
}

/// Path of an action's permission manifest, relative to the knowledge-base root.
pub fn manifest_path(action: &ActionRef) -> PathBuf {
    entry_dir(action).join(MANIFEST_FILE_NAME)
}

/// Content written for a new entry before analysis has run.
pub fn placeholder_manifest(action: &ActionRef) -> String {
    format!(
        "# Add permissions for {}\n# Info: Checkout the analysis comment to see info.\n",
        action
    )
}
