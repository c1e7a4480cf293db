//! Editing-branch name rules.
//!
//! Names are checked locally before any remote call so that a bad name
//! fails fast with a precise reason instead of an opaque `422` from the
//! hosting platform. The rules are git's `check-ref-format` rules for a
//! branch under `refs/heads/`.

use crate::error::{RefError, RefResult};

/// The shared line of development every project starts with.
pub const MAIN_BRANCH: &str = "main";

const FORBIDDEN_CHARS: &[char] = &[' ', '\t', '\n', '\r', '~', '^', ':', '?', '*', '[', '\\'];

fn invalid(name: &str, reason: impl Into<String>) -> RefError {
    RefError::InvalidBranchName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Validate a branch name against git's ref naming rules.
///
/// ```
/// use folio_refs::names::validate_branch_name;
///
/// assert!(validate_branch_name("edit/alice-intro").is_ok());
/// assert!(validate_branch_name("bad..name").is_err());
/// ```
pub fn validate_branch_name(name: &str) -> RefResult<()> {
    if name.is_empty() {
        return Err(invalid(name, "branch name must not be empty"));
    }
    if let Some(ch) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c) || c.is_control()) {
        return Err(invalid(name, format!("contains forbidden character: {ch:?}")));
    }
    if name.contains("..") {
        return Err(invalid(name, "must not contain '..'"));
    }
    if name.contains("@{") || name == "@" {
        return Err(invalid(name, "must not contain '@{' or be '@'"));
    }
    if name.starts_with(['.', '/']) || name.ends_with(['.', '/']) {
        return Err(invalid(name, "must not start or end with '.' or '/'"));
    }
    if name.ends_with(".lock") {
        return Err(invalid(name, "must not end with '.lock'"));
    }
    for component in name.split('/') {
        if component.is_empty() {
            return Err(invalid(name, "must not contain consecutive slashes"));
        }
        if component.starts_with('.') {
            return Err(invalid(name, format!("component must not start with '.': {component:?}")));
        }
    }
    Ok(())
}

/// Validate a name for a private editing branch.
///
/// On top of [`validate_branch_name`], the main line is off limits: an
/// editing session on `main` would make discard delete the project's
/// history.
pub fn validate_editing_branch_name(name: &str) -> RefResult<()> {
    validate_branch_name(name)?;
    if name == MAIN_BRANCH {
        return Err(RefError::ReservedBranch {
            name: name.to_string(),
        });
    }
    Ok(())
}
