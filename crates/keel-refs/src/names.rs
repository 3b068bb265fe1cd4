//! Reference name validation following git's `check-ref-format` rules.
//!
//! A full reference name is either a one-level pseudo-ref in upper case
//! (`HEAD`, `ORIG_HEAD`, `FETCH_HEAD`) or a hierarchical name under `refs/`.
//! Each `/`-separated component of a hierarchical name:
//! - Must be non-empty
//! - Must not contain whitespace, control characters, `~`, `^`, `:`, `?`,
//!   `*`, `[`, `\`
//! - Must not contain `..` or `@{`
//! - Must not start with `.` or end with `.lock`
//!
//! and the whole name must not end with `.` or `/`.

use crate::error::{RefError, Result};

/// The distinguished reference naming the repository's current position.
pub const HEAD: &str = "HEAD";

/// Namespace holding branches.
pub const BRANCH_PREFIX: &str = "refs/heads/";

/// Namespace holding tags.
pub const TAG_PREFIX: &str = "refs/tags/";

/// Characters that are forbidden anywhere in a ref name.
const FORBIDDEN_CHARS: &[char] = &[' ', '\t', '\n', '\r', '~', '^', ':', '?', '*', '[', '\\'];

fn invalid(name: &str, reason: impl Into<String>) -> RefError {
    RefError::InvalidName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// `true` for one-level all-caps names such as `HEAD` or `ORIG_HEAD`.
pub fn is_pseudo_ref(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| c.is_ascii_uppercase() || c == '_')
        && name.starts_with(|c: char| c.is_ascii_uppercase())
}

/// Validate a full reference name such as `HEAD` or `refs/heads/main`.
///
/// # Examples
///
/// ```
/// use keel_refs::names::validate_ref_name;
///
/// assert!(validate_ref_name("HEAD").is_ok());
/// assert!(validate_ref_name("refs/heads/feature/auth").is_ok());
/// assert!(validate_ref_name("heads/main").is_err());
/// assert!(validate_ref_name("refs/heads/bad..name").is_err());
/// ```
pub fn validate_ref_name(name: &str) -> Result<()> {
    if is_pseudo_ref(name) {
        return Ok(());
    }
    let Some(rest) = name.strip_prefix("refs/") else {
        return Err(invalid(name, "must be an upper-case pseudo-ref or start with 'refs/'"));
    };
    if rest.is_empty() {
        return Err(invalid(name, "missing name after 'refs/'"));
    }
    check_path(name)
}

/// Validate a short branch name (the part after `refs/heads/`).
pub fn validate_branch_name(short: &str) -> Result<()> {
    if short.is_empty() {
        return Err(invalid(short, "branch name must not be empty"));
    }
    if short == HEAD {
        return Err(invalid(short, "'HEAD' is not a valid branch name"));
    }
    check_path(short)
}

/// `true` if `name` is a well-formed ref under `refs/heads/`.
///
/// This is the shape a name must have for HEAD to be attached to it before
/// the branch has any commit.
pub fn is_branch_ref(name: &str) -> bool {
    name.strip_prefix(BRANCH_PREFIX)
        .is_some_and(|short| validate_branch_name(short).is_ok())
}

/// `true` if `name` lives under `refs/tags/`.
pub fn is_tag_ref(name: &str) -> bool {
    name.starts_with(TAG_PREFIX)
}

/// Strip the `refs/heads/` or `refs/tags/` namespace for display.
pub fn shorten(name: &str) -> &str {
    name.strip_prefix(BRANCH_PREFIX)
        .or_else(|| name.strip_prefix(TAG_PREFIX))
        .unwrap_or(name)
}

fn check_path(name: &str) -> Result<()> {
    if let Some(ch) = name
        .chars()
        .find(|c| c.is_control() || FORBIDDEN_CHARS.contains(c))
    {
        return Err(invalid(name, format!("contains forbidden character: {ch:?}")));
    }
    if name.contains("..") {
        return Err(invalid(name, "must not contain '..'"));
    }
    if name.contains("@{") {
        return Err(invalid(name, "must not contain '@{'"));
    }
    if name == "@" {
        return Err(invalid(name, "'@' alone is reserved"));
    }
    if name.starts_with('/') || name.ends_with('/') {
        return Err(invalid(name, "must not start or end with '/'"));
    }
    if name.ends_with('.') {
        return Err(invalid(name, "must not end with '.'"));
    }

    for component in name.split('/') {
        if component.is_empty() {
            return Err(invalid(name, "path components must not be empty"));
        }
        if component.starts_with('.') {
            return Err(invalid(
                name,
                format!("component must not start with '.': {component:?}"),
            ));
        }
        if component.ends_with(".lock") {
            return Err(invalid(
                name,
                format!("component must not end with '.lock': {component:?}"),
            ));
        }
    }

    Ok(())
}
