use std::fs;
use std::path::Path;

use keel_refs::{validate_branch_name, MAX_SYMBOLIC_DEPTH};
use keel_store::DEFAULT_MAX_PEEL_DEPTH;
use keel_types::Signature;
use serde::{Deserialize, Serialize};

use crate::error::{RepoError, RepoResult};

/// Repository settings.
///
/// Every field has a default, so a TOML file only needs the keys it
/// changes:
///
/// ```toml
/// default_branch = "trunk"
///
/// [identity]
/// name = "Jane Doe"
/// email = "jane@example.com"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// Branch `HEAD` names when a repository is created.
    pub default_branch: String,
    pub max_symbolic_depth: usize,
    pub max_peel_depth: usize,
    /// When false, HEAD moves write no reflog entries.
    pub log_ref_updates: bool,
    /// Committer used when an operation is given no signature.
    pub identity: Option<Identity>,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            default_branch: "main".into(),
            max_symbolic_depth: MAX_SYMBOLIC_DEPTH,
            max_peel_depth: DEFAULT_MAX_PEEL_DEPTH,
            log_ref_updates: true,
            identity: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl RepoConfig {
    pub fn from_toml_str(s: &str) -> RepoResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| RepoError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> RepoResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| RepoError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Check the settings that cannot be expressed through types alone.
    pub fn validate(&self) -> RepoResult<()> {
        validate_branch_name(&self.default_branch)
            .map_err(|e| RepoError::Config(e.to_string()))?;
        if self.max_symbolic_depth == 0 {
            return Err(RepoError::Config("max_symbolic_depth must be at least 1".into()));
        }
        if self.max_peel_depth == 0 {
            return Err(RepoError::Config("max_peel_depth must be at least 1".into()));
        }
        if let Some(identity) = &self.identity {
            identity.signature()?;
        }
        Ok(())
    }

    /// Full ref name of the default branch.
    pub fn default_branch_ref(&self) -> String {
        format!("{}{}", keel_refs::BRANCH_PREFIX, self.default_branch)
    }

    /// A signature for the configured identity, stamped now, or the
    /// `unknown` fallback.
    pub fn signature(&self) -> RepoResult<Signature> {
        match &self.identity {
            Some(identity) => identity.signature(),
            None => Ok(Signature::unknown()),
        }
    }
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    fn signature(&self) -> RepoResult<Signature> {
        Signature::now(self.name.as_str(), self.email.as_str())
            .map_err(|e| RepoError::Config(format!("identity: {e}")))
    }
}
