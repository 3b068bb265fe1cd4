//! Core reference types.
//!
//! A reference is a name bound to a [`RefValue`]: either a direct object id
//! or the name of another reference. Symbolic links are what make HEAD
//! "attached": `HEAD -> refs/heads/main -> <commit>`.

use std::fmt;

use keel_types::ObjectId;
use serde::{Deserialize, Serialize};

use crate::names;

/// The value a reference holds.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RefValue {
    /// Points straight at an object.
    Direct(ObjectId),
    /// Points at another reference by name.
    Symbolic(String),
}

impl RefValue {
    pub fn is_symbolic(&self) -> bool {
        matches!(self, Self::Symbolic(_))
    }

    pub fn target_id(&self) -> Option<&ObjectId> {
        match self {
            Self::Direct(id) => Some(id),
            Self::Symbolic(_) => None,
        }
    }

    pub fn symbolic_target(&self) -> Option<&str> {
        match self {
            Self::Direct(_) => None,
            Self::Symbolic(name) => Some(name),
        }
    }
}

impl fmt::Display for RefValue {
    /// The on-disk text form git uses for loose refs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(id) => write!(f, "{id}"),
            Self::Symbolic(name) => write!(f, "ref: {name}"),
        }
    }
}

/// A named reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Canonical name (e.g. "refs/heads/main").
    pub name: String,
    pub value: RefValue,
}

impl Reference {
    pub fn new(name: impl Into<String>, value: RefValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Returns the short name of this ref (without the `refs/heads/` or
    /// `refs/tags/` prefix).
    pub fn short_name(&self) -> &str {
        names::shorten(&self.name)
    }

    pub fn is_branch(&self) -> bool {
        self.name.starts_with(names::BRANCH_PREFIX)
    }

    pub fn is_tag(&self) -> bool {
        names::is_tag_ref(&self.name)
    }

    /// The object id, if this reference is direct.
    pub fn target(&self) -> Option<&ObjectId> {
        self.value.target_id()
    }
}

/// Outcome of following a symbolic chain to its end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolved {
    /// The chain ended at a direct reference `name` holding `id`.
    Direct { name: String, id: ObjectId },
    /// The chain ended at `target`, a name with no entry yet.
    Unborn { target: String },
}

impl Resolved {
    pub fn id(&self) -> Option<ObjectId> {
        match self {
            Self::Direct { id, .. } => Some(*id),
            Self::Unborn { .. } => None,
        }
    }

    /// Name of the last reference in the chain.
    pub fn name(&self) -> &str {
        match self {
            Self::Direct { name, .. } => name,
            Self::Unborn { target } => target,
        }
    }

    pub fn is_unborn(&self) -> bool {
        matches!(self, Self::Unborn { .. })
    }

    /// Convert a direct outcome into a [`Reference`].
    pub fn into_reference(self) -> Option<Reference> {
        match self {
            Self::Direct { name, id } => Some(Reference::new(name, RefValue::Direct(id))),
            Self::Unborn { .. } => None,
        }
    }
}
