//! Step modules: enumerable collections of named, tagged members.
//!
//! A [`Module`] is the explicit registration table that replaces reflective
//! member scanning: step libraries declare their capabilities and sayings in
//! a module, and `knows` buckets each member by its role tag. Untagged
//! members are skipped silently, matching how module ingestion ignores
//! helpers that are not step functions.

use crate::capability::Capability;
use crate::saying::Saying;

/// A member of a step module.
#[derive(Clone, Debug)]
pub enum Member {
    /// A tagged capability (ability, condition, task, or question).
    Capability(Capability),
    /// A naming-convention resolver.
    Saying(Saying),
    /// An untagged member; ignored during ingestion.
    Untagged(String),
}

/// An enumerable collection of named members, ingestible via `knows`.
#[derive(Clone, Debug, Default)]
pub struct Module {
    name: String,
    members: Vec<Member>,
}

impl Module {
    /// Create an empty module.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Add a capability member.
    #[must_use]
    pub fn capability(mut self, cap: Capability) -> Self {
        self.members.push(Member::Capability(cap));
        self
    }

    /// Add a saying member.
    #[must_use]
    pub fn saying(mut self, saying: Saying) -> Self {
        self.members.push(Member::Saying(saying));
        self
    }

    /// Add an untagged member. It is enumerated but never registered.
    #[must_use]
    pub fn untagged(mut self, name: impl Into<String>) -> Self {
        self.members.push(Member::Untagged(name.into()));
        self
    }

    /// Module name, used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Members in declaration order.
    pub fn members(&self) -> &[Member] {
        &self.members
    }
}
