//! Sayings: naming-convention resolvers.
//!
//! A saying maps a free-form attribute name (like `can_browse_the_web` or
//! `get_page_title`) to a lazily bound call against an actor's registry.
//! Sayings live in their own ordered registry map; the dispatch resolver
//! ([`Actor::say`](crate::actor::Actor::say)) tries them in registration
//! order and the first match wins.

use std::fmt;
use std::sync::Arc;

use crate::actor::Actor;
use crate::args::Args;
use crate::error::TroupeResult;
use crate::value::TraitValue;

type ResolverFn = Arc<dyn Fn(&Actor, &str) -> Option<BoundCall> + Send + Sync>;

/// A registered naming-convention resolver.
///
/// The resolver inspects the requested name against an actor snapshot and
/// either produces a [`BoundCall`] or declines with `None`, letting the next
/// registered saying try.
#[derive(Clone)]
pub struct Saying {
    name: String,
    resolver: ResolverFn,
}

impl Saying {
    /// Build a saying from a resolver closure.
    pub fn new(
        name: impl Into<String>,
        resolver: impl Fn(&Actor, &str) -> Option<BoundCall> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            resolver: Arc::new(resolver),
        }
    }

    /// Registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Try to resolve an attribute name against an actor.
    pub fn resolve(&self, actor: &Actor, attr: &str) -> Option<BoundCall> {
        (self.resolver)(actor, attr)
    }

    /// Whether two sayings share the same underlying resolver.
    pub fn same_resolver(&self, other: &Saying) -> bool {
        Arc::ptr_eq(&self.resolver, &other.resolver)
    }
}

impl fmt::Debug for Saying {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Saying({})", self.name)
    }
}

// ---------------------------------------------------------------------------
// Bound calls
// ---------------------------------------------------------------------------

/// A lazily bound callable produced by a saying.
///
/// Nothing executes until [`invoke`](BoundCall::invoke) is called; the
/// binding captures an actor snapshot, so later mutations of the originating
/// actor are not observed by the bound call.
pub struct BoundCall {
    description: String,
    f: Box<dyn Fn(Args) -> TroupeResult<TraitValue> + Send + Sync>,
}

impl BoundCall {
    /// Wrap a closure with a human-readable description for diagnostics.
    pub fn new(
        description: impl Into<String>,
        f: impl Fn(Args) -> TroupeResult<TraitValue> + Send + Sync + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            f: Box::new(f),
        }
    }

    /// Execute the bound call with the given keyword arguments.
    pub fn invoke(&self, kwargs: Args) -> TroupeResult<TraitValue> {
        (self.f)(kwargs)
    }

    /// What this binding will do when invoked.
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for BoundCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoundCall({})", self.description)
    }
}
