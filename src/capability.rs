//! Capability descriptors: explicit registration records for step functions.
//!
//! Instead of runtime signature reflection, every step function is registered
//! through a constructor that fixes its name, [`Role`], declared parameters,
//! and body in one descriptor. The invocation core reads the declared
//! parameters to resolve arguments; it never inspects the body.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::args::Args;
use crate::error::TroupeResult;
use crate::role::Role;
use crate::value::TraitValue;

/// Reserved parameter name that resolves to the calling actor itself.
pub const ACTOR_PARAM: &str = "actor";

// ---------------------------------------------------------------------------
// Parameter specs
// ---------------------------------------------------------------------------

/// A single declared parameter of a capability.
#[derive(Clone, Debug)]
pub struct ParamSpec {
    name: String,
    default: Option<TraitValue>,
}

impl ParamSpec {
    /// A required parameter.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    /// A parameter with a declared default value.
    pub fn with_default(name: impl Into<String>, default: TraitValue) -> Self {
        Self {
            name: name.into(),
            default: Some(default),
        }
    }

    /// Parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared default, if any.
    pub fn default(&self) -> Option<&TraitValue> {
        self.default.as_ref()
    }
}

/// The declared parameter list of a capability.
#[derive(Clone, Debug, Default)]
pub struct Signature {
    params: Vec<ParamSpec>,
    catch_all: bool,
}

impl Signature {
    /// An empty signature.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a required parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.params.push(ParamSpec::required(name));
        self
    }

    /// Declare a parameter with a default value.
    #[must_use]
    pub fn param_with_default<T: Any + Send + Sync + fmt::Debug>(
        mut self,
        name: impl Into<String>,
        default: T,
    ) -> Self {
        self.params
            .push(ParamSpec::with_default(name, TraitValue::new(default)));
        self
    }

    /// Declare a catch-all keyword parameter. A capability with a catch-all
    /// receives the entire merged context (traits, call-time arguments, and
    /// the actor) in addition to its resolved named parameters.
    #[must_use]
    pub fn catch_all(mut self) -> Self {
        self.catch_all = true;
        self
    }

    /// Declared parameters, in declaration order.
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Whether the catch-all keyword parameter is declared.
    pub fn has_catch_all(&self) -> bool {
        self.catch_all
    }
}

// ---------------------------------------------------------------------------
// Capability
// ---------------------------------------------------------------------------

pub(crate) type InteractionFn = Arc<dyn Fn(&Args) -> TroupeResult<TraitValue> + Send + Sync>;
pub(crate) type AbilityFn = Arc<dyn Fn(&Args) -> TroupeResult<Args> + Send + Sync>;
pub(crate) type ConditionFn = Arc<dyn Fn(&Args) -> TroupeResult<bool> + Send + Sync>;

#[derive(Clone)]
enum Body {
    Interaction(InteractionFn),
    Ability(AbilityFn),
    Condition(ConditionFn),
}

/// A registered step function: name, role marker, declared parameters, body.
///
/// Clones share the underlying body, so re-ingesting a clone of an already
/// registered capability is recognized as the identical callable.
#[derive(Clone)]
pub struct Capability {
    name: String,
    role: Role,
    signature: Signature,
    body: Body,
}

impl Capability {
    /// Build an ability: performed via `can`, returns a trait mapping that is
    /// merged into the actor's traits.
    pub fn ability(
        name: impl Into<String>,
        signature: Signature,
        body: impl Fn(&Args) -> TroupeResult<Args> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            role: Role::Ability,
            signature,
            body: Body::Ability(Arc::new(body)),
        }
    }

    /// Build a condition: evaluated via `check`, returns a verdict.
    pub fn condition(
        name: impl Into<String>,
        signature: Signature,
        body: impl Fn(&Args) -> TroupeResult<bool> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            role: Role::Condition,
            signature,
            body: Body::Condition(Arc::new(body)),
        }
    }

    /// Build a task: an interaction with no required return contract.
    pub fn task(
        name: impl Into<String>,
        signature: Signature,
        body: impl Fn(&Args) -> TroupeResult<TraitValue> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            role: Role::Task,
            signature,
            body: Body::Interaction(Arc::new(body)),
        }
    }

    /// Build a question: an interaction expected to return a value.
    pub fn question(
        name: impl Into<String>,
        signature: Signature,
        body: impl Fn(&Args) -> TroupeResult<TraitValue> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            role: Role::Question,
            signature,
            body: Body::Interaction(Arc::new(body)),
        }
    }

    /// Registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Role marker.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Declared parameter list.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Whether two capabilities share the same underlying body.
    pub fn same_callable(&self, other: &Capability) -> bool {
        match (&self.body, &other.body) {
            (Body::Interaction(a), Body::Interaction(b)) => Arc::ptr_eq(a, b),
            (Body::Ability(a), Body::Ability(b)) => Arc::ptr_eq(a, b),
            (Body::Condition(a), Body::Condition(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub(crate) fn interaction_fn(&self) -> Option<&InteractionFn> {
        match &self.body {
            Body::Interaction(f) => Some(f),
            _ => None,
        }
    }

    pub(crate) fn ability_fn(&self) -> Option<&AbilityFn> {
        match &self.body {
            Body::Ability(f) => Some(f),
            _ => None,
        }
    }

    pub(crate) fn condition_fn(&self) -> Option<&ConditionFn> {
        match &self.body {
            Body::Condition(f) => Some(f),
            _ => None,
        }
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Capability({} {})", self.role, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_fix_the_role() {
        let ability = Capability::ability("be_cool", Signature::new(), |_| {
            Ok(Args::new().with_value("cool", true))
        });
        let condition =
            Capability::condition("be", Signature::new().param("actual"), |_| Ok(true));
        let task = Capability::task("do_it", Signature::new(), |_| {
            Ok(TraitValue::new(()))
        });
        let question = Capability::question("count", Signature::new(), |_| {
            Ok(TraitValue::new(0_i64))
        });

        assert_eq!(ability.role(), Role::Ability);
        assert_eq!(condition.role(), Role::Condition);
        assert_eq!(task.role(), Role::Task);
        assert_eq!(question.role(), Role::Question);
    }

    #[test]
    fn clones_are_the_same_callable() {
        let task = Capability::task("do_it", Signature::new(), |_| {
            Ok(TraitValue::new(()))
        });
        assert!(task.same_callable(&task.clone()));

        let rebuilt = Capability::task("do_it", Signature::new(), |_| {
            Ok(TraitValue::new(()))
        });
        assert!(!task.same_callable(&rebuilt));
    }

    #[test]
    fn signature_records_defaults_and_catch_all() {
        let sig = Signature::new()
            .param("task")
            .param_with_default("speed", "lightning")
            .catch_all();
        assert_eq!(sig.params().len(), 2);
        assert_eq!(sig.params()[0].name(), "task");
        assert!(sig.params()[0].default().is_none());
        assert!(sig.params()[1].default().is_some());
        assert!(sig.has_catch_all());
    }
}
