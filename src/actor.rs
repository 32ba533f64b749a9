//! The actor: capability registry, ingestion engine, invocation core, and
//! dispatch resolver.
//!
//! # Architecture
//!
//! - **Registry**: five insertion-ordered maps (abilities, conditions,
//!   interactions, sayings, traits). Iteration order is insertion order and
//!   is externally observable: it decides saying precedence and where an
//!   overwritten entry sits.
//! - **Ingestion** ([`Actor::knows`]): merges modules, other actors, tagged
//!   capabilities, and trait bindings into the registry under a configurable
//!   duplicate policy.
//! - **Invocation core** ([`Actor::call`] / [`Actor::can`] / [`Actor::check`]):
//!   resolves declared parameters against call-time arguments, stored traits,
//!   the reserved `actor` name, and defaults — in that strict order — then
//!   invokes the body.
//! - **Dispatch resolver** ([`Actor::say`]): walks the saying map in
//!   registration order and returns the first binding produced.

use std::any::Any;
use std::fmt;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::args::Args;
use crate::capability::{ACTOR_PARAM, Capability};
use crate::config::{ActorConfig, DuplicatePolicy};
use crate::error::{CallError, RegistryError, SayingError, TroupeResult};
use crate::module::{Member, Module};
use crate::role;
use crate::saying::{BoundCall, Saying};
use crate::value::TraitValue;

// ---------------------------------------------------------------------------
// Ingestion descriptors
// ---------------------------------------------------------------------------

/// Anything an actor can ingest via [`Actor::knows`].
#[derive(Clone, Debug)]
pub enum Knowable {
    /// A tagged capability, bucketed by its role.
    Capability(Capability),
    /// A naming-convention resolver.
    Saying(Saying),
    /// A step module; tagged members are bucketed, untagged members skipped.
    Module(Module),
    /// Another actor; all five registry maps are merged in.
    Actor(Actor),
    /// A named trait binding.
    Trait {
        /// Trait name.
        name: String,
        /// Bound value.
        value: TraitValue,
    },
    /// A value with no recognizable role. Always rejected; exists so callers
    /// building ingestion lists from dynamic sources get a diagnosable error
    /// instead of a silent drop.
    Unknowable {
        /// Description of the offending value for the error message.
        argument: String,
    },
}

impl From<Capability> for Knowable {
    fn from(cap: Capability) -> Self {
        Self::Capability(cap)
    }
}

impl From<Saying> for Knowable {
    fn from(saying: Saying) -> Self {
        Self::Saying(saying)
    }
}

impl From<Module> for Knowable {
    fn from(module: Module) -> Self {
        Self::Module(module)
    }
}

impl From<Actor> for Knowable {
    fn from(actor: Actor) -> Self {
        Self::Actor(actor)
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// A screenplay actor owning ordered capability registries and a trait map.
///
/// Cloning an actor produces an independent registry snapshot; the poll
/// engine relies on this so a derived polling chain can never mutate its
/// ancestor's traits.
#[derive(Clone)]
pub struct Actor {
    config: ActorConfig,
    abilities: IndexMap<String, Capability>,
    conditions: IndexMap<String, Capability>,
    interactions: IndexMap<String, Capability>,
    sayings: IndexMap<String, Saying>,
    traits: IndexMap<String, TraitValue>,
}

impl Actor {
    /// Create an empty actor with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ActorConfig::default())
    }

    /// Create an empty actor with an explicit configuration.
    pub fn with_config(config: ActorConfig) -> Self {
        Self {
            config,
            abilities: IndexMap::new(),
            conditions: IndexMap::new(),
            interactions: IndexMap::new(),
            sayings: IndexMap::new(),
            traits: IndexMap::new(),
        }
    }

    /// Create an actor pre-populated with the standard sayings, in their
    /// documented precedence order.
    pub fn with_standard_sayings() -> Self {
        let mut actor = Self::new();
        for saying in crate::sayings::standard() {
            actor.register_saying(saying);
        }
        actor
    }

    /// The actor's configuration.
    pub fn config(&self) -> &ActorConfig {
        &self.config
    }

    /// Registered abilities, in insertion order.
    pub fn abilities(&self) -> &IndexMap<String, Capability> {
        &self.abilities
    }

    /// Registered conditions, in insertion order.
    pub fn conditions(&self) -> &IndexMap<String, Capability> {
        &self.conditions
    }

    /// Registered interactions (tasks and questions), in insertion order.
    pub fn interactions(&self) -> &IndexMap<String, Capability> {
        &self.interactions
    }

    /// Registered sayings, in insertion order.
    pub fn sayings(&self) -> &IndexMap<String, Saying> {
        &self.sayings
    }

    /// Stored traits, in insertion order.
    pub fn traits(&self) -> &IndexMap<String, TraitValue> {
        &self.traits
    }

    /// Look up a trait value by name.
    pub fn trait_value(&self, name: &str) -> Option<&TraitValue> {
        self.traits.get(name)
    }

    /// Look up and downcast a trait value by name.
    pub fn trait_as<T: Any>(&self, name: &str) -> Option<&T> {
        self.traits.get(name).and_then(TraitValue::downcast_ref)
    }

    // -----------------------------------------------------------------------
    // Ingestion engine
    // -----------------------------------------------------------------------

    /// Ingest one item into the registry.
    ///
    /// Re-ingesting an identical, already-registered callable is a no-op.
    /// Rebinding a used name to a different callable overwrites in place
    /// under [`DuplicatePolicy::Overwrite`] and fails under
    /// [`DuplicatePolicy::Strict`].
    pub fn knows(&mut self, item: impl Into<Knowable>) -> TroupeResult<()> {
        match item.into() {
            Knowable::Capability(cap) => self.register_capability(cap),
            Knowable::Saying(saying) => {
                self.insert_saying(saying)?;
                Ok(())
            }
            Knowable::Module(module) => self.add_module_members(&module),
            Knowable::Actor(other) => self.add_actor_context(&other),
            Knowable::Trait { name, value } => {
                self.traits.insert(name, value);
                Ok(())
            }
            Knowable::Unknowable { argument } => {
                Err(RegistryError::UnknowableArgument { argument }.into())
            }
        }
    }

    /// Ingest a sequence of items, in order.
    pub fn knows_all<I>(&mut self, items: I) -> TroupeResult<()>
    where
        I: IntoIterator<Item = Knowable>,
    {
        for item in items {
            self.knows(item)?;
        }
        Ok(())
    }

    /// Bind a trait, overwriting any previous value in place.
    pub fn knows_trait<T: Any + Send + Sync + fmt::Debug>(
        &mut self,
        name: impl Into<String>,
        value: T,
    ) {
        self.traits.insert(name.into(), TraitValue::new(value));
    }

    /// Bind a pre-wrapped trait value (useful for opaque handles).
    pub fn knows_trait_value(&mut self, name: impl Into<String>, value: TraitValue) {
        self.traits.insert(name.into(), value);
    }

    fn register_capability(&mut self, cap: Capability) -> TroupeResult<()> {
        debug!(name = cap.name(), role = %cap.role(), "registering capability");
        self.insert_capability(cap)
    }

    fn insert_capability(&mut self, cap: Capability) -> TroupeResult<()> {
        let policy = self.config.duplicate_policy;
        let map = match cap.role() {
            crate::role::Role::Ability => &mut self.abilities,
            crate::role::Role::Condition => &mut self.conditions,
            crate::role::Role::Task | crate::role::Role::Question => &mut self.interactions,
            crate::role::Role::Saying => {
                return Err(RegistryError::UnknowableArgument {
                    argument: cap.name().to_string(),
                }
                .into());
            }
        };

        if let Some(existing) = map.get(cap.name()) {
            if existing.same_callable(&cap) {
                return Ok(());
            }
            if policy == DuplicatePolicy::Strict {
                return Err(RegistryError::DuplicateCapability {
                    name: cap.name().to_string(),
                }
                .into());
            }
            debug!(name = cap.name(), "overwriting existing capability");
        }
        map.insert(cap.name().to_string(), cap);
        Ok(())
    }

    fn insert_saying(&mut self, saying: Saying) -> TroupeResult<()> {
        if let Some(existing) = self.sayings.get(saying.name()) {
            if existing.same_resolver(&saying) {
                return Ok(());
            }
            if self.config.duplicate_policy == DuplicatePolicy::Strict {
                return Err(RegistryError::DuplicateCapability {
                    name: saying.name().to_string(),
                }
                .into());
            }
            debug!(name = saying.name(), "overwriting existing saying");
        }
        self.register_saying(saying);
        Ok(())
    }

    fn register_saying(&mut self, saying: Saying) {
        self.sayings.insert(saying.name().to_string(), saying);
    }

    fn add_module_members(&mut self, module: &Module) -> TroupeResult<()> {
        debug!(module = module.name(), "ingesting module members");
        for member in module.members() {
            match member {
                Member::Capability(cap) => self.insert_capability(cap.clone())?,
                Member::Saying(saying) => self.insert_saying(saying.clone())?,
                Member::Untagged(name) => {
                    trace!(module = module.name(), member = %name, "skipping untagged member");
                }
            }
        }
        Ok(())
    }

    fn add_actor_context(&mut self, other: &Actor) -> TroupeResult<()> {
        for cap in other.abilities.values() {
            self.insert_capability(cap.clone())?;
        }
        for cap in other.conditions.values() {
            self.insert_capability(cap.clone())?;
        }
        for cap in other.interactions.values() {
            self.insert_capability(cap.clone())?;
        }
        for saying in other.sayings.values() {
            self.insert_saying(saying.clone())?;
        }
        for (name, value) in &other.traits {
            self.traits.insert(name.clone(), value.clone());
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Invocation core
    // -----------------------------------------------------------------------

    /// Call an interaction (task or question) with the given keyword
    /// arguments, resolving its declared parameters first.
    ///
    /// Errors raised by the interaction body propagate unchanged.
    pub fn call(&self, interaction: &Capability, kwargs: Args) -> TroupeResult<TraitValue> {
        role::validate_interaction(interaction)?;
        let resolved = self.resolve_args(interaction, &kwargs)?;
        debug!(interaction = interaction.name(), "calling interaction");
        let f = interaction
            .interaction_fn()
            .ok_or_else(|| crate::error::RoleError::NotInteraction {
                name: interaction.name().to_string(),
            })?;
        f(&resolved)
    }

    /// Perform an ability and merge the traits it grants into this actor.
    pub fn can(&mut self, ability: &Capability, kwargs: Args) -> TroupeResult<()> {
        role::validate_ability(ability)?;
        let resolved = self.resolve_args(ability, &kwargs)?;
        debug!(ability = ability.name(), "performing ability");
        let f = ability
            .ability_fn()
            .ok_or_else(|| crate::error::RoleError::NotAbility {
                name: ability.name().to_string(),
            })?;
        let granted = f(&resolved)?;
        for (name, value) in granted.iter() {
            self.traits.insert(name.to_string(), value.clone());
        }
        Ok(())
    }

    /// Evaluate a condition and return its verdict unmodified.
    pub fn check(&self, condition: &Capability, kwargs: Args) -> TroupeResult<bool> {
        role::validate_condition(condition)?;
        let resolved = self.resolve_args(condition, &kwargs)?;
        debug!(condition = condition.name(), "evaluating condition");
        let f = condition
            .condition_fn()
            .ok_or_else(|| crate::error::RoleError::NotCondition {
                name: condition.name().to_string(),
            })?;
        f(&resolved)
    }

    /// Call a capability after validating it is a task.
    pub fn attempts_to(&self, task: &Capability, kwargs: Args) -> TroupeResult<TraitValue> {
        role::validate_task(task)?;
        self.call(task, kwargs)
    }

    /// Call a capability after validating it is a question.
    pub fn asks_for(&self, question: &Capability, kwargs: Args) -> TroupeResult<TraitValue> {
        role::validate_question(question)?;
        self.call(question, kwargs)
    }

    /// Resolve a capability's declared parameters.
    ///
    /// Per declared parameter, in strict order: call-time argument, stored
    /// trait, the reserved `actor` name (injecting a snapshot of this actor),
    /// declared default. Resolution is pure given `(traits, kwargs,
    /// signature)`. With a catch-all signature, the entire merged context
    /// (traits, then kwargs, then the actor) is appended after the declared
    /// parameters; without one, extra arguments are dropped.
    fn resolve_args(&self, cap: &Capability, kwargs: &Args) -> TroupeResult<Args> {
        let mut resolved = Args::new();

        for param in cap.signature().params() {
            let name = param.name();
            if let Some(value) = kwargs.get(name) {
                trace!(capability = cap.name(), param = name, source = "kwargs", "resolved");
                resolved.set(name, value.clone());
            } else if let Some(value) = self.traits.get(name) {
                trace!(capability = cap.name(), param = name, source = "trait", "resolved");
                resolved.set(name, value.clone());
            } else if name == ACTOR_PARAM {
                resolved.set(name, TraitValue::opaque(self.clone()));
            } else if let Some(default) = param.default() {
                resolved.set(name, default.clone());
            } else {
                return Err(CallError::MissingParameter {
                    parameter: name.to_string(),
                    capability: cap.name().to_string(),
                }
                .into());
            }
        }

        if cap.signature().has_catch_all() {
            for (name, value) in &self.traits {
                if !resolved.contains(name) {
                    resolved.set(name.clone(), value.clone());
                }
            }
            // Call-time arguments win over traits in the merged context too;
            // overwriting keeps the insertion position.
            for (name, value) in kwargs.iter() {
                resolved.set(name, value.clone());
            }
            if !resolved.contains(ACTOR_PARAM) {
                resolved.set(ACTOR_PARAM, TraitValue::opaque(self.clone()));
            }
        }

        Ok(resolved)
    }

    // -----------------------------------------------------------------------
    // Dispatch resolver
    // -----------------------------------------------------------------------

    /// Resolve a free-form name to a lazily bound call by walking the saying
    /// map in registration order. The first saying that produces a binding
    /// wins; precedence is registration order, never specificity.
    pub fn say(&self, name: &str) -> TroupeResult<BoundCall> {
        for (saying_name, saying) in &self.sayings {
            trace!(saying = %saying_name, attr = name, "trying saying");
            if let Some(call) = saying.resolve(self, name) {
                debug!(saying = %saying_name, attr = name, "saying matched");
                return Ok(call);
            }
        }
        Err(SayingError::UnknownSaying {
            name: name.to_string(),
        }
        .into())
    }
}

impl Default for Actor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actor")
            .field("abilities", &self.abilities.keys().collect::<Vec<_>>())
            .field("conditions", &self.conditions.keys().collect::<Vec<_>>())
            .field("interactions", &self.interactions.keys().collect::<Vec<_>>())
            .field("sayings", &self.sayings.keys().collect::<Vec<_>>())
            .field("traits", &self.traits.keys().collect::<Vec<_>>())
            .finish()
    }
}
