//! The standard sayings: prefix conventions and the traditional screenplay
//! verbs.
//!
//! Each saying here is built once and memoized, so every actor constructed
//! via [`Actor::with_standard_sayings`](crate::actor::Actor::with_standard_sayings)
//! shares the same resolver instances and cross-ingestion between such actors
//! stays idempotent.
//!
//! Registration order is the documented precedence order:
//!
//! 1. `call_ability` (`can_*`)
//! 2. `ask_question` (`get_*`)
//! 3. `perform_task` (`do_*`)
//! 4. `check_condition` (`check_*`)
//! 5. `asks_for_question` (`asks_for_*`)
//! 6. `call_interaction` (exact interaction name)
//! 7. `traditional_screenplay` (`attempts_to` / `asks_for`)

use std::sync::OnceLock;

use crate::actor::Actor;
use crate::args::Args;
use crate::capability::Capability;
use crate::error::{CallError, TroupeResult};
use crate::role;
use crate::saying::{BoundCall, Saying};
use crate::value::TraitValue;

/// The standard sayings in precedence order.
pub fn standard() -> Vec<Saying> {
    vec![
        call_ability(),
        ask_question(),
        perform_task(),
        check_condition(),
        asks_for_question(),
        call_interaction(),
        traditional_screenplay(),
    ]
}

/// `can_<ability>`: perform a registered ability and return the updated
/// actor.
///
/// The binding captures an actor snapshot; invoking it performs the ability
/// on a copy and returns that copy, so the originating actor is never
/// mutated through a saying.
pub fn call_ability() -> Saying {
    static SAYING: OnceLock<Saying> = OnceLock::new();
    SAYING
        .get_or_init(|| {
            Saying::new("call_ability", |actor, attr| {
                let name = attr.strip_prefix("can_")?;
                let ability = actor.abilities().get(name)?.clone();
                let snapshot = actor.clone();
                Some(BoundCall::new(format!("can {name}"), move |kwargs| {
                    let mut updated = snapshot.clone();
                    updated.can(&ability, kwargs)?;
                    Ok(TraitValue::opaque(updated))
                }))
            })
        })
        .clone()
}

/// `get_<question>`: call a registered question.
pub fn ask_question() -> Saying {
    static SAYING: OnceLock<Saying> = OnceLock::new();
    SAYING
        .get_or_init(|| {
            Saying::new("ask_question", |actor, attr| {
                let name = attr.strip_prefix("get_")?;
                let question = actor.interactions().get(name)?;
                role::validate_question(question).ok()?;
                bind_interaction(actor, question, format!("ask {name}"))
            })
        })
        .clone()
}

/// `do_<task>`: call a registered task.
pub fn perform_task() -> Saying {
    static SAYING: OnceLock<Saying> = OnceLock::new();
    SAYING
        .get_or_init(|| {
            Saying::new("perform_task", |actor, attr| {
                let name = attr.strip_prefix("do_")?;
                let task = actor.interactions().get(name)?;
                role::validate_task(task).ok()?;
                bind_interaction(actor, task, format!("do {name}"))
            })
        })
        .clone()
}

/// `check_<condition>`: evaluate a registered condition, returning the
/// verdict as a boolean value.
pub fn check_condition() -> Saying {
    static SAYING: OnceLock<Saying> = OnceLock::new();
    SAYING
        .get_or_init(|| {
            Saying::new("check_condition", |actor, attr| {
                let name = attr.strip_prefix("check_")?;
                let condition = actor.conditions().get(name)?.clone();
                let snapshot = actor.clone();
                Some(BoundCall::new(format!("check {name}"), move |kwargs| {
                    let verdict = snapshot.check(&condition, kwargs)?;
                    Ok(TraitValue::new(verdict))
                }))
            })
        })
        .clone()
}

/// `asks_for_<question>`: alternate spelling of the question convention.
pub fn asks_for_question() -> Saying {
    static SAYING: OnceLock<Saying> = OnceLock::new();
    SAYING
        .get_or_init(|| {
            Saying::new("asks_for_question", |actor, attr| {
                let name = attr.strip_prefix("asks_for_")?;
                let question = actor.interactions().get(name)?;
                role::validate_question(question).ok()?;
                bind_interaction(actor, question, format!("ask {name}"))
            })
        })
        .clone()
}

/// Exact-name lookup in the interaction map, covering both tasks and
/// questions without a prefix.
pub fn call_interaction() -> Saying {
    static SAYING: OnceLock<Saying> = OnceLock::new();
    SAYING
        .get_or_init(|| {
            Saying::new("call_interaction", |actor, attr| {
                let interaction = actor.interactions().get(attr)?;
                bind_interaction(actor, interaction, format!("call {attr}"))
            })
        })
        .clone()
}

/// The traditional screenplay verbs: `attempts_to` and `asks_for`, taking
/// the target capability as a call-time argument (`task` or `question`).
pub fn traditional_screenplay() -> Saying {
    static SAYING: OnceLock<Saying> = OnceLock::new();
    SAYING
        .get_or_init(|| {
            Saying::new("traditional_screenplay", |actor, attr| match attr {
                "attempts_to" => {
                    let snapshot = actor.clone();
                    Some(BoundCall::new("attempts_to", move |mut kwargs| {
                        let task = take_capability(&mut kwargs, "task", "attempts_to")?;
                        snapshot.attempts_to(&task, kwargs)
                    }))
                }
                "asks_for" => {
                    let snapshot = actor.clone();
                    Some(BoundCall::new("asks_for", move |mut kwargs| {
                        let question = take_capability(&mut kwargs, "question", "asks_for")?;
                        snapshot.asks_for(&question, kwargs)
                    }))
                }
                _ => None,
            })
        })
        .clone()
}

fn bind_interaction(
    actor: &Actor,
    interaction: &Capability,
    description: String,
) -> Option<BoundCall> {
    let snapshot = actor.clone();
    let interaction = interaction.clone();
    Some(BoundCall::new(description, move |kwargs| {
        snapshot.call(&interaction, kwargs)
    }))
}

fn take_capability(
    kwargs: &mut Args,
    param: &str,
    verb: &'static str,
) -> TroupeResult<Capability> {
    let value = kwargs
        .remove(param)
        .ok_or_else(|| CallError::MissingParameter {
            parameter: param.to_string(),
            capability: verb.to_string(),
        })?;
    value
        .downcast_ref::<Capability>()
        .cloned()
        .ok_or_else(|| {
            CallError::ParameterType {
                parameter: param.to_string(),
                capability: verb.to_string(),
                expected: "Capability",
            }
            .into()
        })
}
