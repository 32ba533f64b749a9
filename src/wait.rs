//! The poll engine: `wait`/`on`/`to` builder stages and their sayings.
//!
//! Waiting is expressed as a fluent chain of derived actors:
//!
//! ```text
//! wait(actor, timeout, interval) -> on(_, question, q_args) -> to(_, condition, c_args)
//! ```
//!
//! Each stage clones the full registry into a fresh actor and stashes its
//! stage data as traits, so the chain never mutates its ancestor and two
//! chains derived from the same actor cannot interfere. The final `to` stage
//! runs a bounded retry loop: ask the question, check the condition against
//! its answer, sleep and repeat until satisfied or the timeout budget is
//! exhausted.
//!
//! Time is behind the [`Clock`] seam. Production code uses the wall-clock
//! [`SystemClock`]; tests install a [`ManualClock`] via the `"clock"` trait
//! to make the loop deterministic and sleepless.

use std::any::Any;
use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::actor::Actor;
use crate::args::Args;
use crate::capability::{ACTOR_PARAM, Capability, Signature};
use crate::config::ActorConfig;
use crate::error::{CallError, TroupeError, TroupeResult, WaitError};
use crate::module::Module;
use crate::role;
use crate::saying::{BoundCall, Saying};
use crate::value::TraitValue;

/// Trait name holding the poll timeout budget.
pub const TIMEOUT_TRAIT: &str = "timeout";
/// Trait name holding the sleep interval between poll iterations.
pub const INTERVAL_TRAIT: &str = "interval";
/// Trait name holding the question capability chosen by the `on` stage.
pub const ON_QUESTION_TRAIT: &str = "on_question";
/// Trait name holding the question arguments chosen by the `on` stage.
pub const ON_QUESTION_ARGS_TRAIT: &str = "on_question_args";
/// Trait name holding the injected [`Clock`].
pub const CLOCK_TRAIT: &str = "clock";

/// Parameter name a condition receives the question's answer under.
pub const ACTUAL_PARAM: &str = "actual";

const INTERNAL_TRAITS: [&str; 5] = [
    TIMEOUT_TRAIT,
    INTERVAL_TRAIT,
    ON_QUESTION_TRAIT,
    ON_QUESTION_ARGS_TRAIT,
    CLOCK_TRAIT,
];

// ---------------------------------------------------------------------------
// Clock seam
// ---------------------------------------------------------------------------

/// Time source used by the poll loop.
pub trait Clock: Send + Sync {
    /// Monotonic elapsed time since the clock's origin.
    fn now(&self) -> Duration;
    /// Block for the given duration.
    fn sleep(&self, duration: Duration);
}

/// Wall-clock time via a monotonic [`Instant`] and `thread::sleep`.
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// A clock whose origin is now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug, Default)]
struct ManualState {
    now: Duration,
    sleeps: Vec<Duration>,
}

/// A virtual clock for tests: `sleep` records the request and advances
/// virtual time instead of blocking.
#[derive(Debug, Default)]
pub struct ManualClock {
    state: Mutex<ManualState>,
}

impl ManualClock {
    /// A clock starting at zero with no recorded sleeps.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance virtual time without recording a sleep.
    pub fn advance(&self, duration: Duration) {
        self.lock().now += duration;
    }

    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.lock().sleeps.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.lock().now
    }

    fn sleep(&self, duration: Duration) {
        let mut state = self.lock();
        state.sleeps.push(duration);
        state.now += duration;
    }
}

/// Install a clock on an actor; the poll loop will use it instead of the
/// wall clock. Derived actors inherit it through the registry merge.
pub fn install_clock(actor: &mut Actor, clock: std::sync::Arc<dyn Clock>) {
    actor.knows_trait_value(CLOCK_TRAIT, TraitValue::opaque(clock));
}

fn clock_for(actor: &Actor) -> std::sync::Arc<dyn Clock> {
    actor
        .trait_as::<std::sync::Arc<dyn Clock>>(CLOCK_TRAIT)
        .cloned()
        .unwrap_or_else(|| std::sync::Arc::new(SystemClock::new()))
}

// ---------------------------------------------------------------------------
// Builder stages
// ---------------------------------------------------------------------------

fn derive_from(actor: &Actor) -> TroupeResult<Actor> {
    let mut derived = Actor::with_config(actor.config().clone());
    derived.knows(actor.clone())?;
    derived.knows(crate::sayings::call_interaction())?;
    Ok(derived)
}

/// Start a wait chain: a derived actor carrying the timeout and interval as
/// traits, plus the `on` stage and its saying.
pub fn wait(actor: &Actor, timeout: Duration, interval: Duration) -> TroupeResult<Actor> {
    debug!(?timeout, ?interval, "starting wait chain");
    let mut derived = derive_from(actor)?;
    derived.knows(on_interaction())?;
    derived.knows(on_question())?;
    derived.knows_trait(TIMEOUT_TRAIT, timeout);
    derived.knows_trait(INTERVAL_TRAIT, interval);
    Ok(derived)
}

/// Start a wait chain with the actor's configured default timeout and
/// interval.
pub fn wait_with_defaults(actor: &Actor) -> TroupeResult<Actor> {
    let config = actor.config();
    wait(actor, config.wait_timeout, config.wait_interval)
}

/// Choose the question to poll: a derived actor carrying the question and
/// its arguments as traits, plus the `to` stage and its saying.
pub fn on(wait_actor: &Actor, question: &Capability, q_args: Args) -> TroupeResult<Actor> {
    role::validate_question(question)?;
    debug!(question = question.name(), "choosing wait question");
    let mut derived = derive_from(wait_actor)?;
    derived.knows(to_interaction())?;
    derived.knows(to_condition())?;
    derived.knows_trait_value(ON_QUESTION_TRAIT, TraitValue::new(question.clone()));
    derived.knows_trait_value(ON_QUESTION_ARGS_TRAIT, TraitValue::new(q_args));
    Ok(derived)
}

/// Run the poll loop against the chosen question until the condition is
/// satisfied, returning the satisfying answer.
///
/// The loop body runs at least once, so a zero timeout still gets one
/// evaluation. On exhaustion the error renders both calls in
/// `name(k=v, ...)` form.
pub fn to(on_actor: &Actor, condition: &Capability, c_args: Args) -> TroupeResult<TraitValue> {
    role::validate_condition(condition)?;

    let timeout = *required_trait::<Duration>(on_actor, TIMEOUT_TRAIT)?;
    let interval = *required_trait::<Duration>(on_actor, INTERVAL_TRAIT)?;
    let question = required_trait::<Capability>(on_actor, ON_QUESTION_TRAIT)?.clone();
    let q_args = required_trait::<Args>(on_actor, ON_QUESTION_ARGS_TRAIT)?.clone();
    let clock = clock_for(on_actor);

    debug!(
        question = question.name(),
        condition = condition.name(),
        ?timeout,
        ?interval,
        "polling"
    );

    let end = clock.now().checked_add(timeout).unwrap_or(Duration::MAX);
    let mut answer = on_actor.call(&question, q_args.clone())?;
    let mut satisfied = check_answer(on_actor, condition, &answer, &c_args)?;

    while !satisfied && clock.now() < end {
        trace!(question = question.name(), "unsatisfied, sleeping");
        clock.sleep(interval);
        answer = on_actor.call(&question, q_args.clone())?;
        satisfied = check_answer(on_actor, condition, &answer, &c_args)?;
    }

    if satisfied {
        Ok(answer)
    } else {
        Err(WaitError::Timeout {
            timeout,
            question: q_args.describe_call(question.name()),
            condition: c_args.describe_call(condition.name()),
        }
        .into())
    }
}

fn check_answer(
    actor: &Actor,
    condition: &Capability,
    answer: &TraitValue,
    c_args: &Args,
) -> TroupeResult<bool> {
    let mut args = Args::new().with(ACTUAL_PARAM, answer.clone());
    args.merge(c_args);
    actor.check(condition, args)
}

fn required_trait<'a, T: Any>(actor: &'a Actor, name: &str) -> TroupeResult<&'a T> {
    actor.trait_as::<T>(name).ok_or_else(|| {
        TroupeError::from(CallError::MissingParameter {
            parameter: name.to_string(),
            capability: "to".to_string(),
        })
    })
}

fn required_arg<'a, T: Any>(
    args: &'a Args,
    name: &str,
    capability: &'static str,
    expected: &'static str,
) -> TroupeResult<&'a T> {
    args.get_as::<T>(name).ok_or_else(|| {
        TroupeError::from(CallError::ParameterType {
            parameter: name.to_string(),
            capability: capability.to_string(),
            expected,
        })
    })
}

// Everything the catch-all context carries except the declared stage
// parameters and the chain's own plumbing traits.
fn extra_args(args: &Args, declared: &[&str]) -> Args {
    let mut extras = Args::new();
    for (name, value) in args.iter() {
        if declared.contains(&name) || name == ACTOR_PARAM || INTERNAL_TRAITS.contains(&name) {
            continue;
        }
        extras.set(name, value.clone());
    }
    extras
}

// ---------------------------------------------------------------------------
// Registered-interaction forms
// ---------------------------------------------------------------------------

/// The `wait` stage as a registered task. Memoized so re-ingestion across
/// derived actors is idempotent.
pub fn wait_interaction() -> Capability {
    static CAP: OnceLock<Capability> = OnceLock::new();
    CAP.get_or_init(|| {
        let defaults = ActorConfig::default();
        Capability::task(
            "wait",
            Signature::new()
                .param(ACTOR_PARAM)
                .param_with_default(TIMEOUT_TRAIT, defaults.wait_timeout)
                .param_with_default(INTERVAL_TRAIT, defaults.wait_interval),
            |args| {
                let actor = required_arg::<Actor>(args, ACTOR_PARAM, "wait", "Actor")?;
                let timeout = *required_arg::<Duration>(args, TIMEOUT_TRAIT, "wait", "Duration")?;
                let interval =
                    *required_arg::<Duration>(args, INTERVAL_TRAIT, "wait", "Duration")?;
                Ok(TraitValue::opaque(wait(actor, timeout, interval)?))
            },
        )
    })
    .clone()
}

/// The `on` stage as a registered task.
pub fn on_interaction() -> Capability {
    static CAP: OnceLock<Capability> = OnceLock::new();
    CAP.get_or_init(|| {
        Capability::task(
            "on",
            Signature::new()
                .param(ACTOR_PARAM)
                .param("question")
                .catch_all(),
            |args| {
                let actor = required_arg::<Actor>(args, ACTOR_PARAM, "on", "Actor")?;
                let question = required_arg::<Capability>(args, "question", "on", "Capability")?;
                let q_args = extra_args(args, &["question"]);
                Ok(TraitValue::opaque(on(actor, question, q_args)?))
            },
        )
    })
    .clone()
}

/// The `to` stage as a registered task.
pub fn to_interaction() -> Capability {
    static CAP: OnceLock<Capability> = OnceLock::new();
    CAP.get_or_init(|| {
        Capability::task(
            "to",
            Signature::new()
                .param(ACTOR_PARAM)
                .param("condition")
                .catch_all(),
            |args| {
                let actor = required_arg::<Actor>(args, ACTOR_PARAM, "to", "Actor")?;
                let condition = required_arg::<Capability>(args, "condition", "to", "Capability")?;
                let c_args = extra_args(args, &["condition"]);
                to(actor, condition, c_args)
            },
        )
    })
    .clone()
}

// ---------------------------------------------------------------------------
// Wait sayings
// ---------------------------------------------------------------------------

/// `on_<question>`: bind the `on` stage to a registered question. Role
/// validation happens when the stage runs, matching the explicit form.
pub fn on_question() -> Saying {
    static SAYING: OnceLock<Saying> = OnceLock::new();
    SAYING
        .get_or_init(|| {
            Saying::new("on_question", |actor, attr| {
                let name = attr.strip_prefix("on_")?;
                let question = actor.interactions().get(name)?.clone();
                let snapshot = actor.clone();
                Some(BoundCall::new(format!("on {name}"), move |kwargs| {
                    snapshot.call(
                        &on_interaction(),
                        kwargs.with("question", TraitValue::new(question.clone())),
                    )
                }))
            })
        })
        .clone()
}

/// `wait_on_<question>`: shorthand that derives a default-budget wait actor
/// and delegates to [`on_question`].
pub fn wait_on_question() -> Saying {
    static SAYING: OnceLock<Saying> = OnceLock::new();
    SAYING
        .get_or_init(|| {
            Saying::new("wait_on_question", |actor, attr| {
                if !attr.starts_with("wait_on_") {
                    return None;
                }
                let wait_actor = match wait_with_defaults(actor) {
                    Ok(derived) => derived,
                    Err(error) => {
                        warn!(%error, attr, "wait derivation failed, declining");
                        return None;
                    }
                };
                on_question().resolve(&wait_actor, &attr["wait_".len()..])
            })
        })
        .clone()
}

/// `to_<condition>`: bind the `to` stage to a registered condition.
pub fn to_condition() -> Saying {
    static SAYING: OnceLock<Saying> = OnceLock::new();
    SAYING
        .get_or_init(|| {
            Saying::new("to_condition", |actor, attr| {
                let name = attr.strip_prefix("to_")?;
                let condition = actor.conditions().get(name)?.clone();
                let snapshot = actor.clone();
                Some(BoundCall::new(format!("to {name}"), move |kwargs| {
                    snapshot.call(
                        &to_interaction(),
                        kwargs.with("condition", TraitValue::new(condition.clone())),
                    )
                }))
            })
        })
        .clone()
}

/// The whole poll engine as an ingestible module: the three stage
/// interactions and the three sayings.
pub fn module() -> Module {
    Module::new("wait")
        .capability(wait_interaction())
        .capability(on_interaction())
        .capability(to_interaction())
        .saying(on_question())
        .saying(wait_on_question())
        .saying(to_condition())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn always(n: i64) -> Capability {
        Capability::question(format!("always_{n}"), Signature::new(), move |_| {
            Ok(TraitValue::new(n))
        })
    }

    fn equals() -> Capability {
        Capability::condition(
            "equals",
            Signature::new().param(ACTUAL_PARAM).param("value"),
            |args| {
                let actual = args.get_as::<i64>(ACTUAL_PARAM);
                let value = args.get_as::<i64>("value");
                Ok(actual.is_some() && actual == value)
            },
        )
    }

    #[test]
    fn manual_clock_records_sleeps_and_advances() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), Duration::ZERO);
        clock.sleep(Duration::from_secs(2));
        clock.advance(Duration::from_secs(1));
        assert_eq!(clock.now(), Duration::from_secs(3));
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(2)]);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let first = clock.now();
        assert!(clock.now() >= first);
    }

    #[test]
    fn wait_stage_derives_a_configured_actor() {
        let mut actor = Actor::new();
        actor.knows(always(1)).unwrap();

        let wait_actor = wait(&actor, Duration::from_secs(5), Duration::ZERO).unwrap();
        assert_eq!(
            wait_actor.trait_as::<Duration>(TIMEOUT_TRAIT),
            Some(&Duration::from_secs(5))
        );
        assert_eq!(
            wait_actor.trait_as::<Duration>(INTERVAL_TRAIT),
            Some(&Duration::ZERO)
        );
        assert!(wait_actor.interactions().contains_key("on"));
        assert!(wait_actor.interactions().contains_key("always_1"));
        assert!(wait_actor.sayings().contains_key("on_question"));
        // The ancestor is untouched.
        assert!(actor.trait_value(TIMEOUT_TRAIT).is_none());
    }

    #[test]
    fn on_stage_requires_a_question() {
        let actor = Actor::new();
        let wait_actor = wait(&actor, Duration::ZERO, Duration::ZERO).unwrap();
        let task = Capability::task("go", Signature::new(), |_| Ok(TraitValue::new(())));
        assert!(on(&wait_actor, &task, Args::new()).is_err());
    }

    #[test]
    fn satisfied_first_try_never_sleeps() {
        let clock = Arc::new(ManualClock::new());
        let mut actor = Actor::new();
        install_clock(&mut actor, clock.clone());

        let wait_actor = wait(&actor, Duration::from_secs(30), Duration::from_secs(1)).unwrap();
        let on_actor = on(&wait_actor, &always(1), Args::new()).unwrap();
        let answer = to(&on_actor, &equals(), Args::new().with_value("value", 1_i64)).unwrap();

        assert_eq!(answer.downcast_ref::<i64>(), Some(&1));
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn polls_until_the_counter_satisfies() {
        let counter = Arc::new(Mutex::new(0_i64));
        let shared = counter.clone();
        let count_up = Capability::question("count_up", Signature::new(), move |_| {
            let mut n = shared.lock().unwrap_or_else(PoisonError::into_inner);
            *n += 1;
            Ok(TraitValue::new(*n))
        });

        let clock = Arc::new(ManualClock::new());
        let mut actor = Actor::new();
        install_clock(&mut actor, clock.clone());

        let wait_actor = wait(&actor, Duration::from_secs(30), Duration::ZERO).unwrap();
        let on_actor = on(&wait_actor, &count_up, Args::new()).unwrap();
        let answer = to(&on_actor, &equals(), Args::new().with_value("value", 10_i64)).unwrap();

        assert_eq!(answer.downcast_ref::<i64>(), Some(&10));
        assert_eq!(clock.sleeps().len(), 9);
        assert_eq!(
            *counter.lock().unwrap_or_else(PoisonError::into_inner),
            10
        );
    }

    #[test]
    fn exhausted_budget_raises_a_timeout() {
        // Real clock: a virtual one would never pass `now() < end` with a
        // zero interval.
        let actor = Actor::new();
        let timeout = Duration::from_millis(10);
        let wait_actor = wait(&actor, timeout, Duration::ZERO).unwrap();
        let on_actor = on(&wait_actor, &always(1), Args::new()).unwrap();
        let err = to(&on_actor, &equals(), Args::new().with_value("value", 2_i64)).unwrap_err();

        match err {
            TroupeError::Wait(WaitError::Timeout {
                timeout: reported,
                question,
                condition,
            }) => {
                assert_eq!(reported, timeout);
                assert_eq!(question, "always_1()");
                assert_eq!(condition, "equals(value=2)");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn zero_timeout_still_evaluates_once() {
        let clock = Arc::new(ManualClock::new());
        let mut actor = Actor::new();
        install_clock(&mut actor, clock.clone());

        let wait_actor = wait(&actor, Duration::ZERO, Duration::ZERO).unwrap();
        let on_actor = on(&wait_actor, &always(7), Args::new()).unwrap();
        let answer = to(&on_actor, &equals(), Args::new().with_value("value", 7_i64)).unwrap();
        assert_eq!(answer.downcast_ref::<i64>(), Some(&7));
    }

    #[test]
    fn wait_on_saying_declines_when_derivation_fails() {
        use crate::config::DuplicatePolicy;
        use crate::error::SayingError;

        // A strict actor whose `call_interaction` name is bound to a rogue
        // resolver makes wait derivation fail: the derived actor cannot
        // re-register the shared saying under that name.
        let mut actor = Actor::with_config(ActorConfig {
            duplicate_policy: DuplicatePolicy::Strict,
            ..Default::default()
        });
        actor
            .knows(Saying::new("call_interaction", |_, _| None))
            .unwrap();
        actor.knows(module()).unwrap();
        actor.knows(always(1)).unwrap();

        assert!(wait_with_defaults(&actor).is_err());

        // The saying declines instead of panicking, so dispatch falls
        // through to the unknown-saying error.
        let err = actor.say("wait_on_always_1").unwrap_err();
        assert!(matches!(
            err,
            TroupeError::Saying(SayingError::UnknownSaying { .. })
        ));
    }

    #[test]
    fn module_bundles_stages_and_sayings() {
        let mut actor = Actor::new();
        actor.knows(module()).unwrap();
        assert!(actor.interactions().contains_key("wait"));
        assert!(actor.interactions().contains_key("on"));
        assert!(actor.interactions().contains_key("to"));
        assert_eq!(actor.sayings().len(), 3);
        // Re-ingestion is idempotent thanks to memoized stages.
        actor.knows(module()).unwrap();
        assert_eq!(actor.interactions().len(), 3);
    }
}
