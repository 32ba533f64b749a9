//! End-to-end integration tests for the troupe dispatch engine.
//!
//! These tests exercise the full pipeline from ingestion through saying
//! dispatch and the poll engine, validating that the registries, parameter
//! resolution, and derived-actor chains all work together.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use troupe::actor::Actor;
use troupe::args::Args;
use troupe::capability::{Capability, Signature};
use troupe::conditions;
use troupe::config::{ActorConfig, DuplicatePolicy};
use troupe::error::{TroupeError, WaitError};
use troupe::module::Module;
use troupe::value::TraitValue;
use troupe::wait::{self, ManualClock};

fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A browser-flavored step library: one ability, one task, one question.
fn browser_steps() -> Module {
    Module::new("browser_steps")
        .capability(Capability::ability(
            "browse_the_web",
            Signature::new().param_with_default("browser", "headless"),
            |args| {
                let browser = args
                    .get("browser")
                    .and_then(TraitValue::as_str)
                    .unwrap_or("headless")
                    .to_string();
                Ok(Args::new().with_value("browser", browser))
            },
        ))
        .capability(Capability::task(
            "log_in",
            Signature::new().param("browser").param("user"),
            |args| {
                let user = args.get("user").and_then(TraitValue::as_str).unwrap_or("?");
                Ok(TraitValue::new(format!("{user} logged in")))
            },
        ))
        .capability(Capability::question(
            "page_title",
            Signature::new().param("browser"),
            |args| {
                let browser = args.get("browser").and_then(TraitValue::as_str).unwrap_or("?");
                Ok(TraitValue::new(format!("Dashboard ({browser})")))
            },
        ))
        .untagged("parse_dom")
}

fn screenplay_actor() -> Actor {
    init_tracing();
    let mut actor = Actor::with_standard_sayings();
    actor.knows(browser_steps()).unwrap();
    actor
}

#[test]
fn end_to_end_ability_task_question_via_sayings() {
    let actor = screenplay_actor();

    // Perform the ability through the `can_` saying; the returned value is
    // the updated actor.
    let updated = actor
        .say("can_browse_the_web")
        .unwrap()
        .invoke(Args::new().with_value("browser", "firefox"))
        .unwrap();
    let actor = updated.downcast_ref::<Actor>().unwrap().clone();
    assert_eq!(actor.trait_value("browser").and_then(TraitValue::as_str), Some("firefox"));

    // The granted trait now satisfies the task's `browser` parameter.
    let outcome = actor
        .say("do_log_in")
        .unwrap()
        .invoke(Args::new().with_value("user", "andy"))
        .unwrap();
    assert_eq!(outcome.as_str(), Some("andy logged in"));

    // And the question's.
    let title = actor
        .say("get_page_title")
        .unwrap()
        .invoke(Args::new())
        .unwrap();
    assert_eq!(title.as_str(), Some("Dashboard (firefox)"));
}

#[test]
fn untagged_module_members_are_not_registered() {
    let actor = screenplay_actor();
    assert!(actor.say("parse_dom").is_err());
    assert!(actor.say("do_parse_dom").is_err());
}

#[test]
fn actor_composition_merges_registries_and_overwrites_traits() {
    let mut trainer = Actor::new();
    trainer.knows(browser_steps()).unwrap();
    trainer.knows_trait("user", "trainer");
    trainer.knows_trait("browser", "chrome");

    let mut trainee = Actor::with_standard_sayings();
    trainee.knows_trait("user", "trainee");
    trainee.knows(trainer).unwrap();

    // The trainer's binding wins on collision; new traits append.
    assert_eq!(
        trainee.trait_value("user").and_then(TraitValue::as_str),
        Some("trainer")
    );
    assert!(trainee.interactions().contains_key("log_in"));

    let outcome = trainee.say("log_in").unwrap().invoke(Args::new()).unwrap();
    assert_eq!(outcome.as_str(), Some("trainer logged in"));
}

#[test]
fn strict_actors_still_compose_with_shared_libraries() {
    let mut strict = Actor::with_config(ActorConfig {
        duplicate_policy: DuplicatePolicy::Strict,
        ..Default::default()
    });

    // Memoized modules can be ingested repeatedly even under strict policy.
    strict.knows(wait::module()).unwrap();
    strict.knows(wait::module()).unwrap();

    // A colliding rebinding is still rejected.
    let rogue = Capability::task("wait", Signature::new(), |_| Ok(TraitValue::new(())));
    assert!(strict.knows(rogue).is_err());
}

#[test]
fn wait_chain_polls_a_counter_through_sayings() {
    let counter = Arc::new(Mutex::new(0_i64));
    let shared = counter.clone();

    let mut actor = Actor::with_standard_sayings();
    actor.knows(wait::module()).unwrap();
    actor
        .knows(Capability::question("count_up", Signature::new(), move |_| {
            let mut n = shared.lock().unwrap();
            *n += 1;
            Ok(TraitValue::new(*n))
        }))
        .unwrap();
    actor.knows(conditions::is_equal_to::<i64>()).unwrap();

    let clock = Arc::new(ManualClock::new());
    wait::install_clock(&mut actor, clock.clone());

    let on_actor = actor
        .say("wait_on_count_up")
        .unwrap()
        .invoke(Args::new())
        .unwrap();
    let on_actor = on_actor.downcast_ref::<Actor>().unwrap().clone();

    let answer = on_actor
        .say("to_is_equal_to")
        .unwrap()
        .invoke(Args::new().with_value("value", 3_i64))
        .unwrap();

    assert_eq!(answer.downcast_ref::<i64>(), Some(&3));
    assert_eq!(*counter.lock().unwrap(), 3);
    // Two unsatisfied rounds, each sleeping the configured 1s interval.
    assert_eq!(clock.sleeps(), vec![Duration::from_secs(1); 2]);
}

#[test]
fn wait_chain_timeout_renders_both_calls() {
    let mut actor = Actor::with_standard_sayings();
    actor.knows(wait::module()).unwrap();
    actor
        .knows(Capability::question("always_one", Signature::new(), |_| {
            Ok(TraitValue::new(1_i64))
        }))
        .unwrap();
    actor.knows(conditions::is_equal_to::<i64>()).unwrap();

    // Virtual clock: each 1s sleep advances virtual time, so the default
    // 30s budget exhausts after 30 iterations without real waiting.
    let clock = Arc::new(ManualClock::new());
    wait::install_clock(&mut actor, clock.clone());

    let on_actor = actor
        .say("wait_on_always_one")
        .unwrap()
        .invoke(Args::new())
        .unwrap();
    let on_actor = on_actor.downcast_ref::<Actor>().unwrap().clone();

    let err = on_actor
        .say("to_is_equal_to")
        .unwrap()
        .invoke(Args::new().with_value("value", 2_i64))
        .unwrap_err();

    match err {
        TroupeError::Wait(WaitError::Timeout {
            timeout,
            question,
            condition,
        }) => {
            assert_eq!(timeout, Duration::from_secs(30));
            assert_eq!(question, "always_one()");
            assert_eq!(condition, "is_equal_to(value=2)");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(clock.sleeps().len(), 30);
}

#[test]
fn explicit_wait_chain_with_question_arguments() {
    let mut actor = Actor::new();
    actor.knows(browser_steps()).unwrap();
    actor.knows_trait("browser", "firefox");

    let clock = Arc::new(ManualClock::new());
    wait::install_clock(&mut actor, clock.clone());

    let question = actor.interactions().get("page_title").unwrap().clone();
    let wait_actor = wait::wait(&actor, Duration::from_secs(5), Duration::ZERO).unwrap();
    let on_actor = wait::on(&wait_actor, &question, Args::new()).unwrap();
    let answer = wait::to(
        &on_actor,
        &conditions::contains_substring(),
        Args::new().with_value("value", "firefox"),
    )
    .unwrap();

    assert_eq!(answer.as_str(), Some("Dashboard (firefox)"));
    assert!(clock.sleeps().is_empty());
}

#[test]
fn traditional_screenplay_verbs_validate_roles() {
    let actor = screenplay_actor();
    let task = actor.interactions().get("log_in").unwrap().clone();
    let question = actor.interactions().get("page_title").unwrap().clone();

    let mut actor = actor;
    actor.knows_trait("browser", "headless");
    actor.knows_trait("user", "andy");

    let outcome = actor
        .say("attempts_to")
        .unwrap()
        .invoke(Args::new().with("task", TraitValue::new(task.clone())))
        .unwrap();
    assert_eq!(outcome.as_str(), Some("andy logged in"));

    let title = actor
        .say("asks_for")
        .unwrap()
        .invoke(Args::new().with("question", TraitValue::new(question.clone())))
        .unwrap();
    assert_eq!(title.as_str(), Some("Dashboard (headless)"));

    // Handing a question to `attempts_to` is a role error.
    let err = actor
        .say("attempts_to")
        .unwrap()
        .invoke(Args::new().with("task", TraitValue::new(question)))
        .unwrap_err();
    assert!(matches!(err, TroupeError::Role(_)));
}

#[test]
fn saying_bindings_capture_a_snapshot() {
    let mut actor = screenplay_actor();
    actor.knows_trait("browser", "firefox");

    // Bind first, mutate after; the binding must see the firefox snapshot.
    let bound = actor.say("get_page_title").unwrap();
    actor.knows_trait("browser", "chrome");

    let title = bound.invoke(Args::new()).unwrap();
    assert_eq!(title.as_str(), Some("Dashboard (firefox)"));
}
