//! Rich diagnostic error types for the troupe dispatch engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so users know exactly what
//! went wrong and how to fix it. All errors are raised synchronously at the point
//! of detection; none are retried internally except the deliberate poll loop in
//! [`crate::wait`].

use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the troupe engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum TroupeError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Role(#[from] RoleError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Call(#[from] CallError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Saying(#[from] SayingError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Wait(#[from] WaitError),
}

// ---------------------------------------------------------------------------
// Role errors
// ---------------------------------------------------------------------------

/// Role validation failures raised before a capability is invoked.
#[derive(Debug, Error, Diagnostic)]
pub enum RoleError {
    #[error("\"{name}\" is not an ability")]
    #[diagnostic(
        code(troupe::role::not_ability),
        help(
            "`can` only accepts capabilities built with `Capability::ability`. \
             Check which constructor was used to register \"{name}\"."
        )
    )]
    NotAbility { name: String },

    #[error("\"{name}\" is not a condition")]
    #[diagnostic(
        code(troupe::role::not_condition),
        help(
            "`check` and the poll engine's `to` stage only accept capabilities \
             built with `Capability::condition`."
        )
    )]
    NotCondition { name: String },

    #[error("\"{name}\" is not an interaction")]
    #[diagnostic(
        code(troupe::role::not_interaction),
        help(
            "`call` only accepts tasks and questions. Abilities go through `can`, \
             conditions through `check`."
        )
    )]
    NotInteraction { name: String },

    #[error("\"{name}\" is not a task")]
    #[diagnostic(
        code(troupe::role::not_task),
        help(
            "`attempts_to` requires a capability built with `Capability::task`. \
             Use `asks_for` for questions."
        )
    )]
    NotTask { name: String },

    #[error("\"{name}\" is not a question")]
    #[diagnostic(
        code(troupe::role::not_question),
        help(
            "`asks_for` and the poll engine's `on` stage require a capability \
             built with `Capability::question`. Use `attempts_to` for tasks."
        )
    )]
    NotQuestion { name: String },

    #[error("\"{name}\" is not a saying")]
    #[diagnostic(
        code(troupe::role::not_saying),
        help("Sayings are built with `Saying::new`, not a `Capability` constructor.")
    )]
    NotSaying { name: String },
}

// ---------------------------------------------------------------------------
// Registry errors
// ---------------------------------------------------------------------------

/// Errors raised while ingesting capabilities into an actor's registry.
#[derive(Debug, Error, Diagnostic)]
pub enum RegistryError {
    #[error("\"{argument}\" is not a module, actor, or tagged capability")]
    #[diagnostic(
        code(troupe::registry::unknowable),
        help(
            "`knows` only accepts capabilities, sayings, modules, other actors, \
             and trait bindings. Wrap the value in a trait binding if the actor \
             should merely hold it."
        )
    )]
    UnknowableArgument { argument: String },

    #[error("the name \"{name}\" is already bound to a different callable")]
    #[diagnostic(
        code(troupe::registry::duplicate),
        help(
            "This actor was configured with the strict duplicate policy. \
             Re-ingesting an identical callable is allowed; rebinding a used name \
             is not. Switch to `DuplicatePolicy::Overwrite` to silently replace."
        )
    )]
    DuplicateCapability { name: String },
}

// ---------------------------------------------------------------------------
// Call errors
// ---------------------------------------------------------------------------

/// Parameter resolution failures raised by the invocation core.
#[derive(Debug, Error, Diagnostic)]
pub enum CallError {
    #[error("parameter \"{parameter}\" is missing for {capability}")]
    #[diagnostic(
        code(troupe::call::missing_parameter),
        help(
            "The parameter could not be resolved from call-time arguments, the \
             actor's traits, the reserved `actor` name, or a declared default. \
             Pass it explicitly or grant it as a trait via an ability or `knows`."
        )
    )]
    MissingParameter {
        parameter: String,
        capability: String,
    },

    #[error("parameter \"{parameter}\" for {capability} is not a {expected}")]
    #[diagnostic(
        code(troupe::call::parameter_type),
        help(
            "The value bound to this parameter could not be downcast to the type \
             the capability expects. Check the trait or argument that supplied it."
        )
    )]
    ParameterType {
        parameter: String,
        capability: String,
        expected: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Saying errors
// ---------------------------------------------------------------------------

/// Dispatch resolver failures.
#[derive(Debug, Error, Diagnostic)]
pub enum SayingError {
    #[error("the actor does not know \"{name}\"")]
    #[diagnostic(
        code(troupe::saying::unknown),
        help(
            "No registered saying produced a binding for this name. Sayings are \
             tried in registration order; register one that matches, or check \
             the spelling against the actor's interaction names."
        )
    )]
    UnknownSaying { name: String },
}

// ---------------------------------------------------------------------------
// Wait errors
// ---------------------------------------------------------------------------

/// Poll engine failures.
#[derive(Debug, Error, Diagnostic)]
pub enum WaitError {
    #[error("waiting for \"{question}\" to \"{condition}\" timed out after {timeout:?}")]
    #[diagnostic(
        code(troupe::wait::timeout),
        help(
            "The condition never became satisfied within the timeout. Increase \
             the timeout, shorten the interval, or verify that the question can \
             ever produce a satisfying answer."
        )
    )]
    Timeout {
        timeout: Duration,
        question: String,
        condition: String,
    },
}

/// Convenience alias for functions returning troupe results.
pub type TroupeResult<T> = std::result::Result<T, TroupeError>;
