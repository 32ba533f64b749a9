//! Tag classifier: role markers and role validation.
//!
//! Every registered capability carries exactly one immutable [`Role`], fixed
//! by the [`Capability`](crate::capability::Capability) constructor that built
//! it. Tasks and questions additionally satisfy the generic "interaction"
//! predicate used by the registry's interaction map; call sites that need the
//! narrower role (`attempts_to`, `asks_for`, the poll stages) validate it
//! separately.

use serde::{Deserialize, Serialize};

use crate::capability::Capability;
use crate::error::RoleError;

/// The role marker attached to a callable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Grants traits when performed via `can`.
    Ability,
    /// A predicate evaluated via `check`, typically against a question's answer.
    Condition,
    /// An interaction with no required return contract.
    Task,
    /// An interaction expected to return a value.
    Question,
    /// A naming-convention resolver; lives in its own registry map.
    Saying,
}

impl Role {
    /// Whether this role belongs to the interaction umbrella (Task or Question).
    pub fn is_interaction(self) -> bool {
        matches!(self, Self::Task | Self::Question)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Ability => "ability",
            Self::Condition => "condition",
            Self::Task => "task",
            Self::Question => "question",
            Self::Saying => "saying",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// Validators
// ---------------------------------------------------------------------------

/// Validate that a capability carries the expected role.
pub fn validate(cap: &Capability, role: Role) -> Result<(), RoleError> {
    if cap.role() == role {
        return Ok(());
    }
    let name = cap.name().to_string();
    Err(match role {
        Role::Ability => RoleError::NotAbility { name },
        Role::Condition => RoleError::NotCondition { name },
        Role::Task => RoleError::NotTask { name },
        Role::Question => RoleError::NotQuestion { name },
        Role::Saying => RoleError::NotSaying { name },
    })
}

/// Validate that a capability is an interaction (task or question).
pub fn validate_interaction(cap: &Capability) -> Result<(), RoleError> {
    if cap.role().is_interaction() {
        Ok(())
    } else {
        Err(RoleError::NotInteraction {
            name: cap.name().to_string(),
        })
    }
}

/// Validate that a capability is an ability.
pub fn validate_ability(cap: &Capability) -> Result<(), RoleError> {
    validate(cap, Role::Ability)
}

/// Validate that a capability is a condition.
pub fn validate_condition(cap: &Capability) -> Result<(), RoleError> {
    validate(cap, Role::Condition)
}

/// Validate that a capability is a task.
pub fn validate_task(cap: &Capability) -> Result<(), RoleError> {
    validate(cap, Role::Task)
}

/// Validate that a capability is a question.
pub fn validate_question(cap: &Capability) -> Result<(), RoleError> {
    validate(cap, Role::Question)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::Args;
    use crate::capability::{Capability, Signature};
    use crate::value::TraitValue;

    fn sample_task() -> Capability {
        Capability::task("whip_it_good", Signature::new(), |_| {
            Ok(TraitValue::new(true))
        })
    }

    fn sample_question() -> Capability {
        Capability::question("count", Signature::new(), |_| Ok(TraitValue::new(1_i64)))
    }

    #[test]
    fn interaction_predicate_covers_task_and_question() {
        assert!(Role::Task.is_interaction());
        assert!(Role::Question.is_interaction());
        assert!(!Role::Ability.is_interaction());
        assert!(!Role::Condition.is_interaction());
        assert!(!Role::Saying.is_interaction());
    }

    #[test]
    fn validators_distinguish_subroles() {
        let task = sample_task();
        let question = sample_question();

        assert!(validate_interaction(&task).is_ok());
        assert!(validate_interaction(&question).is_ok());
        assert!(validate_task(&task).is_ok());
        assert!(matches!(
            validate_task(&question),
            Err(RoleError::NotTask { .. })
        ));
        assert!(matches!(
            validate_question(&task),
            Err(RoleError::NotQuestion { .. })
        ));
    }

    #[test]
    fn non_interaction_roles_are_rejected() {
        let ability = Capability::ability("be_cool", Signature::new(), |_| {
            Ok(Args::new().with_value("cool", true))
        });
        assert!(matches!(
            validate_interaction(&ability),
            Err(RoleError::NotInteraction { .. })
        ));
        assert!(matches!(
            validate_condition(&ability),
            Err(RoleError::NotCondition { .. })
        ));
        assert!(validate_ability(&ability).is_ok());
    }
}
