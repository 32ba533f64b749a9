//! A small library of reusable conditions for the poll engine and `check`.
//!
//! Each constructor produces a [`Capability`] with the condition role and the
//! `[actual, value]` parameter convention (`actual` only for the boolean
//! verdicts), so they slot directly into `check`, the `check_*` saying, and
//! the `to` stage. The comparison constructors are generic over the concrete
//! answer type; a value of any other type fails with a typed parameter error
//! instead of silently comparing unequal.

use std::any::{Any, type_name};

use crate::capability::{Capability, Signature};
use crate::error::{CallError, TroupeError, TroupeResult};
use crate::value::TraitValue;
use crate::wait::ACTUAL_PARAM;

const VALUE_PARAM: &str = "value";

fn typed<'a, T: Any>(
    args: &'a crate::args::Args,
    param: &str,
    capability: &str,
) -> TroupeResult<&'a T> {
    args.get_as::<T>(param).ok_or_else(|| {
        TroupeError::from(CallError::ParameterType {
            parameter: param.to_string(),
            capability: capability.to_string(),
            expected: type_name::<T>(),
        })
    })
}

fn string(
    args: &crate::args::Args,
    param: &str,
    capability: &str,
) -> TroupeResult<String> {
    args.get(param)
        .and_then(TraitValue::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            TroupeError::from(CallError::ParameterType {
                parameter: param.to_string(),
                capability: capability.to_string(),
                expected: "str",
            })
        })
}

fn comparison<T, F>(name: &'static str, compare: F) -> Capability
where
    T: Any + Send + Sync,
    F: Fn(&T, &T) -> bool + Send + Sync + 'static,
{
    Capability::condition(
        name,
        Signature::new().param(ACTUAL_PARAM).param(VALUE_PARAM),
        move |args| {
            let actual = typed::<T>(args, ACTUAL_PARAM, name)?;
            let value = typed::<T>(args, VALUE_PARAM, name)?;
            Ok(compare(actual, value))
        },
    )
}

/// `actual == value`.
pub fn is_equal_to<T: Any + Send + Sync + PartialEq>() -> Capability {
    comparison::<T, _>("is_equal_to", |actual, value| actual == value)
}

/// `actual != value`.
pub fn is_not_equal_to<T: Any + Send + Sync + PartialEq>() -> Capability {
    comparison::<T, _>("is_not_equal_to", |actual, value| actual != value)
}

/// `actual > value`.
pub fn is_greater_than<T: Any + Send + Sync + PartialOrd>() -> Capability {
    comparison::<T, _>("is_greater_than", |actual, value| actual > value)
}

/// `actual >= value`.
pub fn is_greater_than_or_equal_to<T: Any + Send + Sync + PartialOrd>() -> Capability {
    comparison::<T, _>("is_greater_than_or_equal_to", |actual, value| actual >= value)
}

/// `actual < value`.
pub fn is_less_than<T: Any + Send + Sync + PartialOrd>() -> Capability {
    comparison::<T, _>("is_less_than", |actual, value| actual < value)
}

/// `actual <= value`.
pub fn is_less_than_or_equal_to<T: Any + Send + Sync + PartialOrd>() -> Capability {
    comparison::<T, _>("is_less_than_or_equal_to", |actual, value| actual <= value)
}

/// The answer is the boolean `true`.
pub fn is_true() -> Capability {
    Capability::condition(
        "is_true",
        Signature::new().param(ACTUAL_PARAM),
        |args| Ok(*typed::<bool>(args, ACTUAL_PARAM, "is_true")?),
    )
}

/// The answer is the boolean `false`.
pub fn is_false() -> Capability {
    Capability::condition(
        "is_false",
        Signature::new().param(ACTUAL_PARAM),
        |args| Ok(!*typed::<bool>(args, ACTUAL_PARAM, "is_false")?),
    )
}

/// The answer string contains `value` as a substring.
pub fn contains_substring() -> Capability {
    Capability::condition(
        "contains_substring",
        Signature::new().param(ACTUAL_PARAM).param(VALUE_PARAM),
        |args| {
            let actual = string(args, ACTUAL_PARAM, "contains_substring")?;
            let value = string(args, VALUE_PARAM, "contains_substring")?;
            Ok(actual.contains(&value))
        },
    )
}

/// The answer string does not contain `value` as a substring.
pub fn does_not_contain_substring() -> Capability {
    Capability::condition(
        "does_not_contain_substring",
        Signature::new().param(ACTUAL_PARAM).param(VALUE_PARAM),
        |args| {
            let actual = string(args, ACTUAL_PARAM, "does_not_contain_substring")?;
            let value = string(args, VALUE_PARAM, "does_not_contain_substring")?;
            Ok(!actual.contains(&value))
        },
    )
}
