//! Opaque trait values.
//!
//! A [`TraitValue`] holds any `'static` value behind an `Arc`, so actors can
//! store browser-driver handles, durations, strings, or whole capabilities
//! without the engine ever introspecting them. Cloning is cheap (a refcount
//! bump), which is what makes derived-actor snapshots in the poll engine
//! affordable.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// An opaque, cheaply cloneable value stored in an actor's trait map or
/// passed as a call-time argument.
///
/// Values created with [`TraitValue::new`] capture a `Debug` rendering at
/// construction time; it is used for call formatting in diagnostics (for
/// example the question/condition calls inside a wait-timeout error).
/// Values that cannot or should not be rendered (driver handles, clocks)
/// use [`TraitValue::opaque`].
#[derive(Clone)]
pub struct TraitValue {
    value: Arc<dyn Any + Send + Sync>,
    repr: Arc<str>,
}

impl TraitValue {
    /// Wrap a value, capturing its `Debug` rendering for diagnostics.
    pub fn new<T: Any + Send + Sync + fmt::Debug>(value: T) -> Self {
        let repr = format!("{value:?}");
        Self {
            value: Arc::new(value),
            repr: repr.into(),
        }
    }

    /// Wrap a value without a diagnostic rendering.
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            repr: "<opaque>".into(),
        }
    }

    /// Downcast to a concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    /// Whether the stored value is of type `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Borrow the stored value as a string slice, accepting both `String`
    /// and `&'static str` payloads.
    pub fn as_str(&self) -> Option<&str> {
        if let Some(s) = self.downcast_ref::<String>() {
            Some(s.as_str())
        } else {
            self.downcast_ref::<&'static str>().copied()
        }
    }

    /// The `Debug` rendering captured at construction.
    pub fn repr(&self) -> &str {
        &self.repr
    }

    /// Whether two values share the same underlying allocation.
    pub fn same_value(&self, other: &TraitValue) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for TraitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr)
    }
}
