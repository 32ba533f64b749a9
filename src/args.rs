//! Ordered argument maps.
//!
//! [`Args`] is the single map type flowing through the invocation core: it
//! carries call-time keyword arguments, the resolved parameter set handed to
//! a capability body, and the trait mapping an ability returns. Iteration
//! order is insertion order, and overwriting a key keeps its original
//! position; both properties are externally observable and load-bearing.

use std::any::Any;
use std::fmt;

use indexmap::IndexMap;

use crate::value::TraitValue;

/// An insertion-ordered map of named values.
#[derive(Clone, Default)]
pub struct Args {
    values: IndexMap<String, TraitValue>,
}

impl Args {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a pre-wrapped value.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: TraitValue) -> Self {
        self.set(name, value);
        self
    }

    /// Builder-style insert of a plain value (wrapped via [`TraitValue::new`]).
    #[must_use]
    pub fn with_value<T: Any + Send + Sync + fmt::Debug>(
        self,
        name: impl Into<String>,
        value: T,
    ) -> Self {
        self.with(name, TraitValue::new(value))
    }

    /// Insert or overwrite a value. Overwriting keeps the key's original
    /// insertion position.
    pub fn set(&mut self, name: impl Into<String>, value: TraitValue) {
        self.values.insert(name.into(), value);
    }

    /// Look up a value by name.
    pub fn get(&self, name: &str) -> Option<&TraitValue> {
        self.values.get(name)
    }

    /// Look up and downcast a value by name.
    pub fn get_as<T: Any>(&self, name: &str) -> Option<&T> {
        self.get(name).and_then(TraitValue::downcast_ref)
    }

    /// Remove a value, preserving the order of the remaining entries.
    pub fn remove(&mut self, name: &str) -> Option<TraitValue> {
        self.values.shift_remove(name)
    }

    /// Whether a name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TraitValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Merge another map into this one, overwriting on collision.
    pub fn merge(&mut self, other: &Args) {
        for (name, value) in other.iter() {
            self.set(name, value.clone());
        }
    }

    /// Render a `name(k=v, ...)` call string for diagnostics.
    pub fn describe_call(&self, name: &str) -> String {
        if self.values.is_empty() {
            return format!("{name}()");
        }
        let rendered: Vec<String> = self
            .iter()
            .map(|(k, v)| format!("{k}={}", v.repr()))
            .collect();
        format!("{name}({})", rendered.join(", "))
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (k, v) in self.iter() {
            map.entry(&k, &v.repr());
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_insertion_order() {
        let args = Args::new()
            .with_value("task", "program")
            .with_value("speed", "lightning")
            .with_value("retries", 3_i64);
        let names: Vec<&str> = args.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["task", "speed", "retries"]);
    }

    #[test]
    fn overwrite_keeps_position() {
        let mut args = Args::new()
            .with_value("a", 1_i64)
            .with_value("b", 2_i64);
        args.set("a", TraitValue::new(10_i64));
        let names: Vec<&str> = args.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(args.get_as::<i64>("a"), Some(&10));
    }

    #[test]
    fn merge_appends_new_keys_at_end() {
        let mut base = Args::new().with_value("a", 1_i64).with_value("b", 2_i64);
        let other = Args::new().with_value("b", 20_i64).with_value("c", 3_i64);
        base.merge(&other);
        let names: Vec<&str> = base.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(base.get_as::<i64>("b"), Some(&20));
    }

    #[test]
    fn describe_call_renders_values() {
        let empty = Args::new();
        assert_eq!(empty.describe_call("counter"), "counter()");

        let args = Args::new().with_value("value", 10_i64);
        assert_eq!(args.describe_call("is_equal_to"), "is_equal_to(value=10)");
    }
}
