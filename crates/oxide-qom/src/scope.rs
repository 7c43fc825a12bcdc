//! A multi-level associative stack for render-time scoping.
//!
//! Every nested query level being rendered opens a scope. Values set while a
//! scope is open are visible from that level and from any deeper level, and
//! are discarded when the scope closes. This gives CTE names and table aliases
//! the same shadowing rules as nested SQL.
//!
//! ```
//! use oxide_qom::scope::ScopeStack;
//!
//! let mut stack = ScopeStack::new();
//! stack.scope_start();
//! stack.set("t", 1);
//! stack.scope_start();
//! assert_eq!(stack.get("t"), Some(&1));
//! assert_eq!(stack.get_current_scope("t"), None);
//! stack.set("t", 2);
//! assert_eq!(stack.get("t"), Some(&2));
//! stack.scope_end();
//! assert_eq!(stack.get("t"), Some(&1));
//! ```

use std::hash::Hash;

use indexmap::{Equivalent, IndexMap};

type Constructor<K, V> = Box<dyn Fn(&K, usize) -> V + Send + Sync>;

/// A stack of scopes mapping keys to per-level values.
///
/// Each key owns a list of slots, one per scope level up to the deepest level
/// it was set at. Unset intermediate levels hold `None`.
pub struct ScopeStack<K, V> {
    scope_level: isize,
    stack: IndexMap<K, Vec<Option<V>>>,
    constructor: Option<Constructor<K, V>>,
}

impl<K: Hash + Eq, V> Default for ScopeStack<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, V> ScopeStack<K, V> {
    /// Creates an empty stack with no scope open.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scope_level: -1,
            stack: IndexMap::new(),
            constructor: None,
        }
    }

    /// Creates an empty stack whose [`get_or_create`](Self::get_or_create)
    /// builds missing values with `constructor(key, scope_level)`.
    #[must_use]
    pub fn with_constructor(constructor: impl Fn(&K, usize) -> V + Send + Sync + 'static) -> Self {
        Self {
            scope_level: -1,
            stack: IndexMap::new(),
            constructor: Some(Box::new(constructor)),
        }
    }

    /// Creates an empty stack whose missing values default to a clone of `value`.
    #[must_use]
    pub fn with_default(value: V) -> Self
    where
        V: Clone + Send + Sync + 'static,
    {
        Self::with_constructor(move |_, _| value.clone())
    }

    /// Returns whether at least one scope is open.
    #[must_use]
    pub const fn in_scope(&self) -> bool {
        self.scope_level > -1
    }

    /// Returns the current scope level, or `None` before the first
    /// [`scope_start`](Self::scope_start).
    #[must_use]
    pub fn scope_level(&self) -> Option<usize> {
        usize::try_from(self.scope_level).ok()
    }

    /// Opens a nested scope.
    pub fn scope_start(&mut self) {
        self.scope_level += 1;
    }

    /// Closes the current scope, discarding every value set at it.
    ///
    /// # Panics
    ///
    /// Panics if no scope is open.
    pub fn scope_end(&mut self) {
        assert!(self.in_scope(), "ScopeStack::scope_end called without an open scope");
        self.scope_level -= 1;
        self.trim();
    }

    fn trim(&mut self) {
        let slots = self.slots();
        self.stack.retain(|_, list| {
            while list.len() > slots || matches!(list.last(), Some(None)) {
                list.pop();
            }
            !list.is_empty()
        });
    }

    fn slots(&self) -> usize {
        usize::try_from(self.scope_level + 1).unwrap_or(0)
    }

    fn level(&self, operation: &str) -> usize {
        match self.scope_level() {
            Some(level) => level,
            None => panic!("ScopeStack::{operation} called before scope_start"),
        }
    }

    /// Sets `value` for `key` at the current scope level.
    ///
    /// # Panics
    ///
    /// Panics if no scope is open.
    pub fn set(&mut self, key: K, value: V) {
        let level = self.level("set");
        let list = self.stack.entry(key).or_default();
        Self::set_at(list, level, value);
    }

    fn set_at(list: &mut Vec<Option<V>>, level: usize, value: V) {
        if list.len() <= level {
            list.resize_with(level + 1, || None);
        }
        list[level] = Some(value);
    }

    /// Sets `value` at the current scope level for every known key.
    ///
    /// # Panics
    ///
    /// Panics if no scope is open.
    pub fn set_all(&mut self, value: V)
    where
        V: Clone,
    {
        let level = self.level("set_all");
        for list in self.stack.values_mut() {
            Self::set_at(list, level, value.clone());
        }
    }

    /// Returns the innermost value visible for `key`, regardless of the level
    /// it was set at.
    ///
    /// # Panics
    ///
    /// Panics if no scope is open.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.level("get");
        self.stack
            .get(key)
            .and_then(|list| list.iter().rev().find_map(Option::as_ref))
    }

    /// Returns the value for `key` only if it was set at the current level.
    ///
    /// # Panics
    ///
    /// Panics if no scope is open.
    pub fn get_current_scope<Q>(&self, key: &Q) -> Option<&V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let level = self.level("get_current_scope");
        self.stack
            .get(key)
            .filter(|list| list.len() == level + 1)
            .and_then(|list| list[level].as_ref())
    }

    /// Returns the visible value for `key`, creating it at the current level
    /// with the stack's constructor when none is visible.
    ///
    /// # Panics
    ///
    /// Panics if no scope is open or the stack has no constructor.
    pub fn get_or_create(&mut self, key: K) -> &V
    where
        K: Clone,
    {
        let level = self.level("get_or_create");
        let index = match self.stack.get_index_of(&key) {
            Some(index) => index,
            None => self.stack.insert_full(key.clone(), Vec::new()).0,
        };
        let visible = self.stack[index].iter().any(Option::is_some);
        if !visible {
            let Some(constructor) = self.constructor.as_ref() else {
                panic!("ScopeStack::get_or_create requires a constructor");
            };
            let value = constructor(&key, level);
            Self::set_at(&mut self.stack[index], level, value);
        }
        self.stack[index]
            .iter()
            .rev()
            .find_map(Option::as_ref)
            .unwrap_or_else(|| unreachable!("value was just created"))
    }

    /// Returns the number of slots held for `key`.
    ///
    /// After any [`scope_end`](Self::scope_end) this never exceeds
    /// `scope_level + 1`, and is zero exactly when the key is unknown.
    #[must_use]
    pub fn slot_count<Q>(&self, key: &Q) -> usize
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.stack.get(key).map_or(0, Vec::len)
    }

    /// Iterates over the innermost visible value of every key, in the order
    /// the keys were first set.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.stack
            .iter()
            .filter_map(|(k, list)| list.iter().rev().find_map(Option::as_ref).map(|v| (k, v)))
    }

    /// Iterates over the values set exactly at the current scope level.
    pub fn iter_current_scope(&self) -> impl Iterator<Item = (&K, &V)> {
        let slots = self.slots();
        self.stack.iter().filter_map(move |(k, list)| {
            if slots > 0 && list.len() == slots {
                list[slots - 1].as_ref().map(|v| (k, v))
            } else {
                None
            }
        })
    }

    /// Returns whether no value is visible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

impl<K: core::fmt::Debug, V: core::fmt::Debug> core::fmt::Debug for ScopeStack<K, V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ScopeStack")
            .field("scope_level", &self.scope_level)
            .field("stack", &self.stack)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_pads_intermediate_levels() {
        let mut stack = ScopeStack::new();
        stack.scope_start();
        stack.scope_start();
        stack.scope_start();
        stack.set("cte", "inner");
        assert_eq!(stack.slot_count("cte"), 3);
        assert_eq!(stack.get("cte"), Some(&"inner"));
        assert_eq!(stack.get_current_scope("cte"), Some(&"inner"));
    }

    #[test]
    fn test_scope_end_trims_trailing_nulls() {
        let mut stack = ScopeStack::new();
        stack.scope_start();
        stack.scope_start();
        stack.scope_start();
        stack.set("a", 1);
        stack.scope_end();
        assert_eq!(stack.slot_count("a"), 0);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_get_current_scope_only_sees_current_level() {
        let mut stack = ScopeStack::new();
        stack.scope_start();
        stack.set("a", 1);
        stack.scope_start();
        assert_eq!(stack.get("a"), Some(&1));
        assert_eq!(stack.get_current_scope("a"), None);
        stack.scope_end();
        assert_eq!(stack.get_current_scope("a"), Some(&1));
    }

    #[test]
    fn test_get_or_create_uses_constructor() {
        let mut stack: ScopeStack<String, usize> = ScopeStack::with_constructor(|_, level| level * 10);
        stack.scope_start();
        stack.scope_start();
        assert_eq!(*stack.get_or_create(String::from("x")), 10);
        stack.set(String::from("x"), 3);
        assert_eq!(*stack.get_or_create(String::from("x")), 3);
    }

    #[test]
    fn test_with_default_and_set_all() {
        let mut stack = ScopeStack::with_default(false);
        stack.scope_start();
        stack.get_or_create("a");
        stack.get_or_create("b");
        stack.scope_start();
        stack.set_all(true);
        assert_eq!(stack.iter_current_scope().count(), 2);
        stack.scope_end();
        assert!(stack.iter().all(|(_, v)| !*v));
    }

    #[test]
    fn test_iteration_preserves_insertion_order() {
        let mut stack = ScopeStack::new();
        stack.scope_start();
        stack.set("z", 1);
        stack.set("a", 2);
        let keys: Vec<_> = stack.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    #[should_panic(expected = "called before scope_start")]
    fn test_get_before_scope_start_panics() {
        let stack: ScopeStack<&str, i32> = ScopeStack::new();
        let _ = stack.get("a");
    }

    #[test]
    #[should_panic(expected = "called before scope_start")]
    fn test_set_before_scope_start_panics() {
        let mut stack = ScopeStack::new();
        stack.set("a", 1);
    }
}
