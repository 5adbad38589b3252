use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::client::{DriverResult, HttpRequest};

/// A named transform in a [`MiddlewareChain`].
pub type Transform<T> = Arc<dyn Fn(T) -> T + Send + Sync>;

/// Ordered, name-addressable list of transforms.
///
/// Registering under an existing name replaces the transform in place;
/// registering `None` removes it. Applying the chain folds the value through
/// every transform from first to last.
pub struct MiddlewareChain<T> {
    entries: Vec<(Arc<str>, Transform<T>)>,
}

impl<T> Default for MiddlewareChain<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> Clone for MiddlewareChain<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .map(|(name, f)| (Arc::clone(name), Arc::clone(f)))
                .collect(),
        }
    }
}

impl<T> fmt::Debug for MiddlewareChain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("names", &self.names())
            .finish()
    }
}

impl<T> MiddlewareChain<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert, replace or (with `None`) remove the transform registered as `name`.
    pub fn upsert(&mut self, name: &str, transform: Option<Transform<T>>) {
        let position = self.entries.iter().position(|(n, _)| n.as_ref() == name);
        match (position, transform) {
            (Some(i), Some(f)) => self.entries[i].1 = f,
            (None, Some(f)) => self.entries.push((Arc::from(name), f)),
            (Some(i), None) => {
                self.entries.remove(i);
            }
            (None, None) => {}
        }
    }

    /// Convenience for `upsert(name, Some(..))` with a plain closure.
    pub fn insert<F>(&mut self, name: &str, transform: F)
    where
        F: Fn(T) -> T + Send + Sync + 'static,
    {
        self.upsert(name, Some(Arc::new(transform)));
    }

    /// Returns `true` if `name` was registered.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.upsert(name, None);
        self.entries.len() != before
    }

    /// Fold `value` through every transform in registration order.
    pub fn apply(&self, value: T) -> T {
        self.entries.iter().fold(value, |acc, (_, f)| f(acc))
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_ref()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Observer invoked around every driver call made by an
/// [`crate::client::HttpClient`].
///
/// `before` sees the request after the request chain ran; `after` sees the
/// outcome after the response chain ran.
pub trait Middleware: Send + Sync {
    fn before(&self, _req: &HttpRequest) {}
    fn after(&self, _req: &HttpRequest, _outcome: &DriverResult, _latency: Duration) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_folds_left_to_right() {
        let mut chain = MiddlewareChain::<String>::new();
        chain.insert("a", |s| s + "a");
        chain.insert("b", |s| s + "b");
        assert_eq!(chain.apply(String::new()), "ab");
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut chain = MiddlewareChain::<String>::new();
        chain.insert("a", |s| s + "a");
        chain.insert("b", |s| s + "b");
        chain.insert("a", |s| s + "A");
        assert_eq!(chain.names(), vec!["a", "b"]);
        assert_eq!(chain.apply(String::new()), "Ab");
    }

    #[test]
    fn upsert_none_removes() {
        let mut chain = MiddlewareChain::<i32>::new();
        chain.insert("double", |n| n * 2);
        chain.upsert("double", None);
        chain.upsert("missing", None);
        assert!(chain.is_empty());
        assert!(!chain.remove("double"));
        assert_eq!(chain.apply(3), 3);
    }
}
