//! Applying compiled patterns to concrete paths.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use smallvec::SmallVec;

use super::cache::{MatchFlags, PatternCache};
use super::compile::CompiledPattern;
use super::parse::ParamName;
use crate::error::PatternError;

/// Maximum number of parameters kept inline before spilling to the heap.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Extracted parameters in descriptor order.
///
/// A `None` value means the parameter's group did not take part in the match
/// (an optional segment that was absent).
pub type ParamVec = SmallVec<[(ParamName, Option<String>); MAX_INLINE_PARAMS]>;

/// What to match a path against: one template or several alternatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    pub paths: Vec<String>,
    /// The whole input must be consumed.
    pub exact: bool,
    /// A trailing delimiter is not tolerated.
    pub strict: bool,
    /// Literal text is compared case-sensitively.
    pub sensitive: bool,
}

impl RoutePattern {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self::any_of([path.into()])
    }

    /// Several templates; the first one that matches wins.
    #[must_use]
    pub fn any_of<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
            exact: false,
            strict: false,
            sensitive: false,
        }
    }

    #[must_use]
    pub fn exact(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }

    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    #[must_use]
    pub fn sensitive(mut self, sensitive: bool) -> Self {
        self.sensitive = sensitive;
        self
    }

    /// Flags selecting the cached compiled form. `exact` anchors the end.
    #[must_use]
    pub fn flags(&self) -> MatchFlags {
        MatchFlags {
            end: self.exact,
            strict: self.strict,
            sensitive: self.sensitive,
        }
    }
}

impl From<&str> for RoutePattern {
    fn from(path: &str) -> Self {
        RoutePattern::new(path)
    }
}

/// Result of matching a path against a [`RoutePattern`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    /// The template that matched.
    pub path: String,
    /// The matched portion of the input.
    pub url: String,
    pub is_exact: bool,
    #[serde(serialize_with = "serialize_params")]
    pub params: ParamVec,
}

impl MatchResult {
    /// Value of a named parameter.
    ///
    /// Uses "last write wins" semantics when a template repeats a name, so
    /// `/org/:id/user/:id` yields the user id.
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.is(name))
            .and_then(|(_, v)| v.as_deref())
    }

    /// Value of an unnamed `(group)` parameter by position.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| *k == ParamName::Index(index))
            .and_then(|(_, v)| v.as_deref())
    }

    /// Convert params to a map. Absent optional parameters are omitted.
    /// Note: this allocates, use [`MatchResult::get`] on hot paths.
    #[must_use]
    pub fn params_map(&self) -> BTreeMap<String, String> {
        self.params
            .iter()
            .filter_map(|(k, v)| v.as_ref().map(|v| (k.to_string(), v.clone())))
            .collect()
    }
}

fn serialize_params<S: Serializer>(params: &ParamVec, serializer: S) -> Result<S::Ok, S::Error> {
    // Emit each name once, keeping the last value like `get` does
    let mut map = serializer.serialize_map(None)?;
    for (i, (name, value)) in params.iter().enumerate() {
        if params[i + 1..].iter().any(|(later, _)| later == name) {
            continue;
        }
        map.serialize_entry(&name.to_string(), value)?;
    }
    map.end()
}

/// Run one compiled template against `uri`.
pub(crate) fn match_compiled(
    uri: &str,
    template: &str,
    compiled: &CompiledPattern,
    exact: bool,
) -> Result<Option<MatchResult>, PatternError> {
    let captures = compiled
        .regex()
        .captures(uri)
        .map_err(|e| PatternError::Execution(e.to_string()))?;
    let Some(captures) = captures else {
        return Ok(None);
    };

    let matched = captures.get(0).map_or("", |m| m.as_str());
    let url = if template == "/" && matched.is_empty() {
        "/"
    } else {
        matched
    };
    let is_exact = uri == url;
    if exact && !is_exact {
        return Ok(None);
    }

    let params = compiled
        .keys()
        .iter()
        .enumerate()
        .map(|(i, key)| {
            (
                key.name.clone(),
                captures.get(i + 1).map(|m| m.as_str().to_string()),
            )
        })
        .collect();

    Ok(Some(MatchResult {
        path: template.to_string(),
        url: url.to_string(),
        is_exact,
        params,
    }))
}

/// Match `uri` against `pattern` using the process-wide [`PatternCache`].
///
/// Returns `Ok(None)` when no template matches.
pub fn match_path(uri: &str, pattern: &RoutePattern) -> Result<Option<MatchResult>, PatternError> {
    PatternCache::shared().match_path(uri, pattern)
}
