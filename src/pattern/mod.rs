//! # Pattern Module
//!
//! Compiles path templates such as `/users/:id` into anchored regular
//! expressions and matches concrete paths against them.
//!
//! ## Pipeline
//!
//! 1. [`parse`] splits a template into literal [`Token`]s and parameter [`Key`]s
//! 2. [`tokens_to_regex`] / [`path_to_regex`] build the expression
//! 3. [`PatternCache`] memoises compiled forms per `(end, strict, sensitive, template)`
//! 4. [`match_path`] runs a [`RoutePattern`] against a path and returns a [`MatchResult`]
//!
//! ## Template Syntax
//!
//! | Syntax            | Meaning                                   |
//! |-------------------|-------------------------------------------|
//! | `:name`           | named segment                             |
//! | `:name(\d+)`      | named segment with a custom capture       |
//! | `(\d+)`           | unnamed segment, numbered from 0          |
//! | `?` / `+` / `*`   | optional / repeat / optional repeat       |
//! | `\X`              | literal `X`, never treated as a delimiter |
//!
//! ## Example
//!
//! ```
//! use pathmock::pattern::{match_path, RoutePattern};
//!
//! let found = match_path("/users/42", &RoutePattern::new("/users/:id").exact(true))
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(found.get("id"), Some("42"));
//! assert!(found.is_exact);
//! ```

mod cache;
mod compile;
mod matcher;
mod parse;

pub use cache::{CacheStats, MatchFlags, PatternCache, DEFAULT_CACHE_CAPACITY};
pub use compile::{
    path_to_regex, to_path, tokens_to_regex, CompiledPattern, CompiledSummary, PathParams,
    PatternSource, RegexOptions,
};
pub use matcher::{match_path, MatchResult, ParamVec, RoutePattern, MAX_INLINE_PARAMS};
pub(crate) use matcher::match_compiled;
pub use parse::{parse, Key, ParamName, ParseOptions, Token, DEFAULT_DELIMITER, DEFAULT_DELIMITERS};

#[cfg(test)]
mod tests;
