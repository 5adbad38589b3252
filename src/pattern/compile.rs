//! Token → regular expression compilation.
//!
//! Compiled expressions use `fancy_regex` because non-anchored patterns and
//! `ends_with` terminators need lookahead, which the `regex` crate does not
//! support.

use std::collections::HashMap;

use fancy_regex::Regex;
use serde::Serialize;

use super::parse::{parse, Key, ParamName, ParseOptions, Token, DEFAULT_DELIMITER, DEFAULT_DELIMITERS};
use crate::error::PatternError;

/// Escape characters that are meaningful to the regex engine.
pub(crate) fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for c in s.chars() {
        if matches!(
            c,
            '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape characters that are meaningful inside a bracketed character class.
pub(crate) fn escape_class(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    for c in s.chars() {
        if matches!(c, '\\' | '[' | ']' | '^' | '-' | '&' | '~') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Neutralise groups and anchors in a user supplied capture so it cannot add
/// capture groups of its own. Escaped pairs are kept as written.
pub(crate) fn escape_group(group: &str) -> String {
    let mut out = String::with_capacity(group.len() + 4);
    let mut chars = group.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push('\\');
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '(' | ')' | '$' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Options for [`tokens_to_regex`] and [`path_to_regex`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegexOptions {
    /// Case-sensitive literal matching.
    pub sensitive: bool,
    /// Do not tolerate a trailing delimiter.
    pub strict: bool,
    /// Anchor at the start of the input.
    pub start: bool,
    /// Anchor at the end of the input (`exact`).
    pub end: bool,
    pub delimiter: String,
    pub delimiters: String,
    /// Extra terminators accepted in place of end-of-input.
    pub ends_with: Vec<String>,
}

impl Default for RegexOptions {
    fn default() -> Self {
        Self {
            sensitive: false,
            strict: false,
            start: true,
            end: true,
            delimiter: DEFAULT_DELIMITER.to_string(),
            delimiters: DEFAULT_DELIMITERS.to_string(),
            ends_with: Vec::new(),
        }
    }
}

impl RegexOptions {
    #[must_use]
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            delimiter: self.delimiter.clone(),
            delimiters: self.delimiters.clone(),
        }
    }
}

/// Where a compiled pattern comes from.
#[derive(Debug, Clone)]
pub enum PatternSource {
    /// A single path template.
    Path(String),
    /// Several templates compiled as one alternation.
    Paths(Vec<String>),
    /// A pre-built expression; its capture groups become positional keys.
    Regex(Regex),
}

impl From<&str> for PatternSource {
    fn from(path: &str) -> Self {
        PatternSource::Path(path.to_string())
    }
}

impl From<String> for PatternSource {
    fn from(path: String) -> Self {
        PatternSource::Path(path)
    }
}

impl From<Vec<String>> for PatternSource {
    fn from(paths: Vec<String>) -> Self {
        PatternSource::Paths(paths)
    }
}

impl From<Regex> for PatternSource {
    fn from(regex: Regex) -> Self {
        PatternSource::Regex(regex)
    }
}

/// An anchored expression plus its ordered parameter descriptors.
///
/// Capture group `i + 1` of [`CompiledPattern::regex`] holds the value of `keys()[i]`.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    regex: Regex,
    keys: Vec<Key>,
}

impl CompiledPattern {
    #[must_use]
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    #[must_use]
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// The expression text as handed to the regex engine.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// Serializable summary, used by the CLI `compile` command.
#[derive(Debug, Serialize)]
pub struct CompiledSummary<'a> {
    pub regex: &'a str,
    pub keys: &'a [Key],
}

impl CompiledPattern {
    #[must_use]
    pub fn summary(&self) -> CompiledSummary<'_> {
        CompiledSummary {
            regex: self.as_str(),
            keys: &self.keys,
        }
    }
}

fn flags(options: &RegexOptions) -> &'static str {
    if options.sensitive {
        ""
    } else {
        "(?i)"
    }
}

fn build_regex(source: String) -> Result<Regex, PatternError> {
    Regex::new(&source).map_err(|e| PatternError::invalid_regex(&source, e))
}

/// Regex positional keys for every capture group of a pre-built expression.
fn regex_keys(regex: &Regex, keys: &mut Vec<Key>) {
    let groups = regex.captures_len().saturating_sub(1);
    keys.extend((0..groups).map(|i| Key {
        name: ParamName::Index(i),
        prefix: String::new(),
        delimiter: String::new(),
        pattern: String::new(),
        optional: false,
        repeat: false,
        partial: false,
    }));
}

/// Render tokens as expression text (without flags), appending their keys.
fn tokens_to_source(tokens: &[Token], keys: &mut Vec<Key>, options: &RegexOptions) -> String {
    let delimiter = escape_string(&options.delimiter);
    let ends_with = options
        .ends_with
        .iter()
        .map(|s| escape_string(s))
        .chain(std::iter::once("$".to_string()))
        .collect::<Vec<_>>()
        .join("|");

    let mut route = String::new();
    if options.start {
        route.push('^');
    }
    let mut is_end_delimited = tokens.is_empty();

    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::Literal(text) => {
                route.push_str(&escape_string(text));
                is_end_delimited = i == tokens.len() - 1
                    && text
                        .chars()
                        .last()
                        .is_some_and(|c| options.delimiters.contains(c));
            }
            Token::Param(key) => {
                let capture = if key.repeat {
                    format!(
                        "(?:{p})(?:{d}(?:{p}))*",
                        p = key.pattern,
                        d = escape_string(&key.delimiter)
                    )
                } else {
                    key.pattern.clone()
                };
                let prefix = escape_string(&key.prefix);
                keys.push(key.clone());
                if key.optional {
                    if key.partial {
                        route.push_str(&format!("{prefix}({capture})?"));
                    } else {
                        route.push_str(&format!("(?:{prefix}({capture}))?"));
                    }
                } else {
                    route.push_str(&format!("{prefix}({capture})"));
                }
            }
        }
    }

    if options.end {
        if !options.strict {
            route.push_str(&format!("(?:{delimiter})?"));
        }
        if ends_with == "$" {
            route.push('$');
        } else {
            route.push_str(&format!("(?={ends_with})"));
        }
    } else {
        if !options.strict {
            route.push_str(&format!("(?:{delimiter}(?={ends_with}))?"));
        }
        if !is_end_delimited {
            route.push_str(&format!("(?={delimiter}|{ends_with})"));
        }
    }
    route
}

/// Compile a token sequence into an anchored expression and its keys.
pub fn tokens_to_regex(
    tokens: &[Token],
    options: &RegexOptions,
) -> Result<CompiledPattern, PatternError> {
    let mut keys = Vec::new();
    let source = format!("{}{}", flags(options), tokens_to_source(tokens, &mut keys, options));
    let regex = build_regex(source)?;
    Ok(CompiledPattern { regex, keys })
}

fn source_text(
    source: &PatternSource,
    keys: &mut Vec<Key>,
    options: &RegexOptions,
) -> String {
    match source {
        PatternSource::Path(path) => {
            tokens_to_source(&parse(path, &options.parse_options()), keys, options)
        }
        PatternSource::Paths(paths) => {
            let parts: Vec<String> = paths
                .iter()
                .map(|p| tokens_to_source(&parse(p, &options.parse_options()), keys, options))
                .collect();
            format!("(?:{})", parts.join("|"))
        }
        PatternSource::Regex(regex) => {
            regex_keys(regex, keys);
            regex.as_str().to_string()
        }
    }
}

/// Compile any [`PatternSource`].
///
/// A pre-built expression is returned unchanged apart from harvesting its
/// capture groups as positional keys.
pub fn path_to_regex(
    source: &PatternSource,
    options: &RegexOptions,
) -> Result<CompiledPattern, PatternError> {
    if let PatternSource::Regex(regex) = source {
        let mut keys = Vec::new();
        regex_keys(regex, &mut keys);
        return Ok(CompiledPattern {
            regex: regex.clone(),
            keys,
        });
    }
    let mut keys = Vec::new();
    let source = format!("{}{}", flags(options), source_text(source, &mut keys, options));
    let regex = build_regex(source)?;
    Ok(CompiledPattern { regex, keys })
}

/// Values substituted by [`to_path`], keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    values: HashMap<ParamName, Vec<String>>,
}

impl PathParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a single value.
    #[must_use]
    pub fn set(mut self, name: impl Into<ParamName>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), vec![value.into()]);
        self
    }

    /// Set several values for a repeating parameter.
    #[must_use]
    pub fn set_many<I, S>(mut self, name: impl Into<ParamName>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    fn get(&self, name: &ParamName) -> Option<&[String]> {
        self.values.get(name).map(Vec::as_slice)
    }
}

fn value_matches(key: &Key, value: &str) -> Result<bool, PatternError> {
    let source = format!("^(?:{})$", key.pattern);
    let re = build_regex(source)?;
    re.is_match(value)
        .map_err(|e| PatternError::invalid_regex(&key.pattern, e))
}

/// Build a concrete path from a template's tokens.
///
/// Literals are emitted verbatim and every key emits its prefix followed by its
/// value(s). Values are validated against the key's capture pattern.
pub fn to_path(tokens: &[Token], params: &PathParams) -> Result<String, PatternError> {
    let mut path = String::new();
    for token in tokens {
        let key = match token {
            Token::Literal(text) => {
                path.push_str(text);
                continue;
            }
            Token::Param(key) => key,
        };

        let values = params.get(&key.name).unwrap_or(&[]);
        if values.is_empty() {
            if key.optional {
                continue;
            }
            return Err(PatternError::MissingParam(key.name.to_string()));
        }
        if values.len() > 1 && !key.repeat {
            return Err(PatternError::UnexpectedRepeat(key.name.to_string()));
        }

        for (i, value) in values.iter().enumerate() {
            if !value_matches(key, value)? {
                return Err(PatternError::InvalidParam {
                    name: key.name.to_string(),
                    pattern: key.pattern.clone(),
                    value: value.clone(),
                });
            }
            path.push_str(if i == 0 { &key.prefix } else { &key.delimiter });
            path.push_str(value);
        }
    }
    Ok(path)
}
