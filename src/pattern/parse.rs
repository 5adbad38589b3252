//! Path template tokenizer.
//!
//! Splits a template such as `/users/:id(\d+)/posts/:slug?` into literal text
//! and parameter [`Key`]s. The scanner recognises, in order of precedence at
//! every position:
//!
//! - `\X`: an escaped character, appended to the literal text
//! - `:name` optionally followed by `(capture)`
//! - a bare `(capture)`, which produces a positional (numbered) parameter
//!
//! Parameters may be followed by one modifier: `?` (optional), `+` (repeat),
//! or `*` (optional repeat).

use std::fmt;

use serde::{Serialize, Serializer};

use super::compile::{escape_class, escape_group};

/// Default delimiter used when a parameter has no prefix.
pub const DEFAULT_DELIMITER: &str = "/";
/// Characters that are lifted off the preceding literal into a parameter prefix.
pub const DEFAULT_DELIMITERS: &str = "./";

/// Name of a parameter: either `:name` or the position of an unnamed group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamName {
    Named(String),
    Index(usize),
}

impl ParamName {
    /// True when this name refers to `name` (numeric names compare by their decimal form).
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        match self {
            ParamName::Named(n) => n == name,
            ParamName::Index(i) => name.parse::<usize>().is_ok_and(|n| n == *i),
        }
    }
}

impl fmt::Display for ParamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamName::Named(n) => f.write_str(n),
            ParamName::Index(i) => write!(f, "{i}"),
        }
    }
}

impl Serialize for ParamName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ParamName::Named(n) => serializer.serialize_str(n),
            ParamName::Index(i) => serializer.serialize_u64(*i as u64),
        }
    }
}

impl From<&str> for ParamName {
    fn from(name: &str) -> Self {
        ParamName::Named(name.to_string())
    }
}

impl From<String> for ParamName {
    fn from(name: String) -> Self {
        ParamName::Named(name)
    }
}

impl From<usize> for ParamName {
    fn from(index: usize) -> Self {
        ParamName::Index(index)
    }
}

/// Parameter descriptor produced by the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Key {
    pub name: ParamName,
    /// Delimiter character lifted from the preceding literal (may be empty).
    pub prefix: String,
    /// Separator used between repeated values.
    pub delimiter: String,
    /// Capture expression for the parameter value.
    pub pattern: String,
    pub optional: bool,
    pub repeat: bool,
    /// The prefix is not followed by a delimiter-bounded segment (e.g. `/foo-:bar?`).
    pub partial: bool,
}

/// A template token: literal text or a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Literal(String),
    Param(Key),
}

impl Token {
    #[must_use]
    pub fn as_key(&self) -> Option<&Key> {
        match self {
            Token::Param(key) => Some(key),
            Token::Literal(_) => None,
        }
    }
}

/// Delimiter settings for [`parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    pub delimiter: String,
    pub delimiters: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            delimiters: DEFAULT_DELIMITERS.to_string(),
        }
    }
}

enum Marker {
    Escaped(char),
    Param {
        name: Option<String>,
        capture: Option<String>,
        modifier: Option<char>,
    },
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Scan a `(capture)` group starting at `start` (which must hold `(`).
///
/// Returns the raw group body and the index just past the closing paren.
/// Nested parens and a trailing lone backslash make the group invalid.
fn scan_group(chars: &[char], start: usize) -> Option<(String, usize)> {
    let mut body = String::new();
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                let escaped = *chars.get(i + 1)?;
                body.push('\\');
                body.push(escaped);
                i += 2;
            }
            '(' => return None,
            ')' => {
                return if body.is_empty() {
                    None
                } else {
                    Some((body, i + 1))
                };
            }
            c => {
                body.push(c);
                i += 1;
            }
        }
    }
    None
}

fn scan_marker(chars: &[char], start: usize) -> Option<(Marker, usize)> {
    match chars[start] {
        '\\' => {
            let escaped = *chars.get(start + 1)?;
            Some((Marker::Escaped(escaped), start + 2))
        }
        ':' => {
            let mut end = start + 1;
            while end < chars.len() && is_word_char(chars[end]) {
                end += 1;
            }
            if end == start + 1 {
                return None;
            }
            let name: String = chars[start + 1..end].iter().collect();
            let mut capture = None;
            if chars.get(end) == Some(&'(') {
                if let Some((body, after)) = scan_group(chars, end) {
                    capture = Some(body);
                    end = after;
                }
            }
            let (modifier, end) = scan_modifier(chars, end);
            Some((
                Marker::Param {
                    name: Some(name),
                    capture,
                    modifier,
                },
                end,
            ))
        }
        '(' => {
            let (body, end) = scan_group(chars, start)?;
            let (modifier, end) = scan_modifier(chars, end);
            Some((
                Marker::Param {
                    name: None,
                    capture: Some(body),
                    modifier,
                },
                end,
            ))
        }
        _ => None,
    }
}

fn scan_modifier(chars: &[char], at: usize) -> (Option<char>, usize) {
    match chars.get(at) {
        Some(&m) if matches!(m, '+' | '*' | '?') => (Some(m), at + 1),
        _ => (None, at),
    }
}

/// Tokenize a path template.
///
/// An empty template yields no tokens; text after the last parameter becomes a
/// trailing literal.
#[must_use]
pub fn parse(template: &str, options: &ParseOptions) -> Vec<Token> {
    let chars: Vec<char> = template.chars().collect();
    let mut tokens = Vec::new();
    let mut next_index = 0usize;
    let mut path = String::new();
    let mut path_escaped = false;
    let mut i = 0usize;

    while i < chars.len() {
        let Some((marker, end)) = scan_marker(&chars, i) else {
            path.push(chars[i]);
            i += 1;
            continue;
        };
        i = end;

        let (name, capture, modifier) = match marker {
            Marker::Escaped(c) => {
                path.push(c);
                path_escaped = true;
                continue;
            }
            Marker::Param {
                name,
                capture,
                modifier,
            } => (name, capture, modifier),
        };

        let next = chars.get(i).copied();
        let mut prefix = String::new();
        if !path_escaped {
            if let Some(last) = path.chars().last() {
                if options.delimiters.contains(last) {
                    prefix.push(last);
                    path.pop();
                }
            }
        }

        if !path.is_empty() {
            tokens.push(Token::Literal(std::mem::take(&mut path)));
            path_escaped = false;
        }

        let partial = !prefix.is_empty() && next.is_some_and(|n| !prefix.starts_with(n));
        let repeat = matches!(modifier, Some('+' | '*'));
        let optional = matches!(modifier, Some('?' | '*'));
        let delimiter = if prefix.is_empty() {
            options.delimiter.clone()
        } else {
            prefix.clone()
        };
        let pattern = match capture {
            Some(group) => escape_group(&group),
            None => format!("[^{}]+?", escape_class(&delimiter)),
        };
        let name = match name {
            Some(name) => ParamName::Named(name),
            None => {
                let index = next_index;
                next_index += 1;
                ParamName::Index(index)
            }
        };

        tokens.push(Token::Param(Key {
            name,
            prefix,
            delimiter,
            pattern,
            optional,
            repeat,
            partial,
        }));
    }

    if !path.is_empty() {
        tokens.push(Token::Literal(path));
    }
    tokens
}
