//! Payload key paths such as `a.b[0].c[]`.

use mdl_index_common::{IndexError, Result};
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JsonPathItem {
    Key(String),
    Index(usize),
    WildcardIndex,
}

impl fmt::Display for JsonPathItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonPathItem::Key(key) => write!(f, "{}", key),
            JsonPathItem::Index(index) => write!(f, "[{}]", index),
            JsonPathItem::WildcardIndex => write!(f, "[]"),
        }
    }
}

impl From<&str> for JsonPathItem {
    fn from(key: &str) -> Self {
        JsonPathItem::Key(key.to_string())
    }
}

impl From<usize> for JsonPathItem {
    fn from(index: usize) -> Self {
        JsonPathItem::Index(index)
    }
}

/// Parse a dotted path. The path must start with a key; `[n]` indexes a list and `[]`
/// addresses every element. Keys containing `.` or `[` can be double-quoted.
pub fn parse_json_path(path: &str) -> Result<Vec<JsonPathItem>> {
    let invalid = |reason: &str| IndexError::InvalidPath(format!("'{}': {}", path, reason));

    let mut chars = path.chars().peekable();
    let mut items = Vec::new();

    items.push(JsonPathItem::Key(parse_key(&mut chars).map_err(|r| invalid(r))?));

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                if chars.peek().is_none() {
                    return Err(invalid("trailing '.'"));
                }
                items.push(JsonPathItem::Key(parse_key(&mut chars).map_err(|r| invalid(r))?));
            }
            '[' => {
                let mut digits = String::new();
                loop {
                    match chars.next() {
                        Some(']') => break,
                        Some(d) => digits.push(d),
                        None => return Err(invalid("unterminated '['")),
                    }
                }
                if digits.is_empty() {
                    items.push(JsonPathItem::WildcardIndex);
                } else {
                    let index = digits
                        .trim()
                        .parse::<usize>()
                        .map_err(|_| invalid("index must be a non-negative integer"))?;
                    items.push(JsonPathItem::Index(index));
                }
                if !matches!(chars.peek(), None | Some('.') | Some('[')) {
                    return Err(invalid("expected '.' or '[' after ']'"));
                }
            }
            _ => return Err(invalid("unexpected character")),
        }
    }

    Ok(items)
}

fn parse_key(chars: &mut Peekable<Chars<'_>>) -> std::result::Result<String, &'static str> {
    let mut key = String::new();

    if chars.peek() == Some(&'"') {
        chars.next();
        loop {
            match chars.next() {
                Some('"') => break,
                Some(c) => key.push(c),
                None => return Err("unterminated quote"),
            }
        }
        if key.is_empty() {
            return Err("empty key");
        }
        return Ok(key);
    }

    while let Some(&c) = chars.peek() {
        if c == '.' || c == '[' {
            break;
        }
        key.push(c);
        chars.next();
    }

    if key.is_empty() {
        return Err("empty key");
    }
    Ok(key)
}
