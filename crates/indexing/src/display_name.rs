//! Turns user-facing display names into identifiers usable as model/column references.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Prefix,
    Middle,
    Suffix,
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c.is_control()
}

fn is_invalid(c: char, position: Position) -> bool {
    if c == '_' {
        return false;
    }
    match position {
        Position::Prefix => c.is_ascii_punctuation() || c.is_ascii_digit() || is_separator(c),
        Position::Middle => (c.is_ascii_punctuation() && c != '$') || is_separator(c),
        Position::Suffix => c.is_ascii_punctuation() || is_separator(c),
    }
}

/// Replace characters that are invalid at their position with `_`, then collapse runs of `_`.
///
/// A name may not start with a digit, `$` is only allowed in the middle, and punctuation or
/// whitespace is never allowed. Non-ASCII letters are kept as they are.
pub fn clean_display_name(display_name: &str) -> String {
    let chars: Vec<char> = display_name.chars().collect();
    let last = chars.len().saturating_sub(1);

    let mut cleaned = String::with_capacity(display_name.len());
    for (i, &c) in chars.iter().enumerate() {
        let invalid = if chars.len() == 1 {
            is_invalid(c, Position::Prefix) || is_invalid(c, Position::Suffix)
        } else if i == 0 {
            is_invalid(c, Position::Prefix)
        } else if i == last {
            is_invalid(c, Position::Suffix)
        } else {
            is_invalid(c, Position::Middle)
        };

        let c = if invalid { '_' } else { c };
        if c == '_' && cleaned.ends_with('_') {
            continue;
        }
        cleaned.push(c);
    }
    cleaned
}
