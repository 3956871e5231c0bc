// Imports
use crate::error::{TomlError, TomlResult};

// Escape lengths for `\u` and `\U`
const SMALL_SEQ_LENGTH: usize = 4;
const LARGE_SEQ_LENGTH: usize = 8;
const BYTE_SEQ_LENGTH: usize = 2;

/// Decode the escape sequences of a basic string body.
///
/// With `multiline` set, a backslash that ends a line (optionally followed by
/// spaces or tabs) swallows the newline and every whitespace character up to
/// the next non-whitespace one.
pub(crate) fn decode_escapes(body: &str, multiline: bool) -> TomlResult<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(esc) = chars.next() else {
            return Err(TomlError::SyntaxError(
                "Trailing backslash in string".to_string(),
            ));
        };
        match esc {
            'b' => out.push('\u{0008}'),
            't' => out.push('\t'),
            'n' => out.push('\n'),
            'f' => out.push('\u{000C}'),
            'r' => out.push('\r'),
            'e' => out.push('\u{001B}'),
            '"' => out.push('"'),
            '\\' => out.push('\\'),
            'x' => out.push(escape_hex(&mut chars, BYTE_SEQ_LENGTH)?),
            'u' => out.push(escape_hex(&mut chars, SMALL_SEQ_LENGTH)?),
            'U' => out.push(escape_hex(&mut chars, LARGE_SEQ_LENGTH)?),
            ' ' | '\t' | '\r' | '\n' if multiline => {
                // Line continuation: only whitespace may sit between the
                // backslash and the end of the line.
                let mut saw_newline = esc == '\n';
                let mut pending = esc;
                loop {
                    match pending {
                        '\n' => saw_newline = true,
                        ' ' | '\t' | '\r' => (),
                        _ => break,
                    }
                    match chars.peek() {
                        Some(&next) if next.is_whitespace() => {
                            pending = next;
                            chars.next();
                        }
                        _ => break,
                    }
                }
                if !saw_newline {
                    return Err(TomlError::SyntaxError(
                        "Invalid escape sequence: `\\` followed by whitespace".to_string(),
                    ));
                }
            }
            other => {
                return Err(TomlError::SyntaxError(format!(
                    "Invalid escape sequence: \\{}",
                    other.escape_debug()
                )))
            }
        }
    }
    Ok(out)
}

/// Read exactly `len` hex digits and convert them to a scalar value.
fn escape_hex<I>(chars: &mut I, len: usize) -> TomlResult<char>
where
    I: Iterator<Item = char>,
{
    let digits = chars.take(len).collect::<String>();
    let invalid = || {
        TomlError::SyntaxError(format!(
            "Invalid unicode escape sequence `{digits}`. Format: \\xHH, \\uXXXX or \\UXXXXXXXX"
        ))
    };
    if digits.chars().count() != len || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let code = u32::from_str_radix(&digits, 16).map_err(|_| invalid())?;
    char::from_u32(code).ok_or_else(invalid)
}

/// Drop the newline that immediately follows a multi-line opening delimiter.
pub(crate) fn trim_leading_newline(body: &str) -> &str {
    body.strip_prefix("\r\n")
        .or_else(|| body.strip_prefix('\n'))
        .unwrap_or(body)
}

/// Split a key as written into its segments.
///
/// Only unquoted dots separate segments. Quoted segments are unquoted (basic
/// ones escape-decoded) and otherwise kept verbatim, dots included.
pub(crate) fn split_key(raw: &str) -> TomlResult<Vec<String>> {
    let is_blank = |c: char| c == ' ' || c == '\t';
    let invalid = || TomlError::SyntaxError(format!("Invalid key: {raw}"));

    let mut segments = Vec::new();
    let mut rest = raw.trim_matches(is_blank);
    loop {
        rest = rest.trim_start_matches(is_blank);
        let (segment, tail) = match rest.chars().next() {
            Some('"') => {
                let end = closing_quote(&rest[1..]).ok_or_else(invalid)? + 1;
                (decode_escapes(&rest[1..end], false)?, &rest[end + 1..])
            }
            Some('\'') => {
                let end = rest[1..].find('\'').ok_or_else(invalid)? + 1;
                (rest[1..end].to_string(), &rest[end + 1..])
            }
            Some(_) => {
                let end = rest
                    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
                    .unwrap_or(rest.len());
                if end == 0 {
                    return Err(invalid());
                }
                (rest[..end].to_string(), &rest[end..])
            }
            None => return Err(invalid()),
        };
        segments.push(segment);
        let tail = tail.trim_start_matches(is_blank);
        match tail.strip_prefix('.') {
            Some(next) => rest = next,
            None if tail.is_empty() => break,
            None => return Err(invalid()),
        }
    }
    Ok(segments)
}

/// Byte index of the first unescaped `"` in a basic string body.
fn closing_quote(body: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some(i),
            _ => (),
        }
    }
    None
}
