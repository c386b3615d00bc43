//! Command-string quoting: splits a human-typed line into argument
//! vectors and the reverse. Used only by the interactive demo binary —
//! never on the wire, where arguments are already self-delimiting.

/// Splits `input` on spaces, honouring single and double quotes and, for
/// double-quoted segments, backslash escapes for `n r t \ " '` (other
/// escaped characters pass through the backslash unchanged). Empty input
/// yields an empty vector.
pub fn split(input: &str) -> Result<Vec<String>, QuoteError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_single = false;
    let mut in_double = false;
    let mut has_current = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if in_single {
            if c == '\'' {
                in_single = false;
            } else {
                current.push(c);
            }
            continue;
        }
        if in_double {
            if c == '"' {
                in_double = false;
            } else if c == '\\' {
                match chars.next() {
                    Some('n') => current.push('\n'),
                    Some('r') => current.push('\r'),
                    Some('t') => current.push('\t'),
                    Some('\\') => current.push('\\'),
                    Some('"') => current.push('"'),
                    Some('\'') => current.push('\''),
                    Some(other) => {
                        current.push('\\');
                        current.push(other);
                    }
                    None => return Err(QuoteError::UnterminatedEscape),
                }
            } else {
                current.push(c);
            }
            continue;
        }
        match c {
            ' ' | '\t' => {
                if has_current {
                    args.push(std::mem::take(&mut current));
                    has_current = false;
                }
            }
            '\'' => {
                in_single = true;
                has_current = true;
            }
            '"' => {
                in_double = true;
                has_current = true;
            }
            other => {
                current.push(other);
                has_current = true;
            }
        }
    }

    if in_single || in_double {
        return Err(QuoteError::UnterminatedQuote);
    }
    if has_current {
        args.push(current);
    }
    Ok(args)
}

/// Renders `args` back into a single command line, quoting any argument
/// containing a space, quote, CR, LF or tab and escaping the same
/// metacharacters symmetrically with `split`'s double-quote escaping.
pub fn quote(args: &[impl AsRef<str>]) -> String {
    args.iter()
        .map(|a| quote_one(a.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn needs_quoting(s: &str) -> bool {
    s.is_empty()
        || s.chars()
            .any(|c| matches!(c, ' ' | '"' | '\'' | '\r' | '\n' | '\t'))
}

fn quote_one(s: &str) -> String {
    if !needs_quoting(s) {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QuoteError {
    #[error("unterminated quote")]
    UnterminatedQuote,
    #[error("unterminated escape sequence")]
    UnterminatedEscape,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_empty_args() {
        assert_eq!(split("").unwrap(), Vec::<String>::new());
        assert_eq!(split("   ").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn splits_on_spaces() {
        assert_eq!(
            split("SET key value").unwrap(),
            vec!["SET", "key", "value"]
        );
    }

    #[test]
    fn honours_double_quotes_with_spaces() {
        assert_eq!(
            split(r#"SET key "hello world""#).unwrap(),
            vec!["SET", "key", "hello world"]
        );
    }

    #[test]
    fn honours_single_quotes() {
        assert_eq!(split("SET 'my key' v").unwrap(), vec!["SET", "my key", "v"]);
    }

    #[test]
    fn double_quote_escapes() {
        assert_eq!(
            split(r#"SET k "line1\nline2\ttabbed""#).unwrap(),
            vec!["SET", "k", "line1\nline2\ttabbed"]
        );
    }

    #[test]
    fn unterminated_quote_is_rejected() {
        assert_eq!(split("SET \"oops").unwrap_err(), QuoteError::UnterminatedQuote);
    }

    #[test]
    fn quote_round_trips_through_split() {
        let original = vec!["SET".to_string(), "a key".to_string(), "line\nbreak".to_string()];
        let line = quote(&original);
        let parsed = split(&line).unwrap();
        assert_eq!(parsed, original);
    }
}
