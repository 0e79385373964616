//! Flag-string fragments.
//!
//! A tile persists as a colon-separated list of flags such as
//! `B:L40:F12:Dtext`. Each fragment is a one-letter code, optionally followed
//! by a decimal payload. `D` is special: the rest of the fragment is free text.

use crate::error::FlagError;

/// Separator between flag fragments.
pub const SEPARATOR: char = ':';
/// Code of the free-text description fragment.
pub const DESCRIPTION_CODE: char = 'D';

/// One decoded fragment of a flag string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment<'a> {
    /// `D<text>`; text may be empty.
    Description(&'a str),
    /// `<code>` or `<code><n>`.
    Value { code: char, value: Option<i32> },
}

/// Split a flag string into raw fragments, skipping blank pieces.
///
/// Leading whitespace is dropped so the code letter comes first; the rest
/// of each fragment is left alone.
pub fn split(flags: &str) -> impl Iterator<Item = &str> {
    flags
        .split(SEPARATOR)
        .map(str::trim_start)
        .filter(|f| !f.is_empty())
}

/// Decode one fragment.
///
/// A numeric payload that does not parse is an error; the caller decides
/// whether to skip it. Numeric payloads are trimmed, description text is
/// returned verbatim.
pub fn parse_fragment(fragment: &str) -> Result<Fragment<'_>, FlagError> {
    let mut chars = fragment.chars();
    let Some(code) = chars.next() else {
        return Err(FlagError {
            flag: String::new(),
            reason: "empty fragment".to_string(),
        });
    };
    let payload = chars.as_str();
    if code == DESCRIPTION_CODE {
        return Ok(Fragment::Description(payload));
    }
    let payload = payload.trim();
    if payload.is_empty() {
        return Ok(Fragment::Value { code, value: None });
    }
    let value = payload.parse::<i32>().map_err(|e| FlagError {
        flag: fragment.trim().to_string(),
        reason: e.to_string(),
    })?;
    Ok(Fragment::Value {
        code,
        value: Some(value),
    })
}

/// Join non-empty fragments with the separator.
pub fn join<I, S>(fragments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for fragment in fragments {
        let fragment = fragment.as_ref();
        if fragment.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(SEPARATOR);
        }
        out.push_str(fragment);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_skips_empty_pieces() {
        let parts: Vec<&str> = split("B::L40:").collect();
        assert_eq!(parts, vec!["B", "L40"]);
        assert_eq!(split("").count(), 0);
        assert_eq!(split(" : ").count(), 0);
    }

    #[test]
    fn test_split_keeps_fragment_tails() {
        let parts: Vec<&str> = split(" L40 : D a = b # c ").collect();
        assert_eq!(parts, vec!["L40 ", "D a = b # c "]);
        assert_eq!(
            parse_fragment(parts[0]).unwrap(),
            Fragment::Value {
                code: 'L',
                value: Some(40)
            }
        );
        assert_eq!(
            parse_fragment(parts[1]).unwrap(),
            Fragment::Description(" a = b # c ")
        );
    }

    #[test]
    fn test_parse_value_fragments() {
        assert_eq!(
            parse_fragment("B").unwrap(),
            Fragment::Value {
                code: 'B',
                value: None
            }
        );
        assert_eq!(
            parse_fragment("L40").unwrap(),
            Fragment::Value {
                code: 'L',
                value: Some(40)
            }
        );
        assert_eq!(
            parse_fragment("W-1").unwrap(),
            Fragment::Value {
                code: 'W',
                value: Some(-1)
            }
        );
    }

    #[test]
    fn test_parse_description_keeps_text_verbatim() {
        assert_eq!(
            parse_fragment("DA rusty key 42").unwrap(),
            Fragment::Description("A rusty key 42")
        );
        assert_eq!(parse_fragment("D").unwrap(), Fragment::Description(""));
    }

    #[test]
    fn test_parse_malformed_number() {
        let err = parse_fragment("Wabc").unwrap_err();
        assert_eq!(err.flag, "Wabc");
    }

    #[test]
    fn test_join_skips_empty() {
        assert_eq!(join(["B99", "", "L4"]), "B99:L4");
        assert_eq!(join(Vec::<String>::new()), "");
    }
}
