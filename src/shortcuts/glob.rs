//! Site-filter patterns.
//!
//! A pattern wrapped in slashes (`/.../`) is a literal regular expression
//! body with no implied anchors. Anything else is a glob where `*` matches
//! any run of characters and the whole URL must match.

use regex::Regex;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum PatternError {
    #[error("invalid regular expression in site pattern '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A compiled site pattern.
#[derive(Clone, Debug)]
pub struct Matcher {
    regex: Regex,
}

impl Matcher {
    pub fn test(&self, url: &str) -> bool {
        self.regex.is_match(url)
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// The regex body of a `/.../` literal, if `pattern` is one.
fn regex_literal(pattern: &str) -> Option<&str> {
    if pattern.len() >= 2 && pattern.starts_with('/') && pattern.ends_with('/') {
        Some(&pattern[1..pattern.len() - 1])
    } else {
        None
    }
}

/// Translate a glob into an anchored regex source string.
pub fn glob_to_regex(glob: &str) -> String {
    let mut source = String::with_capacity(glob.len() + 8);
    source.push_str("(?s)^");
    let mut buf = [0u8; 4];
    for c in glob.chars() {
        if c == '*' {
            source.push_str(".*");
        } else {
            source.push_str(&regex::escape(c.encode_utf8(&mut buf)));
        }
    }
    source.push('$');
    source
}

/// Compile a site pattern. Only `/.../` literals can fail.
pub fn compile(pattern: &str) -> Result<Matcher, PatternError> {
    let source = match regex_literal(pattern) {
        Some(body) => body.to_string(),
        None => glob_to_regex(pattern),
    };
    Regex::new(&source)
        .map(|regex| Matcher { regex })
        .map_err(|source| PatternError::InvalidRegex {
            pattern: pattern.to_string(),
            source,
        })
}

/// Test `url` against `pattern`. A pattern that fails to compile never matches.
pub fn matches(pattern: &str, url: &str) -> bool {
    match compile(pattern) {
        Ok(matcher) => matcher.test(url),
        Err(e) => {
            warn!(error = %e, pattern = pattern, "Ignoring malformed site pattern");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_glob_matches_inside_url() {
        let m = compile("*mail.google.com*").unwrap();
        assert!(m.test("https://mail.google.com/inbox"));
        assert!(!m.test("https://example.com"));
    }

    #[test]
    fn plain_strings_match_themselves() {
        for p in [
            "https://example.com/a?b=c",
            "a.b(c)[d]{e}|f^g$h+i",
            "C:\\path\\to",
            "",
            "ünïcödé.example",
        ] {
            assert!(compile(p).unwrap().test(p), "pattern {p:?}");
        }
    }

    #[test]
    fn glob_is_anchored_at_both_ends() {
        let m = compile("example.com").unwrap();
        assert!(!m.test("https://example.com"));
        assert!(!m.test("example.com/path"));
        assert!(!m.test("exampleXcom"));
    }

    #[test]
    fn regex_literal_is_not_anchored() {
        let m = compile("/github\\.com\\/[a-z]+/").unwrap();
        assert!(m.test("https://github.com/rust-lang"));
        assert!(!m.test("https://gitlab.com/rust-lang"));
    }

    #[test]
    fn malformed_regex_literal_is_an_error_and_never_matches() {
        assert!(matches!(
            compile("/(unclosed/"),
            Err(PatternError::InvalidRegex { .. })
        ));
        assert!(!matches("/(unclosed/", "(unclosed"));
    }

    #[test]
    fn single_slash_is_a_glob() {
        assert!(compile("/").unwrap().test("/"));
    }

    #[test]
    fn star_matches_across_newlines() {
        assert!(matches("a*b", "a\nb"));
    }
}
