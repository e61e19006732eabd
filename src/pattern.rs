//! Glob pattern matching over slash-separated archive paths
//!
//! Patterns are split on `/` and matched segment-by-segment: `*` and `?`
//! never cross a separator, bracket classes (`[abc]`, `[a-z]`, `[!x]`)
//! match one character, and a `**` segment matches any number of whole
//! segments (including none). An unterminated bracket matches a literal
//! `[`, as fnmatch-style matchers conventionally do.

use crate::error::{Result, ZipPathError};

#[derive(Debug, Clone)]
enum Token {
    Literal(char),
    /// `?`
    AnyChar,
    /// `*` - a run of zero or more non-separator characters
    AnyRun,
    /// `[...]` character class, optionally negated with a leading `!`
    Class { negated: bool, ranges: Vec<(char, char)> },
}

#[derive(Debug, Clone)]
enum Segment {
    /// `**` - spans zero or more whole path segments
    Recursive,
    Tokens(Vec<Token>),
}

/// A compiled glob pattern
#[derive(Debug, Clone)]
pub struct GlobPattern {
    segments: Vec<Segment>,
}

impl GlobPattern {
    /// Compile a pattern; an empty pattern is rejected
    pub fn new(pattern: &str) -> Result<GlobPattern> {
        if pattern.is_empty() {
            return Err(ZipPathError::InvalidArgument(
                "glob pattern must not be empty".to_string(),
            ));
        }
        let segments = pattern.split('/').map(compile_segment).collect();
        Ok(GlobPattern { segments })
    }

    /// Match a full slash-separated relative path against the pattern
    pub fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = path.split('/').collect();
        match_segments(&self.segments, &parts)
    }

    /// pathlib-style `match`: the pattern is anchored at the right, so a
    /// pattern of `n` segments matches iff the final `n` path segments
    /// match it
    pub fn matches_right_anchored(&self, parts: &[&str]) -> bool {
        if self.segments.len() > parts.len() {
            return false;
        }
        let tail = &parts[parts.len() - self.segments.len()..];
        self.segments
            .iter()
            .zip(tail)
            .all(|(segment, part)| match segment {
                Segment::Recursive => true,
                Segment::Tokens(tokens) => match_tokens(tokens, part),
            })
    }
}

fn compile_segment(segment: &str) -> Segment {
    if segment == "**" {
        return Segment::Recursive;
    }
    let chars: Vec<char> = segment.chars().collect();
    let mut tokens = Vec::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => {
                // Consecutive stars collapse to one run
                if !matches!(tokens.last(), Some(Token::AnyRun)) {
                    tokens.push(Token::AnyRun);
                }
                i += 1;
            }
            '?' => {
                tokens.push(Token::AnyChar);
                i += 1;
            }
            '[' => match compile_class(&chars[i + 1..]) {
                Some((token, consumed)) => {
                    tokens.push(token);
                    i += 1 + consumed;
                }
                None => {
                    tokens.push(Token::Literal('['));
                    i += 1;
                }
            },
            c => {
                tokens.push(Token::Literal(c));
                i += 1;
            }
        }
    }
    Segment::Tokens(tokens)
}

/// Compile the body of a bracket class starting just past the `[`.
/// Returns the token and the number of characters consumed (including the
/// closing bracket), or `None` when the class never closes.
fn compile_class(chars: &[char]) -> Option<(Token, usize)> {
    let mut i = 0;
    let negated = chars.first() == Some(&'!');
    if negated {
        i += 1;
    }

    let mut ranges = Vec::new();
    let mut first = true;
    while i < chars.len() {
        let c = chars[i];
        if c == ']' && !first {
            return Some((Token::Class { negated, ranges }, i + 1));
        }
        first = false;
        // `a-z` forms a range unless the dash is the final member
        if i + 2 < chars.len() && chars[i + 1] == '-' && chars[i + 2] != ']' {
            ranges.push((c, chars[i + 2]));
            i += 3;
        } else {
            ranges.push((c, c));
            i += 1;
        }
    }
    None
}

fn match_segments(pattern: &[Segment], parts: &[&str]) -> bool {
    match pattern.split_first() {
        None => parts.is_empty(),
        Some((Segment::Recursive, rest)) => {
            (0..=parts.len()).any(|skip| match_segments(rest, &parts[skip..]))
        }
        Some((Segment::Tokens(tokens), rest)) => match parts.split_first() {
            Some((part, tail)) => match_tokens(tokens, part) && match_segments(rest, tail),
            None => false,
        },
    }
}

fn match_tokens(tokens: &[Token], text: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    match_chars(tokens, &chars)
}

fn match_chars(tokens: &[Token], chars: &[char]) -> bool {
    match tokens.split_first() {
        None => chars.is_empty(),
        Some((Token::AnyRun, rest)) => {
            (0..=chars.len()).any(|skip| match_chars(rest, &chars[skip..]))
        }
        Some((token, rest)) => match chars.split_first() {
            Some((&c, tail)) => token_matches(token, c) && match_chars(rest, tail),
            None => false,
        },
    }
}

fn token_matches(token: &Token, c: char) -> bool {
    match token {
        Token::Literal(l) => *l == c,
        Token::AnyChar => true,
        Token::AnyRun => true,
        Token::Class { negated, ranges } => {
            let hit = ranges.iter().any(|&(lo, hi)| c >= lo && c <= hi);
            hit != *negated
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, path: &str) -> bool {
        GlobPattern::new(pattern).unwrap().matches(path)
    }

    #[test]
    fn star_stays_within_a_segment() {
        assert!(matches("*.txt", "a.txt"));
        assert!(!matches("*.txt", "b/c.txt"));
        assert!(!matches("*.xt", "a.txt"));
    }

    #[test]
    fn recursive_spans_zero_or_more_segments() {
        assert!(matches("**/*.txt", "a.txt"));
        assert!(matches("**/*.txt", "b/d/e.txt"));
        assert!(matches("**/*/i.txt", "g/h/i.txt"));
        assert!(!matches("*/i.txt", "g/h/i.txt"));
    }

    #[test]
    fn question_mark_and_classes() {
        assert!(matches("a?txt", "a.txt"));
        assert!(matches("a[.]txt", "a.txt"));
        assert!(!matches("a[?]txt", "a.txt"));
        assert!(matches("?.b[ai][nz]", "k.bin"));
        assert!(matches("?.b[ai][nz]", "l.baz"));
        assert!(!matches("?.b[ai][nz]", "m.bar"));
    }

    #[test]
    fn class_ranges_and_negation() {
        assert!(matches("[a-c].txt", "b.txt"));
        assert!(!matches("[a-c].txt", "d.txt"));
        assert!(matches("[!a-c].txt", "d.txt"));
        assert!(matches("[]]x", "]x"));
    }

    #[test]
    fn unterminated_class_is_literal() {
        assert!(matches("a[b", "a[b"));
        assert!(!matches("a[b", "ab"));
    }

    #[test]
    fn empty_pattern_rejected() {
        assert!(matches!(
            GlobPattern::new(""),
            Err(ZipPathError::InvalidArgument(_))
        ));
    }

    #[test]
    fn right_anchored_match() {
        let pattern = GlobPattern::new("*.txt").unwrap();
        assert!(pattern.matches_right_anchored(&["b", "c.txt"]));
        assert!(!pattern.matches_right_anchored(&["b", "c.bin"]));
        let deep = GlobPattern::new("d/*.txt").unwrap();
        assert!(deep.matches_right_anchored(&["b", "d", "e.txt"]));
        assert!(!deep.matches_right_anchored(&["e.txt"]));
    }
}
