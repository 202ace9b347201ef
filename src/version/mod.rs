// src/version/mod.rs

//! APK version comparison and constraint operators
//!
//! Versions follow the apk-tools grammar:
//! `{digit}{.digit}...{letter}{_suffix{#}}...{-r#}`. Comparison walks both
//! strings token by token; the first differing token value decides, and when
//! one version runs out first the longer one wins unless its next token is a
//! pre-release suffix (`_alpha`, `_beta`, `_pre`, `_rc`).
//!
//! Dependency and provides specs in an index carry an optional operator
//! (`so:libc.musl-x86_64.so.1=1`, `foo>=1.2`); [`dependency_name`] strips it.

use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

const PRE_SUFFIXES: [&[u8]; 4] = [b"alpha", b"beta", b"pre", b"rc"];
const POST_SUFFIXES: [&[u8]; 5] = [b"cvs", b"svn", b"git", b"hg", b"p"];

/// Operator tokens in matching priority order (two-character operators first)
pub const OPERATORS: [&str; 8] = [">=", "<=", ">~", "<~", ">", "<", "=", "~"];

/// Outcome of comparing two version strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionOrdering {
    Less,
    Equal,
    Greater,
    /// One side has no version at all
    Unknown,
}

impl VersionOrdering {
    const EQUAL_BIT: u8 = 1;
    const LESS_BIT: u8 = 2;
    const GREATER_BIT: u8 = 4;

    fn bits(self) -> u8 {
        match self {
            VersionOrdering::Equal => Self::EQUAL_BIT,
            VersionOrdering::Less => Self::LESS_BIT,
            VersionOrdering::Greater => Self::GREATER_BIT,
            VersionOrdering::Unknown => 0,
        }
    }

    /// Swap `Less` and `Greater`
    pub fn reverse(self) -> Self {
        match self {
            VersionOrdering::Less => VersionOrdering::Greater,
            VersionOrdering::Greater => VersionOrdering::Less,
            other => other,
        }
    }

    /// Sort-key view of the comparison; `Unknown` sorts as equal
    pub fn as_ordering(self) -> Ordering {
        match self {
            VersionOrdering::Less => Ordering::Less,
            VersionOrdering::Greater => Ordering::Greater,
            VersionOrdering::Equal | VersionOrdering::Unknown => Ordering::Equal,
        }
    }
}

impl fmt::Display for VersionOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VersionOrdering::Less => "<",
            VersionOrdering::Equal => "=",
            VersionOrdering::Greater => ">",
            VersionOrdering::Unknown => "?",
        };
        f.write_str(s)
    }
}

/// Version constraint operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionOp {
    Equal,
    FuzzyEqual,
    Less,
    LessOrEqual,
    FuzzyLessOrEqual,
    Greater,
    GreaterOrEqual,
    FuzzyGreaterOrEqual,
}

impl VersionOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionOp::Equal => "=",
            VersionOp::FuzzyEqual => "~",
            VersionOp::Less => "<",
            VersionOp::LessOrEqual => "<=",
            VersionOp::FuzzyLessOrEqual => "<~",
            VersionOp::Greater => ">",
            VersionOp::GreaterOrEqual => ">=",
            VersionOp::FuzzyGreaterOrEqual => ">~",
        }
    }

    /// Whether this operator compares with trailing components relaxed
    pub fn is_fuzzy(&self) -> bool {
        matches!(
            self,
            VersionOp::FuzzyEqual | VersionOp::FuzzyLessOrEqual | VersionOp::FuzzyGreaterOrEqual
        )
    }

    fn mask(&self) -> u8 {
        let eq = VersionOrdering::EQUAL_BIT;
        let lt = VersionOrdering::LESS_BIT;
        let gt = VersionOrdering::GREATER_BIT;
        match self {
            VersionOp::Equal | VersionOp::FuzzyEqual => eq,
            VersionOp::Less => lt,
            VersionOp::LessOrEqual | VersionOp::FuzzyLessOrEqual => lt | eq,
            VersionOp::Greater => gt,
            VersionOp::GreaterOrEqual | VersionOp::FuzzyGreaterOrEqual => gt | eq,
        }
    }
}

impl FromStr for VersionOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "=" => Ok(VersionOp::Equal),
            "~" => Ok(VersionOp::FuzzyEqual),
            "<" => Ok(VersionOp::Less),
            "<=" => Ok(VersionOp::LessOrEqual),
            "<~" => Ok(VersionOp::FuzzyLessOrEqual),
            ">" => Ok(VersionOp::Greater),
            ">=" => Ok(VersionOp::GreaterOrEqual),
            ">~" => Ok(VersionOp::FuzzyGreaterOrEqual),
            _ => Err(Error::InvalidOperator(s.to_string())),
        }
    }
}

impl fmt::Display for VersionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token classes, ordered as apk-tools orders them
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Token {
    Invalid,
    DigitOrZero,
    Digit,
    Letter,
    Suffix,
    SuffixNo,
    RevisionNo,
    End,
}

#[derive(Clone)]
struct Tokenizer<'a> {
    input: &'a [u8],
    pos: usize,
    token: Token,
}

impl<'a> Tokenizer<'a> {
    fn new(version: &'a str) -> Self {
        Self {
            input: version.as_bytes(),
            pos: 0,
            token: Token::Digit,
        }
    }

    fn rest(&self) -> &'a [u8] {
        &self.input[self.pos..]
    }

    /// Classify the separator at the cursor and step over it
    fn next_token(&mut self) {
        let rest = self.rest();
        let current = self.token;
        let mut next = Token::Invalid;

        if rest.is_empty() || rest[0] == 0 {
            next = Token::End;
        } else if matches!(current, Token::Digit | Token::DigitOrZero)
            && rest[0].is_ascii_lowercase()
        {
            next = Token::Letter;
        } else if current == Token::Letter && rest[0].is_ascii_digit() {
            next = Token::Digit;
        } else if current == Token::Suffix && rest[0].is_ascii_digit() {
            next = Token::SuffixNo;
        } else {
            match rest[0] {
                b'.' => next = Token::DigitOrZero,
                b'_' => next = Token::Suffix,
                b'-' => {
                    if rest.len() > 1 && rest[1] == b'r' {
                        next = Token::RevisionNo;
                        self.pos += 1;
                    }
                }
                _ => {}
            }
            self.pos += 1;
        }

        if next < current {
            let allowed = (next == Token::DigitOrZero && current == Token::Digit)
                || (next == Token::Suffix && current == Token::SuffixNo)
                || (next == Token::Digit && current == Token::Letter);
            if !allowed {
                next = Token::Invalid;
            }
        }

        self.token = next;
    }

    /// Read the value of the current token and advance to the next one
    fn get_token(&mut self) -> i64 {
        let rest = self.rest();
        if rest.is_empty() {
            self.token = Token::End;
            return 0;
        }

        let mut value: i64 = 0;
        let mut len = 0;
        let mut forced = None;

        match self.token {
            Token::DigitOrZero if rest[0] == b'0' && leading_zeros_precede_digit(rest) => {
                while len < rest.len() && rest[len] == b'0' {
                    len += 1;
                }
                forced = Some(Token::Digit);
                value = -(len as i64);
            }
            Token::DigitOrZero | Token::Digit | Token::SuffixNo | Token::RevisionNo => {
                while len < rest.len() && rest[len].is_ascii_digit() {
                    value = value
                        .wrapping_mul(10)
                        .wrapping_add(i64::from(rest[len] - b'0'));
                    len += 1;
                }
            }
            Token::Letter => {
                value = i64::from(rest[0]);
                len = 1;
            }
            Token::Suffix => {
                if let Some(idx) = PRE_SUFFIXES.iter().position(|s| rest.starts_with(s)) {
                    value = idx as i64 - PRE_SUFFIXES.len() as i64;
                    len = PRE_SUFFIXES[idx].len();
                } else if let Some(idx) = POST_SUFFIXES.iter().position(|s| rest.starts_with(s)) {
                    value = idx as i64;
                    len = POST_SUFFIXES[idx].len();
                } else {
                    self.token = Token::Invalid;
                    return -1;
                }
            }
            Token::Invalid | Token::End => {
                self.token = Token::Invalid;
                return -1;
            }
        }

        self.pos += len;
        if self.pos >= self.input.len() {
            self.token = Token::End;
        } else if let Some(token) = forced {
            self.token = token;
        } else {
            self.next_token();
        }

        value
    }
}

/// A zero run only gets the leading-zero treatment when more digits follow it
fn leading_zeros_precede_digit(rest: &[u8]) -> bool {
    rest.iter()
        .find(|b| **b != b'0')
        .is_some_and(|b| b.is_ascii_digit())
}

/// Compare two version strings
///
/// With `fuzzy` set, `a` compares equal to `b` when `b` is a prefix of `a`
/// at a token boundary (`1.2.3 ~ 1.2`).
pub fn compare(a: &str, b: &str, fuzzy: bool) -> VersionOrdering {
    let mut ta = Tokenizer::new(a);
    let mut tb = Tokenizer::new(b);
    let mut av: i64 = 0;
    let mut bv: i64 = 0;

    while ta.token == tb.token
        && ta.token != Token::End
        && ta.token != Token::Invalid
        && av == bv
    {
        av = ta.get_token();
        bv = tb.get_token();
    }

    if av < bv {
        return VersionOrdering::Less;
    }
    if av > bv {
        return VersionOrdering::Greater;
    }

    if ta.token == tb.token || (fuzzy && tb.token == Token::End) {
        return VersionOrdering::Equal;
    }

    // Same leading tokens: the longer version is newer unless it continues
    // with a pre-release suffix
    if ta.token == Token::Suffix && ta.clone().get_token() < 0 {
        return VersionOrdering::Less;
    }
    if tb.token == Token::Suffix && tb.clone().get_token() < 0 {
        return VersionOrdering::Greater;
    }
    if ta.token > tb.token {
        return VersionOrdering::Less;
    }
    if tb.token > ta.token {
        return VersionOrdering::Greater;
    }

    VersionOrdering::Equal
}

/// Total order over version strings, usable with `sort_by`
pub fn cmp_versions(a: &str, b: &str) -> Ordering {
    compare(a, b, false).as_ordering()
}

/// True when `old` is strictly older than `new`
pub fn is_older(old: &str, new: &str) -> bool {
    compare(old, new, false) == VersionOrdering::Less
}

/// Test `version op constraint`, e.g. `satisfies("1.2.3", ">=", "1.2")`
pub fn satisfies(version: &str, op: &str, constraint: &str) -> Result<bool> {
    let op: VersionOp = op.parse()?;
    Ok(satisfies_op(version, op, constraint))
}

/// Typed form of [`satisfies`]
pub fn satisfies_op(version: &str, op: VersionOp, constraint: &str) -> bool {
    compare(version, constraint, op.is_fuzzy()).bits() & op.mask() != 0
}

/// Split a dependency or provides spec into its name and optional constraint
///
/// Operators are tried in [`OPERATORS`] order and the first one present wins.
pub fn split_spec(spec: &str) -> (&str, Option<(VersionOp, &str)>) {
    for token in OPERATORS {
        if let Some((name, version)) = spec.split_once(token) {
            // OPERATORS only holds valid tokens
            let op = token.parse().unwrap_or(VersionOp::Equal);
            return (name, Some((op, version)));
        }
    }
    (spec, None)
}

/// Strip any version constraint from a dependency or provides spec
pub fn dependency_name(spec: &str) -> &str {
    split_spec(spec).0
}
