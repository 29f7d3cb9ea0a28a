//! # Input Classification
//!
//! A single line of user input can mean four different things. Rules are tried in a
//! fixed order and the first one that matches wins:
//!
//! | Input                    | Command                                   |
//! |--------------------------|-------------------------------------------|
//! | `/descri[bp]/`           | [`Command::Regex`] (search)               |
//! | `s/foo/bar/3`            | [`Command::Substitution`] (edit note `3`) |
//! | `@office ~Bob #book`     | [`Command::Tags`] (list by tags)          |
//! | anything else            | [`Command::PlainText`] (fallback)         |
//!
//! Because the regex form is checked first, `/#tag/` is a search for `#tag`, never a tag.
//! Tags only match when *every* whitespace-separated token starts with a prefix
//! character, so `@home /music/` is plain text. An empty prefix set turns tag detection
//! off entirely.
//!
//! A pattern (regex body or substitution pattern) may not end in an unescaped backslash:
//! `/foo\/` is not a regex, `/foo\\/` is.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Prefix characters used when none are configured.
pub const DEFAULT_PREFIXES: &str = "#@";

// A non-empty, single-line body that does not end in an odd run of backslashes.
static REGEX_FORM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/((?:.*[^\\\n])(?:\\\\)*|(?:\\\\)+)/$").unwrap());

static SUBSTITUTION_FORM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^s/((?:.*[^\\\n])(?:\\\\)*|(?:\\\\)+)/(.*)/([-0-9a-z]+)$").unwrap()
});

/// A find/replace directive: `s/<pattern>/<replacement>/<selector>`.
///
/// The selector is opaque to the classifier. Backends treat it as a note id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub pattern: String,
    pub replacement: String,
    pub selector: String,
}

/// Tags grouped by their prefix character.
///
/// Within a group, tags keep the order in which they were written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    groups: BTreeMap<char, Vec<String>>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from explicit groups, mostly useful for comparisons in tests.
    pub fn from_groups<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = (char, Vec<S>)>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for (prefix, tags) in groups {
            let entry = set.groups.entry(prefix).or_default();
            entry.extend(tags.into_iter().map(Into::into));
        }
        set
    }

    /// Appends a token to the group of its first character. Empty tokens are ignored.
    pub fn push(&mut self, token: &str) {
        if let Some(prefix) = token.chars().next() {
            self.groups
                .entry(prefix)
                .or_default()
                .push(token.to_string());
        }
    }

    pub fn get(&self, prefix: char) -> Option<&[String]> {
        self.groups.get(&prefix).map(Vec::as_slice)
    }

    pub fn groups(&self) -> impl Iterator<Item = (char, &[String])> {
        self.groups.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    /// All tags, group by group.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.groups.values().flatten().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub(crate) fn into_groups(self) -> BTreeMap<char, Vec<String>> {
        self.groups
    }
}

/// The set of characters that mark a token as a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixSet(Vec<char>);

impl PrefixSet {
    /// A set that never matches.
    pub fn none() -> Self {
        PrefixSet(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, c: char) -> bool {
        self.0.contains(&c)
    }

    /// True when the token starts with one of the prefix characters.
    pub fn matches(&self, token: &str) -> bool {
        token.chars().next().is_some_and(|c| self.contains(c))
    }
}

impl Default for PrefixSet {
    fn default() -> Self {
        PrefixSet::from(DEFAULT_PREFIXES)
    }
}

impl From<&str> for PrefixSet {
    fn from(chars: &str) -> Self {
        let mut set = Vec::new();
        for c in chars.chars().filter(|c| !c.is_whitespace()) {
            if !set.contains(&c) {
                set.push(c);
            }
        }
        PrefixSet(set)
    }
}

impl fmt::Display for PrefixSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.0 {
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

/// What a line of input asks for.
///
/// `T` is the payload of the plain-text case: the raw text when produced by
/// [`classify`], or whatever the fallback returned when produced by
/// [`WriteDownApi::parse_input`](crate::api::WriteDownApi::parse_input).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<T = String> {
    Regex(String),
    Substitution(Substitution),
    Tags(TagSet),
    PlainText(T),
}

impl<T> Command<T> {
    pub fn kind(&self) -> &'static str {
        match self {
            Command::Regex(_) => "regex",
            Command::Substitution(_) => "substitution",
            Command::Tags(_) => "tags",
            Command::PlainText(_) => "plain text",
        }
    }

    /// Replaces the plain-text payload, leaving the other variants untouched.
    pub fn try_map_plain<U, E, F>(self, f: F) -> Result<Command<U>, E>
    where
        F: FnOnce(T) -> Result<U, E>,
    {
        Ok(match self {
            Command::Regex(r) => Command::Regex(r),
            Command::Substitution(s) => Command::Substitution(s),
            Command::Tags(t) => Command::Tags(t),
            Command::PlainText(t) => Command::PlainText(f(t)?),
        })
    }
}

/// Classifies a line of input. Total: every string yields exactly one command.
pub fn classify(pattern: &str, prefixes: &PrefixSet) -> Command {
    if let Some(regex) = regex_form(pattern) {
        return Command::Regex(regex);
    }
    if let Some(substitution) = substitution_form(pattern) {
        return Command::Substitution(substitution);
    }
    if pattern.starts_with("s/") {
        debug!(pattern, "malformed substitution, trying lower-precedence forms");
    }
    if let Some(tags) = tag_form(pattern, prefixes) {
        return Command::Tags(tags);
    }
    Command::PlainText(pattern.to_string())
}

fn regex_form(pattern: &str) -> Option<String> {
    REGEX_FORM
        .captures(pattern)
        .map(|caps| caps[1].to_string())
}

fn substitution_form(pattern: &str) -> Option<Substitution> {
    let caps = SUBSTITUTION_FORM.captures(pattern)?;
    Some(Substitution {
        pattern: caps[1].to_string(),
        replacement: caps[2].to_string(),
        selector: caps[3].to_string(),
    })
}

fn tag_form(pattern: &str, prefixes: &PrefixSet) -> Option<TagSet> {
    if prefixes.is_empty() {
        return None;
    }
    let tokens: Vec<&str> = pattern.split_whitespace().collect();
    if tokens.is_empty() || !tokens.iter().all(|t| prefixes.matches(t)) {
        return None;
    }

    let mut tags = TagSet::new();
    for token in tokens {
        tags.push(token);
    }
    Some(tags)
}
