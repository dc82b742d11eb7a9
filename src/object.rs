//! Key filtering over mappings.
//!
//! [`filter_object`] keeps or drops entries of a mapping depending on whether
//! their key matches a [`KeyPattern`]. Two matching modes exist:
//!
//! - **strict**: exact string comparison against the pattern element(s);
//! - **regex** (default): the elements are joined with `|` into one
//!   alternation and searched for anywhere in the key.
//!
//! Regex mode does not escape anything. A key pattern such as `"a.b"` also
//! matches `"axb"`, and an unbalanced `"("` fails to compile. Callers that
//! pass arbitrary strings should use [`KeyPattern::escaped`].

use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid key pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// One pattern or a list of alternatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPattern {
    Single(String),
    Many(Vec<String>),
}

impl KeyPattern {
    /// Escape regex metacharacters in every element.
    ///
    /// Only affects regex mode; strict comparison is already literal.
    pub fn escaped(self) -> Self {
        match self {
            KeyPattern::Single(p) => KeyPattern::Single(regex::escape(&p)),
            KeyPattern::Many(ps) => KeyPattern::Many(ps.iter().map(|p| regex::escape(p)).collect()),
        }
    }

    fn to_regex(&self) -> Result<Regex, FilterError> {
        let source = match self {
            KeyPattern::Single(p) => p.clone(),
            KeyPattern::Many(ps) => ps.join("|"),
        };
        Ok(Regex::new(&source)?)
    }

    fn equals(&self, key: &str) -> bool {
        match self {
            KeyPattern::Single(p) => key == p,
            KeyPattern::Many(ps) => ps.iter().any(|p| key == p),
        }
    }
}

impl From<&str> for KeyPattern {
    fn from(pattern: &str) -> Self {
        KeyPattern::Single(pattern.to_string())
    }
}

impl From<String> for KeyPattern {
    fn from(pattern: String) -> Self {
        KeyPattern::Single(pattern)
    }
}

impl From<Vec<String>> for KeyPattern {
    fn from(patterns: Vec<String>) -> Self {
        KeyPattern::Many(patterns)
    }
}

impl From<&[&str]> for KeyPattern {
    fn from(patterns: &[&str]) -> Self {
        KeyPattern::Many(patterns.iter().map(|p| p.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for KeyPattern {
    fn from(patterns: [&str; N]) -> Self {
        KeyPattern::Many(patterns.iter().map(|p| p.to_string()).collect())
    }
}

/// Return a new mapping holding the entries whose key matches (`keep`) or
/// does not match (`!keep`) the pattern.
///
/// In strict mode a list pattern is a set of exact keys: with `keep`, a key
/// survives when it equals any element; without `keep`, when it equals none.
/// The source is untouched and output order follows source iteration order.
///
/// ```
/// use std::collections::BTreeMap;
/// use image_compressor::object::filter_object;
///
/// let source = BTreeMap::from([("a", 1), ("b", 2), ("c", 1)]);
/// let kept: BTreeMap<&str, i32> = filter_object(&source, "a|b", true, false).unwrap();
/// assert_eq!(kept, BTreeMap::from([("a", 1), ("b", 2)]));
/// ```
pub fn filter_object<'a, K, V, M>(
    elements: impl IntoIterator<Item = (&'a K, &'a V)>,
    pattern: impl Into<KeyPattern>,
    keep: bool,
    strict: bool,
) -> Result<M, FilterError>
where
    K: AsRef<str> + Clone + 'a,
    V: Clone + 'a,
    M: FromIterator<(K, V)>,
{
    let pattern = pattern.into();
    let matcher: Box<dyn Fn(&str) -> bool> = if strict {
        Box::new(move |key: &str| pattern.equals(key))
    } else {
        let regex = pattern.to_regex()?;
        Box::new(move |key: &str| regex.is_match(key))
    };

    Ok(elements
        .into_iter()
        .filter(|(k, _)| matcher(AsRef::<str>::as_ref(*k)) == keep)
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect())
}
