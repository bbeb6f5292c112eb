//! [`FuzzPattern`] definition.

use derive_more::Display;
use itertools::Itertools as _;
use postgres_types::{FromSql, ToSql};

use crate::domain::teacher;

/// `SIMILAR TO` pattern matching a [`teacher::NormalizedName`] containing all
/// the searched words in the typed order.
///
/// `maria gonz` matches `ana maria gonzalez perez`, while `gonz maria` does
/// not.
#[derive(Clone, Debug, Display, Eq, FromSql, PartialEq, ToSql)]
#[postgres(transparent)]
pub struct FuzzPattern(String);

impl FuzzPattern {
    /// Creates a new [`FuzzPattern`] out of the provided searched `name`.
    #[must_use]
    pub fn new(name: &teacher::NormalizedName) -> Self {
        let words = name
            .as_ref()
            .split_ascii_whitespace()
            .map(escape)
            .join("%");
        Self(format!("%{words}%"))
    }
}

/// Escapes all the `SIMILAR TO` metacharacters in the provided `word`.
fn escape(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    for c in word.chars() {
        if matches!(
            c,
            '\\' | '%'
                | '_'
                | '|'
                | '*'
                | '+'
                | '?'
                | '{'
                | '}'
                | '('
                | ')'
                | '['
                | ']'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod spec {
    use crate::domain::teacher::NormalizedName;

    use super::FuzzPattern;

    fn pattern(input: &str) -> String {
        FuzzPattern::new(&NormalizedName::new(input).unwrap()).to_string()
    }

    #[test]
    fn joins_words_in_order() {
        assert_eq!(pattern("María  González"), "%maria%gonzalez%");
    }

    #[test]
    fn escapes_metacharacters() {
        assert_eq!(pattern("a_b (c)"), r"%a\_b%\(c\)%");
        assert_eq!(pattern("50%"), r"%50\%%");
    }
}
