//! [`Passport`] definitions.

use std::sync::LazyLock;

use common::{define_kind, unit, DateOf, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::Teacher;
use crate::domain::teacher;

/// Travel document of a [`Teacher`].
#[derive(Clone, Debug)]
pub struct Passport {
    /// ID of this [`Passport`].
    pub id: Id,

    /// ID of the [`Teacher`] this [`Passport`] belongs to.
    pub teacher_id: teacher::Id,

    /// [`Number`] of this [`Passport`].
    pub number: Number,

    /// [`Kind`] of this [`Passport`].
    pub kind: Kind,

    /// Date this [`Passport`] was issued at.
    pub issued_on: IssueDate,

    /// Date this [`Passport`] expires at.
    pub expires_on: ExpirationDate,

    /// [`DateTime`] when this [`Passport`] was registered.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime,
}

impl Passport {
    /// Indicates whether this [`Passport`] is expired at the provided `date`.
    #[must_use]
    pub fn is_expired_at(&self, date: common::Date) -> bool {
        self.expires_on.coerce::<()>() < date
    }
}

/// ID of a [`Passport`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Number of a [`Passport`], unique across all [`Passport`]s.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Number(String);

impl Number {
    /// Creates a new [`Number`] if the given `value` is valid.
    ///
    /// The `value` is trimmed and upper-cased before validation.
    #[must_use]
    pub fn new(value: impl AsRef<str>) -> Option<Self> {
        let value = value.as_ref().trim().to_uppercase();
        Self::check(&value).then_some(Self(value))
    }

    /// Checks whether the given `value` is a valid [`Number`].
    fn check(value: impl AsRef<str>) -> bool {
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[A-Z0-9]{5,15}$").expect("valid regex")
        });

        REGEX.is_match(value.as_ref())
    }
}

impl FromStr for Number {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Number`")
    }
}

define_kind! {
    #[doc = "Kind of a [`Passport`]."]
    enum Kind {
        #[doc = "Ordinary [`Passport`]."]
        Ordinary = 1,

        #[doc = "Official [`Passport`]."]
        Official = 2,

        #[doc = "Diplomatic [`Passport`]."]
        Diplomatic = 3,
    }
}

impl Kind {
    /// Parses a [`Kind`] out of its human-readable Spanish `name`, ignoring
    /// case and surrounding whitespace.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "ordinario" | "corriente" => Some(Self::Ordinary),
            "oficial" => Some(Self::Official),
            "diplomatico" | "diplomático" => Some(Self::Diplomatic),
            _ => None,
        }
    }
}

/// Date a [`Passport`] was issued at.
pub type IssueDate = DateOf<(Passport, unit::Start)>;

/// Date a [`Passport`] expires at.
pub type ExpirationDate = DateOf<(Passport, unit::End)>;

/// [`DateTime`] when a [`Passport`] was registered.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(Passport, unit::Creation)>;

#[cfg(test)]
mod spec {
    use super::{Kind, Number};

    #[test]
    fn normalizes_numbers() {
        assert_eq!(Number::new(" k123456 ").unwrap().to_string(), "K123456");
        assert!(Number::new("K12").is_none());
        assert!(Number::new("K-123456").is_none());
        assert!(Number::new("K1234567890123456").is_none());
    }

    #[test]
    fn parses_kind_names() {
        assert_eq!(Kind::from_name("Ordinario"), Some(Kind::Ordinary));
        assert_eq!(Kind::from_name(" OFICIAL "), Some(Kind::Official));
        assert_eq!(Kind::from_name("diplomático"), Some(Kind::Diplomatic));
        assert_eq!(Kind::from_name("turista"), None);
    }
}
