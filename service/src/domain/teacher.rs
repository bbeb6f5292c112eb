//! [`Teacher`] definitions.

use std::sync::LazyLock;

use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Teacher participating in the international cooperation.
#[derive(Clone, Debug)]
pub struct Teacher {
    /// ID of this [`Teacher`].
    pub id: Id,

    /// [`FullName`] of this [`Teacher`].
    pub full_name: FullName,

    /// [`NormalizedName`] of this [`Teacher`], used for matching.
    pub normalized_name: NormalizedName,

    /// [`IdentityCard`] number of this [`Teacher`].
    pub identity_card: IdentityCard,

    /// [`DateTime`] when this [`Teacher`] was created.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Teacher`] was deleted, if it was.
    ///
    /// [`DateTime`]: common::DateTime
    pub deleted_at: Option<DeletionDateTime>,
}

/// ID of a [`Teacher`].
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

define_text! {
    #[doc = "Full name of a [`Teacher`]."]
    struct FullName(max = 255);
}

/// Name of a [`Teacher`] normalized for matching: lower-cased, with accents
/// removed and whitespace collapsed.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct NormalizedName(String);

impl NormalizedName {
    /// Normalizes the provided `name`.
    ///
    /// [`None`] is returned if nothing remains after normalization.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Option<Self> {
        let normalized = name
            .as_ref()
            .split_whitespace()
            .map(|word| word.chars().flat_map(fold).collect::<String>())
            .collect::<Vec<_>>()
            .join(" ");
        (!normalized.is_empty()).then_some(Self(normalized))
    }
}

impl From<&FullName> for NormalizedName {
    fn from(name: &FullName) -> Self {
        Self::new(name).unwrap_or_else(|| {
            unreachable!("`FullName` is never blank")
        })
    }
}

/// Folds the provided character to its lower-case unaccented form.
fn fold(c: char) -> impl Iterator<Item = char> {
    let base = match c {
        'á' | 'à' | 'ä' | 'â' | 'ã' | 'Á' | 'À' | 'Ä' | 'Â' | 'Ã' => 'a',
        'é' | 'è' | 'ë' | 'ê' | 'É' | 'È' | 'Ë' | 'Ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' | 'Í' | 'Ì' | 'Ï' | 'Î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' | 'Ó' | 'Ò' | 'Ö' | 'Ô' | 'Õ' => 'o',
        'ú' | 'ù' | 'ü' | 'û' | 'Ú' | 'Ù' | 'Ü' | 'Û' => 'u',
        'ñ' | 'Ñ' => 'n',
        'ç' | 'Ç' => 'c',
        c => c,
    };
    base.to_lowercase()
}

/// National identity card number of a [`Teacher`] (11 digits).
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct IdentityCard(String);

impl IdentityCard {
    /// Creates a new [`IdentityCard`] if the given `number` is valid.
    #[must_use]
    pub fn new(number: impl AsRef<str>) -> Option<Self> {
        let number = number.as_ref().trim();
        Self::check(number).then(|| Self(number.to_owned()))
    }

    /// Checks whether the given `number` is a valid [`IdentityCard`].
    fn check(number: impl AsRef<str>) -> bool {
        static REGEX: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"^\d{11}$").expect("valid regex"));

        REGEX.is_match(number.as_ref())
    }
}

impl FromStr for IdentityCard {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `IdentityCard`")
    }
}

/// [`DateTime`] when a [`Teacher`] was created.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(Teacher, unit::Creation)>;

/// [`DateTime`] when a [`Teacher`] was deleted.
///
/// [`DateTime`]: common::DateTime
pub type DeletionDateTime = DateTimeOf<(Teacher, unit::Deletion)>;

#[cfg(test)]
mod spec {
    use super::{FullName, IdentityCard, NormalizedName};

    #[test]
    fn normalizes_names() {
        let name = FullName::new("José  Martínez   Peña").unwrap();

        assert_eq!(NormalizedName::from(&name).as_ref(), "jose martinez pena");
        assert_eq!(
            NormalizedName::new("  JOSE MARTINEZ PEÑA ").unwrap(),
            NormalizedName::from(&name),
        );
        assert!(NormalizedName::new("   ").is_none());
    }

    #[test]
    fn validates_identity_cards() {
        assert!(IdentityCard::new("85010112345").is_some());
        assert!(IdentityCard::new(" 85010112345 ").is_some());
        assert!(IdentityCard::new("8501011234").is_none());
        assert!(IdentityCard::new("8501011234a").is_none());
    }
}
