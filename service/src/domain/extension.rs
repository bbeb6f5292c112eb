//! [`Extension`] definitions.

use common::{unit, DateOf, DateTimeOf};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::{user::User, Contract};
use crate::domain::{contract, user};

/// Approved period appended to a [`Contract`], extending its effective end
/// date.
#[derive(Clone, Debug)]
pub struct Extension {
    /// ID of this [`Extension`].
    pub id: Id,

    /// ID of the [`Contract`] this [`Extension`] belongs to.
    pub contract_id: contract::Id,

    /// Ordinal [`Number`] of this [`Extension`] within its [`Contract`].
    pub number: Number,

    /// Date this [`Extension`] starts at.
    pub from_date: FromDate,

    /// Date this [`Extension`] ends at.
    pub to_date: ToDate,

    /// [`Reason`] of this [`Extension`].
    pub reason: Reason,

    /// Free-text [`Notes`] about this [`Extension`].
    pub notes: Option<Notes>,

    /// ID of the [`User`] who registered this [`Extension`].
    pub created_by: user::Id,

    /// [`DateTime`] when this [`Extension`] was created.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime,
}

/// Checks that the provided period is well-formed, meaning it ends strictly
/// after it starts.
#[must_use]
pub fn is_valid_period(from: FromDate, to: ToDate) -> bool {
    to.coerce::<()>() > from.coerce()
}

/// ID of an [`Extension`].
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

/// Ordinal number of an [`Extension`] within its [`Contract`].
///
/// Numbers are contiguous and start from `1`.
#[derive(
    Clone, Copy, Debug, Display, Eq, Hash, Into, Ord, PartialEq, PartialOrd,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Number(i32);

impl Number {
    /// Creates a new [`Number`] if the provided `value` is positive.
    #[must_use]
    pub fn new(value: i32) -> Option<Self> {
        (value > 0).then_some(Self(value))
    }

    /// Returns the [`Number`] to be assigned to a new [`Extension`] of a
    /// [`Contract`] having the provided amount of [`Extension`]s already.
    #[must_use]
    pub fn after(existing: usize) -> Self {
        Self(i32::try_from(existing).unwrap_or(i32::MAX - 1) + 1)
    }
}

define_text! {
    #[doc = "Reason of an [`Extension`]."]
    struct Reason(max = 1000);
}

define_text! {
    #[doc = "Free-text notes about an [`Extension`]."]
    struct Notes(max = 2000);
}

/// Date an [`Extension`] starts at.
pub type FromDate = DateOf<(Extension, unit::Start)>;

/// Date an [`Extension`] ends at.
pub type ToDate = DateOf<(Extension, unit::End)>;

/// [`DateTime`] when an [`Extension`] was created.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(Extension, unit::Creation)>;

#[cfg(test)]
mod spec {
    use common::Date;

    use super::{is_valid_period, Number};

    #[test]
    fn numbers_follow_existing_count() {
        assert_eq!(Some(Number::after(0)), Number::new(1));
        assert_eq!(Some(Number::after(2)), Number::new(3));
        assert!(Number::new(0).is_none());
    }

    #[test]
    fn period_must_end_after_it_starts() {
        let d = |s| Date::parse(s).unwrap();

        assert!(is_valid_period(
            d("2025-01-01").coerce(),
            d("2025-01-02").coerce(),
        ));
        assert!(!is_valid_period(
            d("2025-01-01").coerce(),
            d("2025-01-01").coerce(),
        ));
        assert!(!is_valid_period(
            d("2025-06-30").coerce(),
            d("2025-01-01").coerce(),
        ));
    }
}
