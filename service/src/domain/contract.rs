//! [`Contract`] definitions.

use std::sync::LazyLock;

use common::{define_kind, unit, DateOf, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::Teacher;
use crate::domain::{teacher, Extension};

/// Work assignment of a [`Teacher`] abroad.
#[derive(Clone, Debug)]
pub struct Contract {
    /// ID of this [`Contract`].
    pub id: Id,

    /// Consecutive [`Number`] of this [`Contract`] within its [`Year`].
    pub number: Number,

    /// [`Year`] this [`Contract`] is registered in.
    pub year: Year,

    /// ID of the contracted [`Teacher`].
    pub teacher_id: teacher::Id,

    /// Destination [`Country`] of this [`Contract`].
    pub country: Country,

    /// Date this [`Contract`] starts at.
    pub start_date: StartDate,

    /// Current effective date this [`Contract`] ends at.
    ///
    /// Always reflects the latest [`Extension`], if any.
    pub end_date: EndDate,

    /// Date this [`Contract`] ends at without any [`Extension`]s.
    pub base_end_date: EndDate,

    /// [`Function`] the [`Teacher`] performs.
    pub function: Function,

    /// [`Workplace`] of the [`Teacher`].
    pub workplace: Workplace,

    /// Salary of the [`Teacher`], if agreed.
    pub salary: Option<Money>,

    /// [`Status`] of this [`Contract`].
    pub status: Status,

    /// Free-text [`Notes`] about this [`Contract`].
    pub notes: Option<Notes>,

    /// [`DateTime`] when this [`Contract`] was created.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Contract`] was deleted, if it was.
    ///
    /// [`DateTime`]: common::DateTime
    pub deleted_at: Option<DeletionDateTime>,
}

impl Contract {
    /// Indicates whether this [`Contract`] is [`Status::Closed`] or
    /// [`Status::Cancelled`], so doesn't accept [`Extension`] operations.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.status.is_terminal()
    }

    /// Indicates whether this [`Contract`] was soft-deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Re-derives the [`Contract::end_date`] and [`Contract::status`] from the
    /// provided [`Extension`]s of this [`Contract`].
    ///
    /// Terminated [`Contract`]s are left untouched.
    pub fn apply_extensions<'e>(
        &mut self,
        extensions: impl IntoIterator<Item = &'e Extension>,
    ) {
        if self.is_terminated() {
            return;
        }
        (self.end_date, self.status) =
            derive_state(extensions, self.base_end_date);
    }
}

/// Derives the effective end date and [`Status`] of a non-terminated
/// [`Contract`] out of its [`Extension`]s and its `base_end_date`.
///
/// The [`Extension`] with the highest [`extension::Number`] is the last one,
/// regardless of the iteration order.
///
/// [`extension::Number`]: crate::domain::extension::Number
#[must_use]
pub fn derive_state<'e>(
    extensions: impl IntoIterator<Item = &'e Extension>,
    base_end_date: EndDate,
) -> (EndDate, Status) {
    extensions
        .into_iter()
        .max_by_key(|e| e.number)
        .map_or((base_end_date, Status::Active), |last| {
            (last.to_date.coerce(), Status::Extended)
        })
}

/// ID of a [`Contract`].
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

/// Consecutive number of a [`Contract`] within its [`Year`].
#[derive(
    Clone, Copy, Debug, Display, Eq, Hash, Into, Ord, PartialEq, PartialOrd,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Number(i32);

impl Number {
    /// [`Number`] of the first [`Contract`] in a [`Year`].
    pub const FIRST: Self = Self(1);

    /// Creates a new [`Number`] if the provided `value` is positive.
    #[must_use]
    pub fn new(value: i32) -> Option<Self> {
        (value > 0).then_some(Self(value))
    }

    /// Returns the [`Number`] following this one.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Year a [`Contract`] is registered in.
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    Eq,
    From,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Year(i32);

impl From<StartDate> for Year {
    fn from(date: StartDate) -> Self {
        Self(date.year())
    }
}

/// Destination country of a [`Contract`] as an [ISO 3166-1 alpha-2] code.
///
/// [ISO 3166-1 alpha-2]: https://wikipedia.org/wiki/ISO_3166-1_alpha-2
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Country(String);

impl Country {
    /// Creates a new [`Country`] out of the given `code`, if it's valid.
    ///
    /// The `code` is trimmed and upper-cased before validation.
    #[must_use]
    pub fn new(code: impl AsRef<str>) -> Option<Self> {
        let code = code.as_ref().trim().to_ascii_uppercase();
        Self::check(&code).then_some(Self(code))
    }

    /// Checks whether the given `code` is a valid [`Country`].
    fn check(code: impl AsRef<str>) -> bool {
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[A-Z]{2}$").expect("valid regex")
        });

        REGEX.is_match(code.as_ref())
    }
}

impl FromStr for Country {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Country`")
    }
}

define_text! {
    #[doc = "Function (role) a teacher performs under a [`Contract`]."]
    struct Function(max = 255);
}

define_text! {
    #[doc = "Workplace of a teacher under a [`Contract`]."]
    struct Workplace(max = 255);
}

define_text! {
    #[doc = "Free-text notes about a [`Contract`]."]
    struct Notes(max = 2000);
}

define_kind! {
    #[doc = "Status of a [`Contract`]."]
    enum Status {
        #[doc = "[`Contract`] is in force and has no extensions."]
        Active = 1,

        #[doc = "[`Contract`] is in force and has at least one extension."]
        Extended = 2,

        #[doc = "[`Contract`] is closed."]
        Closed = 3,

        #[doc = "[`Contract`] is cancelled."]
        Cancelled = 4,
    }
}

impl Status {
    /// Indicates whether this [`Status`] doesn't allow any further changes of
    /// a [`Contract`] period.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Cancelled)
    }
}

/// Date a [`Contract`] starts at.
pub type StartDate = DateOf<(Contract, unit::Start)>;

/// Date a [`Contract`] ends at.
pub type EndDate = DateOf<(Contract, unit::End)>;

/// [`DateTime`] when a [`Contract`] was created.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(Contract, unit::Creation)>;

/// [`DateTime`] when a [`Contract`] was deleted.
///
/// [`DateTime`]: common::DateTime
pub type DeletionDateTime = DateTimeOf<(Contract, unit::Deletion)>;

#[cfg(test)]
mod spec {
    use common::{Date, DateTime};

    use crate::domain::{extension, user, Extension};

    use super::{derive_state, Country, EndDate, Id, Number, Status};

    fn date(s: &str) -> Date {
        Date::parse(s).unwrap()
    }

    fn extension(number: i32, from: &str, to: &str) -> Extension {
        Extension {
            id: extension::Id::new(),
            contract_id: Id::new(),
            number: extension::Number::new(number).unwrap(),
            from_date: date(from).coerce(),
            to_date: date(to).coerce(),
            reason: extension::Reason::new("Necesidad docente").unwrap(),
            notes: None,
            created_by: user::Id::new(),
            created_at: DateTime::now().coerce(),
        }
    }

    #[test]
    fn no_extensions_keep_base_end_date() {
        let base: EndDate = date("2024-12-31").coerce();

        assert_eq!(
            derive_state(std::iter::empty(), base),
            (base, Status::Active),
        );
    }

    #[test]
    fn last_extension_defines_end_date() {
        let base: EndDate = date("2024-12-31").coerce();
        let exts = [
            extension(1, "2025-01-01", "2025-06-30"),
            extension(2, "2025-07-01", "2025-12-31"),
        ];

        assert_eq!(
            derive_state(&exts, base),
            (date("2025-12-31").coerce(), Status::Extended),
        );
    }

    #[test]
    fn highest_number_wins_regardless_of_order() {
        let base: EndDate = date("2024-12-31").coerce();
        let exts = [
            extension(2, "2025-07-01", "2025-12-31"),
            extension(1, "2025-01-01", "2025-06-30"),
        ];

        assert_eq!(
            derive_state(&exts, base),
            (date("2025-12-31").coerce(), Status::Extended),
        );
    }

    #[test]
    fn country_is_normalized() {
        assert_eq!(Country::new(" ve ").unwrap().to_string(), "VE");
        assert!(Country::new("VEN").is_none());
        assert!(Country::new("V1").is_none());
        assert!(Country::new("").is_none());
    }

    #[test]
    fn numbers_are_positive() {
        assert_eq!(Number::FIRST.next(), Number::new(2).unwrap());
        assert!(Number::new(0).is_none());
        assert!(Number::new(-1).is_none());
    }

    #[test]
    fn terminal_statuses() {
        assert!(!Status::Active.is_terminal());
        assert!(!Status::Extended.is_terminal());
        assert!(Status::Closed.is_terminal());
        assert!(Status::Cancelled.is_terminal());
    }

    #[test]
    fn status_has_screaming_snake_names() {
        assert_eq!(Status::Extended.to_string(), "EXTENDED");
        assert_eq!("CANCELLED".parse::<Status>(), Ok(Status::Cancelled));
        assert!("extended".parse::<Status>().is_err());
    }
}
