//! [`Import`] definitions.

use common::{define_kind, unit, DateTimeOf};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use xxhash_rust::xxh3;

use crate::domain::user;
#[cfg(doc)]
use crate::domain::{user::User, Passport};

/// History record of a bulk [`Passport`]s import.
#[derive(Clone, Debug)]
pub struct Import {
    /// ID of this [`Import`].
    pub id: Id,

    /// ID of the [`User`] who uploaded the file.
    pub user_id: user::Id,

    /// [`FileName`] of the uploaded file.
    pub file_name: FileName,

    /// [`Checksum`] of the uploaded file contents.
    pub checksum: Checksum,

    /// Outcomes of every data [`Row`] of the uploaded file.
    pub rows: Vec<Row>,

    /// [`DateTime`] when this [`Import`] was performed.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime,
}

impl Import {
    /// Returns the total number of processed [`Row`]s.
    #[must_use]
    pub fn total(&self) -> usize {
        self.rows.len()
    }

    /// Returns the number of [`Row`]s having the provided [`Outcome`].
    #[must_use]
    pub fn count(&self, outcome: Outcome) -> usize {
        self.rows.iter().filter(|r| r.outcome == outcome).count()
    }
}

/// Outcome of a single data row of an [`Import`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Row {
    /// Line number of this [`Row`] in the uploaded file (header is line `1`).
    pub line: u32,

    /// [`Outcome`] of processing this [`Row`].
    pub outcome: Outcome,

    /// Human-readable explanation of the [`Outcome`].
    pub message: String,
}

/// ID of an [`Import`].
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
    #[doc = "Name of a file uploaded for an [`Import`]."]
    struct FileName(max = 255);
}

/// Checksum of a file uploaded for an [`Import`].
///
/// Displayed as 32 lowercase hexadecimal digits, so re-uploads of the same
/// file are recognizable in the [`Import`]s history.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Into, PartialEq)]
#[display("{}", _0.simple())]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Checksum(Uuid);

impl Checksum {
    /// Calculates a new [`Checksum`] of the provided file `contents`.
    #[must_use]
    pub fn new(contents: impl AsRef<[u8]>) -> Self {
        Self(Uuid::from_u128(xxh3::xxh3_128(contents.as_ref())))
    }
}

define_kind! {
    #[doc = "Outcome of processing a single [`Row`] of an [`Import`]."]
    enum Outcome {
        #[doc = "A new [`Passport`] was registered."]
        Imported = 1,

        #[doc = "[`Row`] was valid, but ignored."]
        Skipped = 2,

        #[doc = "[`Row`] was malformed or couldn't be stored."]
        Failed = 3,
    }
}

/// [`DateTime`] when an [`Import`] was performed.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(Import, unit::Creation)>;
