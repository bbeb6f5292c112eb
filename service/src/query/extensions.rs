//! [`Query`] collection related to the multiple [`Extension`]s.

use common::operations::By;

use crate::domain::{contract, Extension};
#[cfg(doc)]
use crate::{domain::Contract, Query};

use super::DatabaseQuery;

/// Queries all [`Extension`]s of a [`Contract`] ordered by their
/// [`extension::Number`].
///
/// [`extension::Number`]: crate::domain::extension::Number
pub type ByContract = DatabaseQuery<By<Vec<Extension>, contract::Id>>;
