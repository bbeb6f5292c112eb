//! [`Query`] collection related to the multiple [`Passport`]s.

use common::operations::By;

use crate::domain::{teacher, Passport};
#[cfg(doc)]
use crate::{domain::Teacher, Query};

use super::DatabaseQuery;

/// Queries all [`Passport`]s of a [`Teacher`].
pub type ByTeacher = DatabaseQuery<By<Vec<Passport>, teacher::Id>>;
