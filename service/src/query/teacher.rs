//! [`Query`] collection related to a single [`Teacher`].

use common::operations::By;

use crate::domain::{teacher, Teacher};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a non-deleted [`Teacher`] by its [`teacher::Id`].
pub type ById = DatabaseQuery<By<Option<Teacher>, teacher::Id>>;
