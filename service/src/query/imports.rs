//! [`Query`] collection related to the multiple [`Import`]s.

use common::operations::By;

use crate::read;
#[cfg(doc)]
use crate::{domain::Import, Query};

use super::DatabaseQuery;

/// Queries a page of the [`Import`]s history of a user, most recent first.
pub type List =
    DatabaseQuery<By<read::import::list::Page, read::import::list::Selector>>;
