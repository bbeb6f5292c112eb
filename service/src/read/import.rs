//! [`Import`] read model definition.

#[cfg(doc)]
use crate::domain::Import;

pub mod list {
    //! [`Import`]s history definitions.

    use common::define_pagination;

    use crate::domain::{user, Import};

    define_pagination!(Import, Filter);

    /// Filter for [`Selector`].
    #[derive(Clone, Copy, Debug)]
    pub struct Filter {
        /// ID of the [`User`] who performed the [`Import`]s.
        ///
        /// [`User`]: crate::domain::user::User
        pub user_id: user::Id,
    }
}
