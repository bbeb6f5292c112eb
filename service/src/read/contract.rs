//! [`Contract`] read model definition.

#[cfg(doc)]
use crate::domain::Contract;

pub mod list {
    //! [`Contract`]s list definitions.

    use common::define_pagination;

    use crate::domain::{contract, teacher, Contract};
    #[cfg(doc)]
    use crate::domain::Teacher;

    define_pagination!(Contract, Filter);

    /// Filter for [`Selector`].
    ///
    /// Soft-deleted [`Contract`]s are never listed.
    #[derive(Clone, Debug, Default)]
    pub struct Filter {
        /// Destination [`contract::Country`] to filter by.
        pub country: Option<contract::Country>,

        /// [`contract::Status`] to filter by.
        pub status: Option<contract::Status>,

        /// ID of the [`Teacher`] to filter by.
        pub teacher_id: Option<teacher::Id>,
    }

    impl Filter {
        /// Checks whether the provided [`Contract`] satisfies this [`Filter`].
        #[must_use]
        pub fn matches(&self, contract: &Contract) -> bool {
            !contract.is_deleted()
                && self
                    .country
                    .as_ref()
                    .map_or(true, |c| *c == contract.country)
                && self.status.map_or(true, |s| s == contract.status)
                && self.teacher_id.map_or(true, |id| id == contract.teacher_id)
        }
    }
}
