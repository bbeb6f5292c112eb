//! [`Teacher`] read model definition.

#[cfg(doc)]
use crate::domain::Teacher;

pub mod list {
    //! [`Teacher`]s list definitions.

    use common::define_pagination;

    use crate::domain::{teacher, Teacher};

    define_pagination!(Teacher, Filter);

    /// Filter for [`Selector`].
    ///
    /// Soft-deleted [`Teacher`]s are never listed.
    #[derive(Clone, Debug, Default)]
    pub struct Filter {
        /// Name (or its part) to fuzzy search for.
        pub name: Option<teacher::NormalizedName>,
    }

    impl Filter {
        /// Checks whether the provided [`Teacher`] satisfies this [`Filter`].
        ///
        /// A [`Teacher`] matches the name if all its words are found in the
        /// [`teacher::NormalizedName`] in the same order.
        #[must_use]
        pub fn matches(&self, teacher: &Teacher) -> bool {
            teacher.deleted_at.is_none()
                && self.name.as_ref().map_or(true, |name| {
                    let mut rest = teacher.normalized_name.as_ref();
                    name.as_ref().split(' ').all(|word| {
                        rest.find(word).is_some_and(|at| {
                            rest = &rest[at + word.len()..];
                            true
                        })
                    })
                })
        }
    }
}
