//! [`Extension`] read model definition.

use crate::domain::{Contract, Extension, Teacher};

/// Data of a [`Contract`] supplement formalizing an [`Extension`].
#[derive(Clone, Debug)]
pub struct Supplement {
    /// [`Contract`] being supplemented.
    pub contract: Contract,

    /// [`Teacher`] the [`Contract`] is signed with.
    pub teacher: Teacher,

    /// [`Extension`] being formalized.
    pub extension: Extension,
}
