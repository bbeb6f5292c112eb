//! Read entities definitions.

pub mod contract;
pub mod extension;
pub mod import;
pub mod teacher;
