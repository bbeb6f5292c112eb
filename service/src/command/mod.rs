//! [`Command`] definition.

pub mod authorize_user_session;
pub mod create_contract;
pub mod create_extension;
pub mod create_teacher;
pub mod delete_contract;
pub mod delete_extension;
pub mod import_passports;
pub mod terminate_contract;
pub mod update_contract;
pub mod update_extension;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authorize_user_session::AuthorizeUserSession,
    create_contract::CreateContract, create_extension::CreateExtension,
    create_teacher::CreateTeacher, delete_contract::DeleteContract,
    delete_extension::DeleteExtension, import_passports::ImportPassports,
    terminate_contract::TerminateContract, update_contract::UpdateContract,
    update_extension::UpdateExtension,
};
