//! [`Query`] collection related to a single [`Extension`].

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{contract, extension, teacher, Contract, Extension, Teacher},
    infra::{database, Database},
    read, Query, Service,
};

use super::DatabaseQuery;

/// Queries an [`Extension`] by its [`extension::Id`].
pub type ById = DatabaseQuery<By<Option<Extension>, extension::Id>>;

/// [`Query`] collecting the data of a [`Contract`] supplement formalizing an
/// [`Extension`].
#[derive(Clone, Copy, Debug)]
pub struct Supplement {
    /// ID of the [`Extension`] to collect the supplement for.
    pub extension_id: extension::Id,
}

impl<Db> Query<Supplement> for Service<Db>
where
    Db: Database<
            Select<By<Option<Extension>, extension::Id>>,
            Ok = Option<Extension>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Contract>, contract::Id>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Teacher>, teacher::Id>>,
            Ok = Option<Teacher>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = read::extension::Supplement;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        Supplement { extension_id }: Supplement,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let extension = self
            .database()
            .execute(Select(By::<Option<Extension>, _>::new(extension_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ExtensionNotExists(extension_id))
            .map_err(tracerr::wrap!())?;

        let contract = self
            .database()
            .execute(Select(By::<Option<Contract>, _>::new(
                extension.contract_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ContractNotExists(extension.contract_id))
            .map_err(tracerr::wrap!())?;

        let teacher = self
            .database()
            .execute(Select(By::<Option<Teacher>, _>::new(contract.teacher_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::TeacherNotExists(contract.teacher_id))
            .map_err(tracerr::wrap!())?;

        Ok(read::extension::Supplement {
            contract,
            teacher,
            extension,
        })
    }
}

/// Error of [`Supplement`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Contract`] with the provided ID does not exist.
    #[display("`Contract(id: {_0})` does not exist")]
    ContractNotExists(#[error(not(source))] contract::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Extension`] with the provided ID does not exist.
    #[display("`Extension(id: {_0})` does not exist")]
    ExtensionNotExists(#[error(not(source))] extension::Id),

    /// [`Teacher`] with the provided ID does not exist.
    #[display("`Teacher(id: {_0})` does not exist")]
    TeacherNotExists(#[error(not(source))] teacher::Id),
}
