//! [`Command`] for deleting the last [`Extension`] of a [`Contract`].

use common::operations::{
    By, Commit, Delete, Insert, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{contract, extension, Contract, Extension},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting the last [`Extension`] of a [`Contract`].
///
/// [`Extension`]s are deleted in the reverse order of their creation, and the
/// [`Contract`] is rolled back to its previous end date.
#[derive(Clone, Copy, Debug)]
pub struct DeleteExtension {
    /// ID of the [`Extension`] to be deleted.
    pub extension_id: extension::Id,
}

impl<Db> Command<DeleteExtension> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Extension>, extension::Id>>,
            Ok = Option<Extension>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<Contract, contract::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Contract>, contract::Id>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Extension>, contract::Id>>,
            Ok = Vec<Extension>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Extension, extension::Id>>,
            Err = Traced<database::Error>,
        > + Database<Insert<Contract>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Contract;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteExtension,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteExtension { extension_id } = cmd;

        let contract_id = self
            .database()
            .execute(Select(By::<Option<Extension>, _>::new(extension_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ExtensionNotExists(extension_id))
            .map_err(tracerr::wrap!())?
            .contract_id;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut contract = tx
            .execute(Select(By::<Option<Contract>, _>::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ContractNotExists(contract_id))
            .map_err(tracerr::wrap!())?;
        if contract.is_terminated() {
            return Err(tracerr::new!(E::ContractTerminated {
                id: contract.id,
                status: contract.status,
            }));
        }

        let mut extensions = tx
            .execute(Select(By::<Vec<Extension>, _>::new(contract.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let extension = extensions
            .iter()
            .find(|e| e.id == extension_id)
            .ok_or(E::ExtensionNotExists(extension_id))
            .map_err(tracerr::wrap!())?;
        if let Some(last) = extensions.iter().max_by_key(|e| e.number) {
            if last.number != extension.number {
                return Err(tracerr::new!(E::NotLastExtension {
                    id: extension_id,
                    last: last.number,
                }));
            }
        }

        extensions.retain(|e| e.id != extension_id);
        contract.apply_extensions(&extensions);

        tx.execute(Delete(By::<Extension, _>::new(extension_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Insert(contract.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(contract)
    }
}

/// Error of [`DeleteExtension`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Contract`] with the provided ID does not exist.
    #[display("`Contract(id: {_0})` does not exist")]
    ContractNotExists(#[error(not(source))] contract::Id),

    /// [`Contract`] is closed or cancelled.
    #[display("`Contract(id: {id})` is {status}")]
    ContractTerminated {
        /// ID of the terminated [`Contract`].
        id: contract::Id,

        /// [`contract::Status`] of the terminated [`Contract`].
        status: contract::Status,
    },

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Extension`] with the provided ID does not exist.
    #[display("`Extension(id: {_0})` does not exist")]
    ExtensionNotExists(#[error(not(source))] extension::Id),

    /// [`Extension`] is not the last one of its [`Contract`].
    #[display("`Extension(id: {id})` is not the last one (#{last} is)")]
    NotLastExtension {
        /// ID of the [`Extension`] requested to be deleted.
        id: extension::Id,

        /// [`extension::Number`] of the last [`Extension`].
        last: extension::Number,
    },
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select};

    use crate::{
        command::{
            terminate_contract::Outcome, DeleteExtension, TerminateContract,
        },
        domain::{contract, extension, Extension},
        infra::Database as _,
        testing::{self, date},
        Service,
    };

    use super::ExecutionError;

    #[tokio::test]
    async fn deleting_sole_extension_restores_base_end_date() {
        let svc = Service::in_memory();
        let contract = testing::contract(&svc, "2024-12-31").await;
        let ext =
            testing::extend(&svc, &contract, "2025-01-01", "2025-06-30").await;

        let updated = svc
            .execute(DeleteExtension {
                extension_id: ext.id,
            })
            .await
            .unwrap();

        assert_eq!(updated.end_date, date("2024-12-31"));
        assert_eq!(updated.status, contract::Status::Active);
        let contract = testing::reload(&svc, contract.id).await;
        assert_eq!(contract.end_date, date("2024-12-31"));
        assert_eq!(contract.status, contract::Status::Active);
    }

    #[tokio::test]
    async fn full_extension_lifecycle() {
        let svc = Service::in_memory();
        let contract = testing::contract(&svc, "2024-12-31").await;

        let first =
            testing::extend(&svc, &contract, "2025-01-01", "2025-06-30").await;
        assert_eq!(first.number, extension::Number::new(1).unwrap());
        let reloaded = testing::reload(&svc, contract.id).await;
        assert_eq!(reloaded.end_date, date("2025-06-30"));
        assert_eq!(reloaded.status, contract::Status::Extended);

        let second =
            testing::extend(&svc, &contract, "2025-07-01", "2025-12-31").await;
        assert_eq!(second.number, extension::Number::new(2).unwrap());
        assert_eq!(
            testing::reload(&svc, contract.id).await.end_date,
            date("2025-12-31"),
        );

        let err = svc
            .execute(DeleteExtension {
                extension_id: first.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::NotLastExtension { .. },
        ));
        assert_eq!(
            testing::reload(&svc, contract.id).await.end_date,
            date("2025-12-31"),
        );

        _ = svc
            .execute(DeleteExtension {
                extension_id: second.id,
            })
            .await
            .unwrap();
        let reloaded = testing::reload(&svc, contract.id).await;
        assert_eq!(reloaded.end_date, date("2025-06-30"));
        assert_eq!(reloaded.status, contract::Status::Extended);

        let remaining = svc
            .database()
            .execute(Select(By::<Vec<Extension>, _>::new(contract.id)))
            .await
            .unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, first.id);
    }

    #[tokio::test]
    async fn rejects_terminated_contract() {
        let svc = Service::in_memory();
        let contract = testing::contract(&svc, "2024-12-31").await;
        let ext =
            testing::extend(&svc, &contract, "2025-01-01", "2025-06-30").await;
        _ = svc
            .execute(TerminateContract {
                contract_id: contract.id,
                outcome: Outcome::Closed,
            })
            .await
            .unwrap();

        let err = svc
            .execute(DeleteExtension {
                extension_id: ext.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::ContractTerminated {
                status: contract::Status::Closed,
                ..
            },
        ));
        assert_eq!(
            svc.database()
                .execute(Select(By::<Vec<Extension>, _>::new(contract.id)))
                .await
                .unwrap()
                .len(),
            1,
        );
    }

    #[tokio::test]
    async fn rejects_unknown_extension() {
        let svc = Service::in_memory();

        let err = svc
            .execute(DeleteExtension {
                extension_id: extension::Id::new(),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::ExtensionNotExists(_),
        ));
    }
}
