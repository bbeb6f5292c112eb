//! [`Command`] for deleting a [`Contract`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{contract, Contract},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for soft-deleting a [`Contract`].
///
/// Deleted [`Contract`]s are treated as non-existent by every other
/// [`Command`] and [`Query`], while their [`contract::Number`]s are never
/// reused.
///
/// [`Query`]: crate::Query
#[derive(Clone, Copy, Debug)]
pub struct DeleteContract {
    /// ID of the [`Contract`] to be deleted.
    pub contract_id: contract::Id,
}

impl<Db> Command<DeleteContract> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Contract, contract::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Contract>, contract::Id>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        > + Database<Insert<Contract>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteContract,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteContract { contract_id } = cmd;

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
        contract.deleted_at = Some(DateTime::now().coerce());

        tx.execute(Insert(contract))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)
    }
}

/// Error of [`DeleteContract`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Contract`] with the provided ID does not exist.
    #[display("`Contract(id: {_0})` does not exist")]
    ContractNotExists(#[error(not(source))] contract::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select};

    use crate::{
        command::{create_extension, CreateExtension, DeleteContract},
        domain::{contract, extension, user, Contract},
        infra::Database as _,
        testing::{self, date},
        Service,
    };

    use super::ExecutionError;

    #[tokio::test]
    async fn deleted_contract_behaves_as_missing() {
        let svc = Service::in_memory();
        let contract = testing::contract(&svc, "2024-12-31").await;

        svc.execute(DeleteContract {
            contract_id: contract.id,
        })
        .await
        .unwrap();

        assert!(svc
            .database()
            .execute(Select(By::<Option<Contract>, _>::new(contract.id)))
            .await
            .unwrap()
            .is_none());

        let err = svc
            .execute(CreateExtension {
                contract_id: contract.id,
                from_date: date("2025-01-01"),
                to_date: date("2025-06-30"),
                reason: extension::Reason::new("Necesidad docente").unwrap(),
                notes: None,
                initiator_id: user::Id::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            create_extension::ExecutionError::ContractNotExists(_),
        ));

        let err = svc
            .execute(DeleteContract {
                contract_id: contract.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::ContractNotExists(_),
        ));
    }

    #[tokio::test]
    async fn numbers_of_deleted_contracts_are_not_reused() {
        let svc = Service::in_memory();
        let first = testing::contract(&svc, "2024-12-31").await;
        svc.execute(DeleteContract {
            contract_id: first.id,
        })
        .await
        .unwrap();

        let second = testing::contract(&svc, "2024-12-31").await;

        assert_eq!(first.number, contract::Number::FIRST);
        assert_eq!(second.number, contract::Number::FIRST.next());
    }
}
