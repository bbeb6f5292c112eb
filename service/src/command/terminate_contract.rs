//! [`Command`] for closing or cancelling a [`Contract`].

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{contract, Contract},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for closing or cancelling a [`Contract`].
///
/// Terminated [`Contract`]s keep their [`Extension`]s, but don't accept any
/// further changes of them.
///
/// [`Extension`]: crate::domain::Extension
#[derive(Clone, Copy, Debug)]
pub struct TerminateContract {
    /// ID of the [`Contract`] to be terminated.
    pub contract_id: contract::Id,

    /// [`Outcome`] of the termination.
    pub outcome: Outcome,
}

/// Way a [`Contract`] is terminated.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// [`Contract`] is fulfilled.
    Closed,

    /// [`Contract`] is aborted before being fulfilled.
    Cancelled,
}

impl From<Outcome> for contract::Status {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Closed => Self::Closed,
            Outcome::Cancelled => Self::Cancelled,
        }
    }
}

impl<Db> Command<TerminateContract> for Service<Db>
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
    type Ok = Contract;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: TerminateContract,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let TerminateContract {
            contract_id,
            outcome,
        } = cmd;

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
            return Err(tracerr::new!(E::ContractAlreadyTerminated {
                id: contract.id,
                status: contract.status,
            }));
        }

        contract.status = outcome.into();

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

/// Error of [`TerminateContract`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Contract`] is closed or cancelled already.
    #[display("`Contract(id: {id})` is {status} already")]
    ContractAlreadyTerminated {
        /// ID of the terminated [`Contract`].
        id: contract::Id,

        /// [`contract::Status`] of the terminated [`Contract`].
        status: contract::Status,
    },

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
    use crate::{
        command::TerminateContract,
        domain::contract,
        testing::{self, date},
        Command as _, Service,
    };

    use super::{ExecutionError, Outcome};

    #[tokio::test]
    async fn closes_extended_contract_keeping_end_date() {
        let svc = Service::in_memory();
        let contract = testing::contract(&svc, "2024-12-31").await;
        _ = testing::extend(&svc, &contract, "2025-01-01", "2025-06-30").await;

        let closed = svc
            .execute(TerminateContract {
                contract_id: contract.id,
                outcome: Outcome::Closed,
            })
            .await
            .unwrap();

        assert_eq!(closed.status, contract::Status::Closed);
        let contract = testing::reload(&svc, contract.id).await;
        assert_eq!(contract.status, contract::Status::Closed);
        assert_eq!(contract.end_date, date("2025-06-30"));
    }

    #[tokio::test]
    async fn rejects_terminating_twice() {
        let svc = Service::in_memory();
        let contract = testing::contract(&svc, "2024-12-31").await;
        _ = svc
            .execute(TerminateContract {
                contract_id: contract.id,
                outcome: Outcome::Cancelled,
            })
            .await
            .unwrap();

        let err = svc
            .execute(TerminateContract {
                contract_id: contract.id,
                outcome: Outcome::Closed,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::ContractAlreadyTerminated {
                status: contract::Status::Cancelled,
                ..
            },
        ));
        assert_eq!(
            testing::reload(&svc, contract.id).await.status,
            contract::Status::Cancelled,
        );
    }

    #[tokio::test]
    async fn rejects_unknown_contract() {
        let svc = Service::in_memory();

        let err = svc
            .execute(TerminateContract {
                contract_id: contract::Id::new(),
                outcome: Outcome::Closed,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::ContractNotExists(_),
        ));
    }
}
