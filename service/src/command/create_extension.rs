//! [`Command`] for creating a new [`Extension`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::User;
use crate::{
    domain::{contract, extension, user, Contract, Extension},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Extension`] of a [`Contract`].
#[derive(Clone, Debug)]
pub struct CreateExtension {
    /// ID of the [`Contract`] to be extended.
    pub contract_id: contract::Id,

    /// Date the new [`Extension`] starts at.
    pub from_date: extension::FromDate,

    /// Date the new [`Extension`] ends at.
    pub to_date: extension::ToDate,

    /// Reason of the new [`Extension`].
    pub reason: extension::Reason,

    /// Notes about the new [`Extension`].
    pub notes: Option<extension::Notes>,

    /// ID of the [`User`] who registers the [`Extension`].
    pub initiator_id: user::Id,
}

impl<Db> Command<CreateExtension> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
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
        > + Database<Insert<Extension>, Err = Traced<database::Error>>
        + Database<Insert<Contract>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Extension;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateExtension,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateExtension {
            contract_id,
            from_date,
            to_date,
            reason,
            notes,
            initiator_id,
        } = cmd;

        if !extension::is_valid_period(from_date, to_date) {
            return Err(tracerr::new!(E::InvalidPeriod {
                from: from_date,
                to: to_date,
            }));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent numbering of `Extension`s.
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
        if from_date.coerce::<()>() < contract.end_date.coerce() {
            return Err(tracerr::new!(E::StartsBeforeContractEnd {
                from: from_date,
                end: contract.end_date,
            }));
        }

        let mut extensions = tx
            .execute(Select(By::<Vec<Extension>, _>::new(contract.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let extension = Extension {
            id: extension::Id::new(),
            contract_id: contract.id,
            number: extension::Number::after(extensions.len()),
            from_date,
            to_date,
            reason,
            notes,
            created_by: initiator_id,
            created_at: DateTime::now().coerce(),
        };
        extensions.push(extension.clone());
        contract.apply_extensions(&extensions);

        tx.execute(Insert(extension.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Insert(contract))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(extension)
    }
}

/// Error of [`CreateExtension`] [`Command`] execution.
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

    /// [`Extension`] doesn't end after it starts.
    #[display("`Extension` period `{from}..{to}` doesn't end after it starts")]
    InvalidPeriod {
        /// Date the [`Extension`] starts at.
        from: extension::FromDate,

        /// Date the [`Extension`] ends at.
        to: extension::ToDate,
    },

    /// [`Extension`] starts before the current end of its [`Contract`].
    #[display("`Extension` starts at `{from}` before `Contract` end `{end}`")]
    StartsBeforeContractEnd {
        /// Date the [`Extension`] starts at.
        from: extension::FromDate,

        /// Date the [`Contract`] currently ends at.
        end: contract::EndDate,
    },
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select};

    use crate::{
        command::{
            terminate_contract::Outcome, CreateExtension, TerminateContract,
        },
        domain::{contract, extension, user, Contract, Extension},
        infra::Database as _,
        testing::{self, date},
        Service,
    };

    use super::ExecutionError;

    fn extension(
        contract: &Contract,
        from: &str,
        to: &str,
    ) -> CreateExtension {
        CreateExtension {
            contract_id: contract.id,
            from_date: date(from),
            to_date: date(to),
            reason: extension::Reason::new("Necesidad docente").unwrap(),
            notes: None,
            initiator_id: user::Id::new(),
        }
    }

    #[tokio::test]
    async fn extends_contract() {
        let svc = Service::in_memory();
        let contract = testing::contract(&svc, "2024-12-31").await;

        let ext = svc
            .execute(extension(&contract, "2025-01-01", "2025-06-30"))
            .await
            .unwrap();

        assert_eq!(ext.number, extension::Number::new(1).unwrap());
        let contract = testing::reload(&svc, contract.id).await;
        assert_eq!(contract.end_date, date("2025-06-30"));
        assert_eq!(contract.status, contract::Status::Extended);
        assert_eq!(contract.base_end_date, date("2024-12-31"));
    }

    #[tokio::test]
    async fn numbers_extensions_contiguously() {
        let svc = Service::in_memory();
        let contract = testing::contract(&svc, "2024-12-31").await;

        let first = svc
            .execute(extension(&contract, "2025-01-01", "2025-06-30"))
            .await
            .unwrap();
        let second = svc
            .execute(extension(&contract, "2025-07-01", "2025-12-31"))
            .await
            .unwrap();
        let third = svc
            .execute(extension(&contract, "2025-12-31", "2026-03-31"))
            .await
            .unwrap();

        let numbers = [first.number, second.number, third.number];
        assert_eq!(
            numbers,
            [1, 2, 3].map(|n| extension::Number::new(n).unwrap()),
        );
        let stored = svc
            .database()
            .execute(Select(By::<Vec<Extension>, _>::new(contract.id)))
            .await
            .unwrap();
        assert_eq!(
            stored.iter().map(|e| e.number).collect::<Vec<_>>(),
            numbers,
        );
        assert_eq!(
            testing::reload(&svc, contract.id).await.end_date,
            date("2026-03-31"),
        );
    }

    #[tokio::test]
    async fn allows_start_at_contract_end() {
        let svc = Service::in_memory();
        let contract = testing::contract(&svc, "2024-12-31").await;

        assert!(svc
            .execute(extension(&contract, "2024-12-31", "2025-06-30"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn rejects_start_before_contract_end() {
        let svc = Service::in_memory();
        let contract = testing::contract(&svc, "2024-12-31").await;

        let err = svc
            .execute(extension(&contract, "2024-12-30", "2025-06-30"))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::StartsBeforeContractEnd { .. },
        ));
        let contract = testing::reload(&svc, contract.id).await;
        assert_eq!(contract.status, contract::Status::Active);
    }

    #[tokio::test]
    async fn rejects_non_increasing_period() {
        let svc = Service::in_memory();
        let contract = testing::contract(&svc, "2024-12-31").await;

        for (from, to) in
            [("2025-01-01", "2025-01-01"), ("2025-06-30", "2025-01-01")]
        {
            let err = svc
                .execute(extension(&contract, from, to))
                .await
                .unwrap_err();

            assert!(matches!(
                err.as_ref(),
                ExecutionError::InvalidPeriod { .. },
            ));
        }
    }

    #[tokio::test]
    async fn rejects_non_increasing_period_of_terminated_contract() {
        let svc = Service::in_memory();
        let contract = testing::contract(&svc, "2024-12-31").await;
        _ = svc
            .execute(TerminateContract {
                contract_id: contract.id,
                outcome: Outcome::Closed,
            })
            .await
            .unwrap();

        let err = svc
            .execute(extension(&contract, "2025-06-30", "2025-01-01"))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidPeriod { .. },
        ));
    }

    #[tokio::test]
    async fn rejects_terminated_contract() {
        for outcome in [Outcome::Closed, Outcome::Cancelled] {
            let svc = Service::in_memory();
            let contract = testing::contract(&svc, "2024-12-31").await;
            _ = svc
                .execute(TerminateContract {
                    contract_id: contract.id,
                    outcome,
                })
                .await
                .unwrap();
            let status = contract::Status::from(outcome);

            let err = svc
                .execute(extension(&contract, "2025-01-01", "2025-06-30"))
                .await
                .unwrap_err();

            assert!(matches!(
                err.as_ref(),
                ExecutionError::ContractTerminated { status: s, .. }
                    if *s == status,
            ));
            assert!(svc
                .database()
                .execute(Select(By::<Vec<Extension>, _>::new(contract.id)))
                .await
                .unwrap()
                .is_empty());
        }
    }

    #[tokio::test]
    async fn rejects_unknown_contract() {
        let svc = Service::in_memory();
        let contract = testing::contract(&svc, "2024-12-31").await;
        let mut cmd = extension(&contract, "2025-01-01", "2025-06-30");
        cmd.contract_id = contract::Id::new();

        let err = svc.execute(cmd).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::ContractNotExists(_),
        ));
    }
}
