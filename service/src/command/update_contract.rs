//! [`Command`] for updating an existing [`Contract`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::Teacher;
use crate::{
    domain::{contract, Contract, Extension},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for updating an existing [`Contract`].
///
/// Dates of a [`Contract`] may be changed only while it has no
/// [`Extension`]s.
#[derive(Clone, Debug)]
pub struct UpdateContract {
    /// ID of the [`Contract`] to be updated.
    pub contract_id: contract::Id,

    /// New destination [`contract::Country`].
    pub country: contract::Country,

    /// New date the [`Contract`] starts at.
    pub start_date: contract::StartDate,

    /// New date the [`Contract`] ends at (without [`Extension`]s).
    pub end_date: contract::EndDate,

    /// New [`contract::Function`] the [`Teacher`] performs.
    pub function: contract::Function,

    /// New [`contract::Workplace`] of the [`Teacher`].
    pub workplace: contract::Workplace,

    /// New salary of the [`Teacher`], if agreed.
    pub salary: Option<Money>,

    /// New notes about the [`Contract`].
    pub notes: Option<contract::Notes>,
}

impl<Db> Command<UpdateContract> for Service<Db>
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
        > + Database<Insert<Contract>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Contract;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateContract,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateContract {
            contract_id,
            country,
            start_date,
            end_date,
            function,
            workplace,
            salary,
            notes,
        } = cmd;

        if end_date.coerce::<()>() < start_date.coerce() {
            return Err(tracerr::new!(E::InvalidPeriod {
                start: start_date,
                end: end_date,
            }));
        }
        if let Some(salary) = salary.filter(|s| !s.is_positive()) {
            return Err(tracerr::new!(E::InvalidSalary(salary)));
        }

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

        let extensions = tx
            .execute(Select(By::<Vec<Extension>, _>::new(contract.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let dates_changed = contract.start_date != start_date
            || contract.base_end_date != end_date;
        if dates_changed && !extensions.is_empty() {
            return Err(tracerr::new!(E::DatesLocked(contract.id)));
        }

        contract.country = country;
        contract.start_date = start_date;
        contract.base_end_date = end_date;
        contract.function = function;
        contract.workplace = workplace;
        contract.salary = salary;
        contract.notes = notes;
        contract.apply_extensions(&extensions);

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

/// Error of [`UpdateContract`] [`Command`] execution.
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

    /// Dates of an extended [`Contract`] cannot be changed.
    #[display("`Contract(id: {_0})` has extensions, so its dates are locked")]
    DatesLocked(#[error(not(source))] contract::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Contract`] ends before it starts.
    #[display("`Contract` period `{start}..{end}` ends before it starts")]
    InvalidPeriod {
        /// Date the [`Contract`] starts at.
        start: contract::StartDate,

        /// Date the [`Contract`] ends at.
        end: contract::EndDate,
    },

    /// Salary is not a positive amount.
    #[display("`{_0}` salary is not positive")]
    InvalidSalary(#[error(not(source))] Money),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{
            terminate_contract::Outcome, TerminateContract, UpdateContract,
        },
        domain::{contract, Contract},
        testing::{self, date},
        Command as _, Service,
    };

    use super::ExecutionError;

    fn update(contract: &Contract, start: &str, end: &str) -> UpdateContract {
        UpdateContract {
            contract_id: contract.id,
            country: contract::Country::new("NI").unwrap(),
            start_date: date(start),
            end_date: date(end),
            function: contract.function.clone(),
            workplace: contract::Workplace::new("Escuela Normal de Managua")
                .unwrap(),
            salary: None,
            notes: contract::Notes::new("Cambio de destino"),
        }
    }

    #[tokio::test]
    async fn updates_fields_and_dates() {
        let svc = Service::in_memory();
        let contract = testing::contract(&svc, "2024-12-31").await;

        let updated = svc
            .execute(update(&contract, "2024-02-01", "2025-01-31"))
            .await
            .unwrap();

        assert_eq!(updated.country.to_string(), "NI");
        assert_eq!(updated.number, contract.number);
        assert_eq!(updated.year, contract.year);
        let stored = testing::reload(&svc, contract.id).await;
        assert_eq!(stored.end_date, date("2025-01-31"));
        assert_eq!(stored.base_end_date, date("2025-01-31"));
        assert_eq!(stored.status, contract::Status::Active);
        assert_eq!(
            stored.workplace.to_string(),
            "Escuela Normal de Managua",
        );
    }

    #[tokio::test]
    async fn keeps_extended_end_date() {
        let svc = Service::in_memory();
        let contract = testing::contract(&svc, "2024-12-31").await;
        _ = testing::extend(&svc, &contract, "2025-01-01", "2025-06-30").await;

        _ = svc
            .execute(update(&contract, "2024-01-01", "2024-12-31"))
            .await
            .unwrap();

        let stored = testing::reload(&svc, contract.id).await;
        assert_eq!(stored.end_date, date("2025-06-30"));
        assert_eq!(stored.status, contract::Status::Extended);
        assert_eq!(stored.country.to_string(), "NI");
    }

    #[tokio::test]
    async fn locks_dates_of_extended_contract() {
        let svc = Service::in_memory();
        let contract = testing::contract(&svc, "2024-12-31").await;
        _ = testing::extend(&svc, &contract, "2025-01-01", "2025-06-30").await;

        let err = svc
            .execute(update(&contract, "2024-01-01", "2024-11-30"))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::DatesLocked(_)));
    }

    #[tokio::test]
    async fn rejects_end_before_start() {
        let svc = Service::in_memory();
        let contract = testing::contract(&svc, "2024-12-31").await;

        let err = svc
            .execute(update(&contract, "2024-06-01", "2024-05-31"))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidPeriod { .. },
        ));
    }

    #[tokio::test]
    async fn rejects_terminated_contract() {
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
            .execute(update(&contract, "2024-01-01", "2024-12-31"))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::ContractTerminated { .. },
        ));
    }
}
