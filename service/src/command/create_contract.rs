//! [`Command`] for creating a new [`Contract`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{contract, teacher, Contract, Teacher},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Contract`] of a [`Teacher`].
#[derive(Clone, Debug)]
pub struct CreateContract {
    /// ID of the contracted [`Teacher`].
    pub teacher_id: teacher::Id,

    /// Destination [`contract::Country`] of a new [`Contract`].
    pub country: contract::Country,

    /// Date a new [`Contract`] starts at.
    pub start_date: contract::StartDate,

    /// Date a new [`Contract`] ends at.
    pub end_date: contract::EndDate,

    /// [`contract::Function`] the [`Teacher`] performs.
    pub function: contract::Function,

    /// [`contract::Workplace`] of the [`Teacher`].
    pub workplace: contract::Workplace,

    /// Salary of the [`Teacher`], if agreed.
    pub salary: Option<Money>,

    /// Notes about a new [`Contract`].
    pub notes: Option<contract::Notes>,
}

impl<Db> Command<CreateContract> for Service<Db>
where
    Db: Database<
            Select<By<Option<Teacher>, teacher::Id>>,
            Ok = Option<Teacher>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Contract, contract::Year>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<contract::Number>, contract::Year>>,
            Ok = Option<contract::Number>,
            Err = Traced<database::Error>,
        > + Database<Insert<Contract>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Contract;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateContract,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateContract {
            teacher_id,
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

        self.database()
            .execute(Select(By::<Option<Teacher>, _>::new(teacher_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::TeacherNotExists(teacher_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let year = contract::Year::from(start_date);

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Numbers are consecutive within a year.
        tx.execute(Lock(By::new(year)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        let number = tx
            .execute(Select(By::<Option<contract::Number>, _>::new(year)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .map_or(contract::Number::FIRST, contract::Number::next);

        let contract = Contract {
            id: contract::Id::new(),
            number,
            year,
            teacher_id,
            country,
            start_date,
            end_date,
            base_end_date: end_date,
            function,
            workplace,
            salary,
            status: contract::Status::Active,
            notes,
            created_at: DateTime::now().coerce(),
            deleted_at: None,
        };

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

/// Error of [`CreateContract`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
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

    /// [`Teacher`] with the provided ID does not exist.
    #[display("`Teacher(id: {_0})` does not exist")]
    TeacherNotExists(#[error(not(source))] teacher::Id),
}

#[cfg(test)]
mod spec {
    use common::Money;

    use crate::{
        command::CreateContract,
        domain::{contract, teacher},
        testing::{self, date},
        Command as _, Service,
    };

    use super::ExecutionError;

    fn contract(
        teacher_id: teacher::Id,
        start: &str,
        end: &str,
    ) -> CreateContract {
        CreateContract {
            teacher_id,
            country: contract::Country::new("bo").unwrap(),
            start_date: date(start),
            end_date: date(end),
            function: contract::Function::new("Asesor pedagógico").unwrap(),
            workplace: contract::Workplace::new("Ministerio de Educación")
                .unwrap(),
            salary: Some("1500.50USD".parse().unwrap()),
            notes: None,
        }
    }

    #[tokio::test]
    async fn creates_active_contract() {
        let svc = Service::in_memory();
        let teacher = testing::teacher(&svc, "Ana Rodríguez").await;

        let created = svc
            .execute(contract(teacher.id, "2024-03-01", "2025-02-28"))
            .await
            .unwrap();

        assert_eq!(created.status, contract::Status::Active);
        assert_eq!(created.end_date, date("2025-02-28"));
        assert_eq!(created.base_end_date, created.end_date);
        assert_eq!(created.year, contract::Year::from(2024));
        assert_eq!(created.number, contract::Number::FIRST);
        assert_eq!(created.country.to_string(), "BO");
        let stored = testing::reload(&svc, created.id).await;
        assert_eq!(stored.teacher_id, teacher.id);
    }

    #[tokio::test]
    async fn numbers_contracts_per_year() {
        let svc = Service::in_memory();
        let teacher = testing::teacher(&svc, "Ana Rodríguez").await;

        let mut numbers = vec![];
        for (start, end) in [
            ("2024-03-01", "2025-02-28"),
            ("2024-09-01", "2025-08-31"),
            ("2025-01-15", "2026-01-14"),
            ("2024-11-01", "2025-10-31"),
        ] {
            let c = svc
                .execute(contract(teacher.id, start, end))
                .await
                .unwrap();
            numbers.push((i32::from(c.year), i32::from(c.number)));
        }

        assert_eq!(numbers, [(2024, 1), (2024, 2), (2025, 1), (2024, 3)]);
    }

    #[tokio::test]
    async fn allows_single_day_contract() {
        let svc = Service::in_memory();
        let teacher = testing::teacher(&svc, "Ana Rodríguez").await;

        assert!(svc
            .execute(contract(teacher.id, "2024-03-01", "2024-03-01"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn rejects_end_before_start() {
        let svc = Service::in_memory();
        let teacher = testing::teacher(&svc, "Ana Rodríguez").await;

        let err = svc
            .execute(contract(teacher.id, "2024-03-01", "2024-02-29"))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidPeriod { .. },
        ));
    }

    #[tokio::test]
    async fn rejects_non_positive_salary() {
        let svc = Service::in_memory();
        let teacher = testing::teacher(&svc, "Ana Rodríguez").await;
        let mut cmd = contract(teacher.id, "2024-03-01", "2025-02-28");
        cmd.salary = Some("0EUR".parse::<Money>().unwrap());

        let err = svc.execute(cmd).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::InvalidSalary(_)));
    }

    #[tokio::test]
    async fn rejects_unknown_teacher() {
        let svc = Service::in_memory();

        let err = svc
            .execute(contract(teacher::Id::new(), "2024-03-01", "2025-02-28"))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::TeacherNotExists(_),
        ));
    }
}
