//! [`Command`] for updating an existing [`Extension`].

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{contract, extension, Contract, Extension},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for updating an existing [`Extension`].
///
/// The [`extension::Number`] is kept, while the owning [`Contract`] is
/// re-derived out of its updated [`Extension`]s.
#[derive(Clone, Debug)]
pub struct UpdateExtension {
    /// ID of the [`Extension`] to be updated.
    pub extension_id: extension::Id,

    /// New date the [`Extension`] starts at.
    pub from_date: extension::FromDate,

    /// New date the [`Extension`] ends at.
    pub to_date: extension::ToDate,

    /// New reason of the [`Extension`].
    pub reason: extension::Reason,

    /// New notes about the [`Extension`].
    pub notes: Option<extension::Notes>,
}

impl<Db> Command<UpdateExtension> for Service<Db>
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
        > + Database<Insert<Extension>, Err = Traced<database::Error>>
        + Database<Insert<Contract>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Extension;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateExtension,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateExtension {
            extension_id,
            from_date,
            to_date,
            reason,
            notes,
        } = cmd;

        if !extension::is_valid_period(from_date, to_date) {
            return Err(tracerr::new!(E::InvalidPeriod {
                from: from_date,
                to: to_date,
            }));
        }

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
        // Could be deleted concurrently before the lock was acquired.
        let extension = extensions
            .iter_mut()
            .find(|e| e.id == extension_id)
            .ok_or(E::ExtensionNotExists(extension_id))
            .map_err(tracerr::wrap!())?;
        extension.from_date = from_date;
        extension.to_date = to_date;
        extension.reason = reason;
        extension.notes = notes;
        let extension = extension.clone();

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

/// Error of [`UpdateExtension`] [`Command`] execution.
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

    /// [`Extension`] doesn't end after it starts.
    #[display("`Extension` period `{from}..{to}` doesn't end after it starts")]
    InvalidPeriod {
        /// Date the [`Extension`] starts at.
        from: extension::FromDate,

        /// Date the [`Extension`] ends at.
        to: extension::ToDate,
    },
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{
            terminate_contract::Outcome, TerminateContract, UpdateExtension,
        },
        domain::{contract, extension, Extension},
        testing::{self, date},
        Command as _, Service,
    };

    use super::ExecutionError;

    fn update(ext: &Extension, from: &str, to: &str) -> UpdateExtension {
        UpdateExtension {
            extension_id: ext.id,
            from_date: date(from),
            to_date: date(to),
            reason: extension::Reason::new("Cambio de curso").unwrap(),
            notes: extension::Notes::new("Aprobado por el rector"),
        }
    }

    #[tokio::test]
    async fn updates_last_extension_and_contract_end() {
        let svc = Service::in_memory();
        let contract = testing::contract(&svc, "2024-12-31").await;
        let first =
            testing::extend(&svc, &contract, "2025-01-01", "2025-06-30").await;
        let second =
            testing::extend(&svc, &contract, "2025-07-01", "2025-12-31").await;

        let updated = svc
            .execute(update(&second, "2025-07-01", "2026-01-31"))
            .await
            .unwrap();

        assert_eq!(updated.number, second.number);
        assert_eq!(updated.reason.to_string(), "Cambio de curso");
        let contract = testing::reload(&svc, contract.id).await;
        assert_eq!(contract.end_date, date("2026-01-31"));
        assert_eq!(contract.status, contract::Status::Extended);

        _ = svc
            .execute(update(&first, "2025-01-01", "2025-05-31"))
            .await
            .unwrap();
        assert_eq!(
            testing::reload(&svc, contract.id).await.end_date,
            date("2026-01-31"),
        );
    }

    #[tokio::test]
    async fn rejects_non_increasing_period() {
        let svc = Service::in_memory();
        let contract = testing::contract(&svc, "2024-12-31").await;
        let ext =
            testing::extend(&svc, &contract, "2025-01-01", "2025-06-30").await;

        let err = svc
            .execute(update(&ext, "2025-06-30", "2025-06-30"))
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
        let ext =
            testing::extend(&svc, &contract, "2025-01-01", "2025-06-30").await;
        _ = svc
            .execute(TerminateContract {
                contract_id: contract.id,
                outcome: Outcome::Cancelled,
            })
            .await
            .unwrap();

        let err = svc
            .execute(update(&ext, "2025-01-01", "2025-09-30"))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::ContractTerminated {
                status: contract::Status::Cancelled,
                ..
            },
        ));
        assert_eq!(
            testing::reload(&svc, contract.id).await.end_date,
            date("2025-06-30"),
        );
    }

    #[tokio::test]
    async fn rejects_unknown_extension() {
        let svc = Service::in_memory();
        let contract = testing::contract(&svc, "2024-12-31").await;
        let mut ext =
            testing::extend(&svc, &contract, "2025-01-01", "2025-06-30").await;
        ext.id = extension::Id::new();

        let err = svc
            .execute(update(&ext, "2025-01-01", "2025-09-30"))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::ExtensionNotExists(_),
        ));
    }
}
