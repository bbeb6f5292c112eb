//! [`Command`] for creating a new [`Teacher`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{teacher, Teacher},
    infra::{database, Database},
    Service,
};

use super::Command;

/// Name of the unique constraint on [`teacher::IdentityCard`]s.
const IDENTITY_CARD_CONSTRAINT: &str = "teachers_identity_card_key";

/// [`Command`] for creating a new [`Teacher`].
#[derive(Clone, Debug)]
pub struct CreateTeacher {
    /// [`teacher::FullName`] of a new [`Teacher`].
    pub full_name: teacher::FullName,

    /// [`teacher::IdentityCard`] of a new [`Teacher`].
    pub identity_card: teacher::IdentityCard,
}

impl<Db> Command<CreateTeacher> for Service<Db>
where
    Db: Database<
            Select<By<Option<Teacher>, teacher::IdentityCard>>,
            Ok = Option<Teacher>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Teacher>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Teacher;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateTeacher,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateTeacher {
            full_name,
            identity_card,
        } = cmd;

        let existing = self
            .database()
            .execute(Select(By::<Option<Teacher>, _>::new(
                identity_card.clone(),
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if existing.is_some() {
            return Err(tracerr::new!(E::IdentityCardOccupied(identity_card)));
        }

        let teacher = Teacher {
            id: teacher::Id::new(),
            normalized_name: teacher::NormalizedName::from(&full_name),
            full_name,
            identity_card,
            created_at: DateTime::now().coerce(),
            deleted_at: None,
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let inserted = tx.execute(Insert(teacher.clone())).await;
        // Concurrent registration of the same card.
        if let Err(e) = &inserted {
            if e.as_ref().is_unique_violation(Some(IDENTITY_CARD_CONSTRAINT)) {
                return Err(tracerr::new!(E::IdentityCardOccupied(
                    teacher.identity_card,
                )));
            }
        }
        inserted
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(teacher)
    }
}

/// Error of [`CreateTeacher`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`teacher::IdentityCard`] is registered for another [`Teacher`].
    #[display("`{_0}` identity card is occupied")]
    IdentityCardOccupied(#[error(not(source))] teacher::IdentityCard),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::CreateTeacher,
        domain::teacher,
        Command as _, Service,
    };

    use super::ExecutionError;

    fn teacher(name: &str, card: &str) -> CreateTeacher {
        CreateTeacher {
            full_name: teacher::FullName::new(name).unwrap(),
            identity_card: teacher::IdentityCard::new(card).unwrap(),
        }
    }

    #[tokio::test]
    async fn creates_teacher_with_normalized_name() {
        let svc = Service::in_memory();

        let created = svc
            .execute(teacher("Raúl  Núñez", "79122312345"))
            .await
            .unwrap();

        assert_eq!(created.full_name.to_string(), "Raúl  Núñez");
        assert_eq!(created.normalized_name.as_ref(), "raul nunez");
        assert_eq!(created.identity_card.to_string(), "79122312345");
    }

    #[tokio::test]
    async fn rejects_occupied_identity_card() {
        let svc = Service::in_memory();
        _ = svc
            .execute(teacher("Raúl Núñez", "79122312345"))
            .await
            .unwrap();

        let err = svc
            .execute(teacher("Otro Profesor", "79122312345"))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::IdentityCardOccupied(_),
        ));
    }
}
