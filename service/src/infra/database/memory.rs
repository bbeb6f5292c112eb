//! In-memory [`Database`] implementation.
//!
//! Intended for tests and local experiments: all the data is lost once the
//! last [`Memory`] clone is dropped.

use std::{cmp::Reverse, collections::HashMap, sync::Arc};

use common::operations::{By, Commit, Delete, Insert, Lock, Select, Transact};
use tokio::sync::{Mutex, MutexGuard};
use tracerr::Traced;
use uuid::Uuid;

use crate::{
    domain::{
        contract, extension, passport, teacher, Contract, Extension,
        Import, Passport, Teacher,
    },
    infra::{database, Database},
    read,
};

/// In-memory [`Database`].
///
/// [`Transact`]ing it stages a copy of the whole data, which replaces the
/// committed data on [`Commit`]. Dropping a transacted [`Memory`] without
/// [`Commit`]ting discards every staged change.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// Committed data.
    committed: Arc<Mutex<State>>,

    /// Data staged by the current transaction, if any.
    staged: Option<Arc<Mutex<State>>>,
}

/// Data stored in a [`Memory`] [`Database`].
#[derive(Clone, Debug, Default)]
struct State {
    /// Stored [`Contract`]s.
    contracts: HashMap<contract::Id, Contract>,

    /// Stored [`Extension`]s.
    extensions: HashMap<extension::Id, Extension>,

    /// Stored [`Teacher`]s.
    teachers: HashMap<teacher::Id, Teacher>,

    /// Stored [`Passport`]s.
    passports: HashMap<passport::Id, Passport>,

    /// Stored [`Import`]s in insertion order.
    imports: Vec<Import>,
}

impl Memory {
    /// Locks the [`State`] visible to this [`Memory`] client.
    async fn state(&self) -> MutexGuard<'_, State> {
        self.staged
            .as_ref()
            .unwrap_or(&self.committed)
            .lock()
            .await
    }
}

impl Database<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        if self.staged.is_some() {
            return Ok(self.clone());
        }
        let snapshot = self.committed.lock().await.clone();
        Ok(Self {
            committed: Arc::clone(&self.committed),
            staged: Some(Arc::new(Mutex::new(snapshot))),
        })
    }
}

impl Database<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        if let Some(staged) = &self.staged {
            let state = staged.lock().await.clone();
            *self.committed.lock().await = state;
        }
        Ok(())
    }
}

impl Database<Lock<By<Contract, contract::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Contract, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Staged data is never shared between transactions.
        Ok(())
    }
}

impl Database<Lock<By<Contract, contract::Year>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Contract, contract::Year>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Database<Select<By<Option<Contract>, contract::Id>>> for Memory {
    type Ok = Option<Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Contract>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self
            .state()
            .await
            .contracts
            .get(&by.into_inner())
            .filter(|c| !c.is_deleted())
            .cloned())
    }
}

impl Database<Select<By<Option<contract::Number>, contract::Year>>>
    for Memory
{
    type Ok = Option<contract::Number>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<contract::Number>, contract::Year>>,
    ) -> Result<Self::Ok, Self::Err> {
        let year = by.into_inner();
        Ok(self
            .state()
            .await
            .contracts
            .values()
            .filter(|c| c.year == year)
            .map(|c| c.number)
            .max())
    }
}

impl Database<Insert<Contract>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(contract): Insert<Contract>,
    ) -> Result<Self::Ok, Self::Err> {
        drop(self.state().await.contracts.insert(contract.id, contract));
        Ok(())
    }
}

impl
    Database<
        Select<By<read::contract::list::Page, read::contract::list::Selector>>,
    > for Memory
{
    type Ok = read::contract::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::contract::list::Page, read::contract::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::contract::list::Selector { arguments, filter } =
            by.into_inner();

        let mut matched = self
            .state()
            .await
            .contracts
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect::<Vec<_>>();
        matched.sort_by_key(|c| Reverse((c.year, c.number)));

        let total = matched.len() as u64;
        Ok(read::contract::list::Page::new(
            arguments,
            paginate(matched, arguments),
            total,
        ))
    }
}

impl Database<Select<By<Option<Extension>, extension::Id>>> for Memory {
    type Ok = Option<Extension>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Extension>, extension::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self
            .state()
            .await
            .extensions
            .get(&by.into_inner())
            .cloned())
    }
}

impl Database<Select<By<Vec<Extension>, contract::Id>>> for Memory {
    type Ok = Vec<Extension>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Extension>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let contract_id = by.into_inner();
        let mut extensions = self
            .state()
            .await
            .extensions
            .values()
            .filter(|e| e.contract_id == contract_id)
            .cloned()
            .collect::<Vec<_>>();
        extensions.sort_by_key(|e| e.number);
        Ok(extensions)
    }
}

impl Database<Insert<Extension>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(extension): Insert<Extension>,
    ) -> Result<Self::Ok, Self::Err> {
        drop(self.state().await.extensions.insert(extension.id, extension));
        Ok(())
    }
}

impl Database<Delete<By<Extension, extension::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Extension, extension::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        drop(self.state().await.extensions.remove(&by.into_inner()));
        Ok(())
    }
}

impl Database<Select<By<Option<Teacher>, teacher::Id>>> for Memory {
    type Ok = Option<Teacher>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Teacher>, teacher::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self
            .state()
            .await
            .teachers
            .get(&by.into_inner())
            .filter(|t| t.deleted_at.is_none())
            .cloned())
    }
}

impl Database<Select<By<Option<Teacher>, teacher::IdentityCard>>> for Memory {
    type Ok = Option<Teacher>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Teacher>, teacher::IdentityCard>>,
    ) -> Result<Self::Ok, Self::Err> {
        let identity_card = by.into_inner();
        Ok(self
            .state()
            .await
            .teachers
            .values()
            .find(|t| t.identity_card == identity_card)
            .cloned())
    }
}

impl Database<Select<By<Vec<Teacher>, teacher::NormalizedName>>> for Memory {
    type Ok = Vec<Teacher>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Teacher>, teacher::NormalizedName>>,
    ) -> Result<Self::Ok, Self::Err> {
        let name = by.into_inner();
        Ok(self
            .state()
            .await
            .teachers
            .values()
            .filter(|t| t.deleted_at.is_none() && t.normalized_name == name)
            .cloned()
            .collect())
    }
}

impl Database<Insert<Teacher>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(teacher): Insert<Teacher>,
    ) -> Result<Self::Ok, Self::Err> {
        drop(self.state().await.teachers.insert(teacher.id, teacher));
        Ok(())
    }
}

impl
    Database<
        Select<By<read::teacher::list::Page, read::teacher::list::Selector>>,
    > for Memory
{
    type Ok = read::teacher::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::teacher::list::Page, read::teacher::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::teacher::list::Selector { arguments, filter } =
            by.into_inner();

        let mut matched = self
            .state()
            .await
            .teachers
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect::<Vec<_>>();
        matched.sort_by(|a, b| {
            a.normalized_name
                .as_ref()
                .cmp(b.normalized_name.as_ref())
                .then_with(|| Uuid::from(a.id).cmp(&Uuid::from(b.id)))
        });

        let total = matched.len() as u64;
        Ok(read::teacher::list::Page::new(
            arguments,
            paginate(matched, arguments),
            total,
        ))
    }
}

impl Database<Select<By<Option<Passport>, passport::Number>>> for Memory {
    type Ok = Option<Passport>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Passport>, passport::Number>>,
    ) -> Result<Self::Ok, Self::Err> {
        let number = by.into_inner();
        Ok(self
            .state()
            .await
            .passports
            .values()
            .find(|p| p.number == number)
            .cloned())
    }
}

impl Database<Select<By<Vec<Passport>, teacher::Id>>> for Memory {
    type Ok = Vec<Passport>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Passport>, teacher::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let teacher_id = by.into_inner();
        let mut passports = self
            .state()
            .await
            .passports
            .values()
            .filter(|p| p.teacher_id == teacher_id)
            .cloned()
            .collect::<Vec<_>>();
        passports.sort_by_key(|p| Reverse(p.expires_on));
        Ok(passports)
    }
}

impl Database<Insert<Passport>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(passport): Insert<Passport>,
    ) -> Result<Self::Ok, Self::Err> {
        drop(self.state().await.passports.insert(passport.id, passport));
        Ok(())
    }
}

impl Database<Insert<Import>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(import): Insert<Import>,
    ) -> Result<Self::Ok, Self::Err> {
        self.state().await.imports.push(import);
        Ok(())
    }
}

impl
    Database<
        Select<By<read::import::list::Page, read::import::list::Selector>>,
    > for Memory
{
    type Ok = read::import::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::import::list::Page, read::import::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::import::list::Selector { arguments, filter } =
            by.into_inner();

        let matched = self
            .state()
            .await
            .imports
            .iter()
            .rev()
            .filter(|i| i.user_id == filter.user_id)
            .cloned()
            .collect::<Vec<_>>();

        let total = matched.len() as u64;
        Ok(read::import::list::Page::new(
            arguments,
            paginate(matched, arguments),
            total,
        ))
    }
}

/// Takes the items of the page requested by the provided `arguments`.
fn paginate<T>(
    items: Vec<T>,
    arguments: common::pagination::Arguments,
) -> impl Iterator<Item = T> {
    let offset = usize::try_from(arguments.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(arguments.limit()).unwrap_or(usize::MAX);
    items.into_iter().skip(offset).take(limit)
}

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Commit, Insert, Select, Transact},
        Date, DateTime,
    };

    use crate::{
        domain::{contract, teacher, Contract},
        infra::Database as _,
    };

    use super::Memory;

    fn contract() -> Contract {
        let end = Date::parse("2024-12-31").unwrap();
        Contract {
            id: contract::Id::new(),
            number: contract::Number::FIRST,
            year: contract::Year::from(2024),
            teacher_id: teacher::Id::new(),
            country: contract::Country::new("AO").unwrap(),
            start_date: Date::parse("2024-01-01").unwrap().coerce(),
            end_date: end.coerce(),
            base_end_date: end.coerce(),
            function: contract::Function::new("Profesor").unwrap(),
            workplace: contract::Workplace::new("Universidad").unwrap(),
            salary: None,
            status: contract::Status::Active,
            notes: None,
            created_at: DateTime::now().coerce(),
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn uncommitted_changes_are_discarded() {
        let db = Memory::default();
        let contract = contract();

        let tx = db.execute(Transact).await.unwrap();
        tx.execute(Insert(contract.clone())).await.unwrap();
        assert!(tx
            .execute(Select(By::<Option<Contract>, _>::new(contract.id)))
            .await
            .unwrap()
            .is_some());
        drop(tx);

        assert!(db
            .execute(Select(By::<Option<Contract>, _>::new(contract.id)))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn committed_changes_are_visible() {
        let db = Memory::default();
        let contract = contract();

        let tx = db.execute(Transact).await.unwrap();
        tx.execute(Insert(contract.clone())).await.unwrap();
        tx.execute(Commit).await.unwrap();

        assert!(db
            .execute(Select(By::<Option<Contract>, _>::new(contract.id)))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn deleted_contracts_are_hidden() {
        let db = Memory::default();
        let mut contract = contract();
        contract.deleted_at = Some(DateTime::now().coerce());

        db.execute(Insert(contract.clone())).await.unwrap();

        assert!(db
            .execute(Select(By::<Option<Contract>, _>::new(contract.id)))
            .await
            .unwrap()
            .is_none());
        assert_eq!(
            db.execute(Select(By::<Option<contract::Number>, _>::new(
                contract.year,
            )))
            .await
            .unwrap(),
            Some(contract::Number::FIRST),
        );
    }
}
