//! Fixtures shared by the [`Service`] tests.

use common::{
    operations::{By, Select},
    Date, DateOf,
};
use uuid::Uuid;

use crate::{
    command::{CreateContract, CreateExtension, CreateTeacher},
    domain::{contract, extension, teacher, user, Contract, Extension, Teacher},
    infra::{Database as _, Memory},
    Service,
};

/// Parses the provided `YYYY-MM-DD` date of any kind.
pub(crate) fn date<Of: ?Sized>(s: &str) -> DateOf<Of> {
    Date::parse(s).unwrap().coerce()
}

/// Registers a new [`Teacher`] with the provided name.
pub(crate) async fn teacher(svc: &Service<Memory>, name: &str) -> Teacher {
    let card = format!("{:011}", Uuid::new_v4().as_u128() % 100_000_000_000);
    svc.execute(CreateTeacher {
        full_name: teacher::FullName::new(name).unwrap(),
        identity_card: teacher::IdentityCard::new(card).unwrap(),
    })
    .await
    .unwrap()
}

/// Registers a new [`Contract`] starting at `2024-01-01` and ending at the
/// provided `end` date.
pub(crate) async fn contract(svc: &Service<Memory>, end: &str) -> Contract {
    let teacher = teacher(svc, "María José Pérez").await;
    svc.execute(CreateContract {
        teacher_id: teacher.id,
        country: contract::Country::new("VE").unwrap(),
        start_date: date("2024-01-01"),
        end_date: date(end),
        function: contract::Function::new("Profesor de Matemática").unwrap(),
        workplace: contract::Workplace::new("Universidad de Caracas").unwrap(),
        salary: None,
        notes: None,
    })
    .await
    .unwrap()
}

/// Registers a new [`Extension`] of the provided [`Contract`].
pub(crate) async fn extend(
    svc: &Service<Memory>,
    contract: &Contract,
    from: &str,
    to: &str,
) -> Extension {
    svc.execute(CreateExtension {
        contract_id: contract.id,
        from_date: date(from),
        to_date: date(to),
        reason: extension::Reason::new("Necesidad docente").unwrap(),
        notes: None,
        initiator_id: user::Id::new(),
    })
    .await
    .unwrap()
}

/// Selects the current state of the [`Contract`] with the provided ID.
pub(crate) async fn reload(
    svc: &Service<Memory>,
    id: contract::Id,
) -> Contract {
    svc.database()
        .execute(Select(By::<Option<Contract>, _>::new(id)))
        .await
        .unwrap()
        .unwrap()
}
