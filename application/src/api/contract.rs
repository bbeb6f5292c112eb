//! [`Contract`]-related definitions.

use std::str::FromStr as _;

use axum::{
    extract::{Path, Query},
    Json,
};
use axum_extra::extract::WithRejection;
use common::{Date, DateTime, Money};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use service::{
    command::{self, terminate_contract::Outcome, Command as _},
    domain::{self, contract, teacher},
    query, read, Query as _,
};

use crate::{
    api::{self, Extension, Page},
    AsError, Context, Error,
};

/// Work assignment of a teacher abroad.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    /// ID of this [`Contract`].
    pub id: contract::Id,

    /// Consecutive number of this [`Contract`] within its year.
    pub numero: i32,

    /// Year this [`Contract`] is registered in.
    pub anio: i32,

    /// Human-readable `{numero}/{anio}` code of this [`Contract`].
    pub codigo: String,

    /// ID of the contracted teacher.
    pub profesor_id: teacher::Id,

    /// Destination country code.
    pub pais: String,

    /// Date this [`Contract`] starts at.
    pub fecha_inicio: Date,

    /// Current effective date this [`Contract`] ends at.
    pub fecha_fin: Date,

    /// Date this [`Contract`] ends at without any [`Extension`]s.
    pub fecha_fin_original: Date,

    /// Function the teacher performs.
    pub funcion: String,

    /// Workplace of the teacher.
    pub lugar_trabajo: String,

    /// Salary, as `{amount}{currency}`.
    pub salario: Option<String>,

    /// [`Status`] of this [`Contract`].
    pub estado: Status,

    /// Free-text notes.
    pub observaciones: Option<String>,

    /// [`DateTime`] when this [`Contract`] was registered.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub creado_en: DateTime,

    /// [`Extension`]s of this [`Contract`], if requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prorrogas: Option<Vec<Extension>>,
}

impl From<domain::Contract> for Contract {
    fn from(contract: domain::Contract) -> Self {
        let number = i32::from(contract.number);
        let year = i32::from(contract.year);
        Self {
            id: contract.id,
            numero: number,
            anio: year,
            codigo: format!("{number}/{year}"),
            profesor_id: contract.teacher_id,
            pais: contract.country.to_string(),
            fecha_inicio: contract.start_date.coerce(),
            fecha_fin: contract.end_date.coerce(),
            fecha_fin_original: contract.base_end_date.coerce(),
            funcion: contract.function.to_string(),
            lugar_trabajo: contract.workplace.to_string(),
            salario: contract.salary.map(|s| s.to_string()),
            estado: contract.status.into(),
            observaciones: contract.notes.map(|n| n.to_string()),
            creado_en: contract.created_at.coerce(),
            prorrogas: None,
        }
    }
}

/// Status of a [`Contract`].
#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// In force, without extensions.
    #[display("ACTIVO")]
    Activo,

    /// In force, with at least one extension.
    #[display("PRORROGADO")]
    Prorrogado,

    /// Closed.
    #[display("CERRADO")]
    Cerrado,

    /// Cancelled.
    #[display("CANCELADO")]
    Cancelado,
}

impl From<contract::Status> for Status {
    fn from(status: contract::Status) -> Self {
        match status {
            contract::Status::Active => Self::Activo,
            contract::Status::Extended => Self::Prorrogado,
            contract::Status::Closed => Self::Cerrado,
            contract::Status::Cancelled => Self::Cancelado,
        }
    }
}

impl From<Status> for contract::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::Activo => Self::Active,
            Status::Prorrogado => Self::Extended,
            Status::Cerrado => Self::Closed,
            Status::Cancelado => Self::Cancelled,
        }
    }
}

/// Editable terms of a [`Contract`].
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Terms {
    /// Destination country code.
    pub pais: String,

    /// Date the [`Contract`] starts at.
    pub fecha_inicio: Date,

    /// Date the [`Contract`] ends at.
    pub fecha_fin: Date,

    /// Function the teacher performs.
    pub funcion: String,

    /// Workplace of the teacher.
    pub lugar_trabajo: String,

    /// Salary, as `{amount}{currency}`.
    pub salario: Option<String>,

    /// Free-text notes.
    pub observaciones: Option<String>,
}

/// [`Terms`] validated against the domain rules of their fields.
#[derive(Debug)]
struct ValidTerms {
    country: contract::Country,
    start_date: contract::StartDate,
    end_date: contract::EndDate,
    function: contract::Function,
    workplace: contract::Workplace,
    salary: Option<Money>,
    notes: Option<contract::Notes>,
}

impl Terms {
    /// Validates these [`Terms`].
    fn validate(self) -> Result<ValidTerms, Error> {
        let Self {
            pais,
            fecha_inicio,
            fecha_fin,
            funcion,
            lugar_trabajo,
            salario,
            observaciones,
        } = self;

        Ok(ValidTerms {
            country: api::required(contract::Country::new(pais), "pais")?,
            start_date: fecha_inicio.coerce(),
            end_date: fecha_fin.coerce(),
            function: api::required(
                contract::Function::new(funcion.trim()),
                "funcion",
            )?,
            workplace: api::required(
                contract::Workplace::new(lugar_trabajo.trim()),
                "lugarTrabajo",
            )?,
            salary: api::optional(
                salario,
                |s| Money::from_str(s.trim()).ok(),
                "salario",
            )?,
            notes: api::optional(
                observaciones,
                |n| contract::Notes::new(n.trim()),
                "observaciones",
            )?,
        })
    }
}

/// Body of a new [`Contract`] registration.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContract {
    /// ID of the teacher to contract.
    pub profesor_id: teacher::Id,

    /// [`Terms`] of the new [`Contract`].
    #[serde(flatten)]
    pub terms: Terms,
}

/// Query parameters of the [`Contract`]s list.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    /// Requested page number.
    pub pagina: Option<u32>,

    /// Requested page size.
    pub limite: Option<u32>,

    /// Destination country code to filter by.
    pub pais: Option<String>,

    /// [`Status`] to filter by.
    pub estado: Option<Status>,

    /// ID of the teacher to filter by.
    pub profesor_id: Option<teacher::Id>,
}

/// Lists [`Contract`]s, most recent first.
#[tracing::instrument(
    skip_all,
    fields(http.handler = "listContracts", otel.name = api::SPAN_NAME),
)]
pub async fn list(
    ctx: Context,
    WithRejection(Query(params), _): WithRejection<Query<ListParams>, Error>,
) -> Result<Json<Page<Contract>>, Error> {
    let ListParams {
        pagina,
        limite,
        pais,
        estado,
        profesor_id,
    } = params;

    let selector = read::contract::list::Selector {
        arguments: api::pagination(pagina, limite)?,
        filter: read::contract::list::Filter {
            country: pais
                .map(|p| api::required(contract::Country::new(p), "pais"))
                .transpose()?,
            status: estado.map(Into::into),
            teacher_id: profesor_id,
        },
    };

    ctx.service()
        .execute(query::contracts::List::by(selector))
        .await
        .map_err(AsError::into_error)
        .map(|page| Json(page.into()))
}

/// Registers a new [`Contract`].
#[tracing::instrument(
    skip_all,
    fields(
        http.handler = "createContract",
        otel.name = api::SPAN_NAME,
        teacher.id = %body.profesor_id,
    ),
)]
pub async fn create(
    ctx: Context,
    WithRejection(Json(body), _): WithRejection<Json<NewContract>, Error>,
) -> Result<(http::StatusCode, Json<Contract>), Error> {
    let NewContract { profesor_id, terms } = body;
    let ValidTerms {
        country,
        start_date,
        end_date,
        function,
        workplace,
        salary,
        notes,
    } = terms.validate()?;

    ctx.service()
        .execute(command::CreateContract {
            teacher_id: profesor_id,
            country,
            start_date,
            end_date,
            function,
            workplace,
            salary,
            notes,
        })
        .await
        .map_err(AsError::into_error)
        .map(|c| (http::StatusCode::CREATED, Json(c.into())))
}

/// Returns the [`Contract`] with its [`Extension`]s.
#[tracing::instrument(
    skip_all,
    fields(
        contract.id = %id,
        http.handler = "getContract",
        otel.name = api::SPAN_NAME,
    ),
)]
pub async fn get(
    ctx: Context,
    WithRejection(Path(id), _): WithRejection<Path<contract::Id>, Error>,
) -> Result<Json<Contract>, Error> {
    let contract = ctx
        .service()
        .execute(query::contract::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .ok_or_else(|| Error::not_found(&"El contrato no existe"))?;
    let extensions = ctx
        .service()
        .execute(query::extensions::ByContract::by(id))
        .await
        .map_err(AsError::into_error)?;

    let mut contract = Contract::from(contract);
    contract.prorrogas =
        Some(extensions.into_iter().map(Extension::from).collect());
    Ok(Json(contract))
}

/// Updates the [`Terms`] of the [`Contract`].
#[tracing::instrument(
    skip_all,
    fields(
        contract.id = %id,
        http.handler = "updateContract",
        otel.name = api::SPAN_NAME,
    ),
)]
pub async fn update(
    ctx: Context,
    WithRejection(Path(id), _): WithRejection<Path<contract::Id>, Error>,
    WithRejection(Json(terms), _): WithRejection<Json<Terms>, Error>,
) -> Result<Json<Contract>, Error> {
    let ValidTerms {
        country,
        start_date,
        end_date,
        function,
        workplace,
        salary,
        notes,
    } = terms.validate()?;

    ctx.service()
        .execute(command::UpdateContract {
            contract_id: id,
            country,
            start_date,
            end_date,
            function,
            workplace,
            salary,
            notes,
        })
        .await
        .map_err(AsError::into_error)
        .map(|c| Json(c.into()))
}

/// Closes the [`Contract`].
#[tracing::instrument(
    skip_all,
    fields(
        contract.id = %id,
        http.handler = "closeContract",
        otel.name = api::SPAN_NAME,
    ),
)]
pub async fn close(
    ctx: Context,
    WithRejection(Path(id), _): WithRejection<Path<contract::Id>, Error>,
) -> Result<Json<Contract>, Error> {
    terminate(&ctx, id, Outcome::Closed).await
}

/// Cancels the [`Contract`].
#[tracing::instrument(
    skip_all,
    fields(
        contract.id = %id,
        http.handler = "cancelContract",
        otel.name = api::SPAN_NAME,
    ),
)]
pub async fn cancel(
    ctx: Context,
    WithRejection(Path(id), _): WithRejection<Path<contract::Id>, Error>,
) -> Result<Json<Contract>, Error> {
    terminate(&ctx, id, Outcome::Cancelled).await
}

/// Terminates the [`Contract`] with the provided [`Outcome`].
async fn terminate(
    ctx: &Context,
    id: contract::Id,
    outcome: Outcome,
) -> Result<Json<Contract>, Error> {
    ctx.service()
        .execute(command::TerminateContract {
            contract_id: id,
            outcome,
        })
        .await
        .map_err(AsError::into_error)
        .map(|c| Json(c.into()))
}

/// Soft-deletes the [`Contract`].
#[tracing::instrument(
    skip_all,
    fields(
        contract.id = %id,
        http.handler = "deleteContract",
        otel.name = api::SPAN_NAME,
    ),
)]
pub async fn delete(
    ctx: Context,
    WithRejection(Path(id), _): WithRejection<Path<contract::Id>, Error>,
) -> Result<http::StatusCode, Error> {
    ctx.service()
        .execute(command::DeleteContract { contract_id: id })
        .await
        .map_err(AsError::into_error)
        .map(|()| http::StatusCode::NO_CONTENT)
}

/// Builds an `INVALID_STATE` [`Error`] about a terminated [`Contract`].
pub(crate) fn terminated(status: contract::Status) -> Error {
    Error::invalid_state(&format!(
        "No se puede operar sobre un contrato {}",
        Status::from(status),
    ))
}

impl AsError for command::create_contract::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InvalidPeriod { .. } => Some(Error::validation(
                &"La fecha de fin no puede ser anterior a la de inicio",
            )),
            Self::InvalidSalary(_) => {
                Some(Error::validation(&"El salario debe ser positivo"))
            }
            Self::TeacherNotExists(_) => {
                Some(Error::not_found(&"El profesor no existe"))
            }
        }
    }
}

impl AsError for command::update_contract::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::ContractNotExists(_) => {
                Some(Error::not_found(&"El contrato no existe"))
            }
            Self::ContractTerminated { status, .. } => {
                Some(terminated(*status))
            }
            Self::DatesLocked(_) => Some(Error::invalid_state(
                &"No se pueden cambiar las fechas de un contrato prorrogado",
            )),
            Self::Db(e) => e.try_as_error(),
            Self::InvalidPeriod { .. } => Some(Error::validation(
                &"La fecha de fin no puede ser anterior a la de inicio",
            )),
            Self::InvalidSalary(_) => {
                Some(Error::validation(&"El salario debe ser positivo"))
            }
        }
    }
}

impl AsError for command::terminate_contract::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::ContractAlreadyTerminated { status, .. } => {
                Some(Error::invalid_state(&format!(
                    "El contrato ya está {}",
                    Status::from(*status),
                )))
            }
            Self::ContractNotExists(_) => {
                Some(Error::not_found(&"El contrato no existe"))
            }
            Self::Db(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::delete_contract::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::ContractNotExists(_) => {
                Some(Error::not_found(&"El contrato no existe"))
            }
            Self::Db(e) => e.try_as_error(),
        }
    }
}

#[cfg(test)]
mod spec {
    use service::{command, domain::contract};

    use crate::AsError as _;

    use super::{NewContract, Status};

    fn new_contract(json: serde_json::Value) -> NewContract {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn status_wire_names() {
        assert_eq!(
            serde_json::to_value(Status::from(contract::Status::Extended))
                .unwrap(),
            "PRORROGADO",
        );
        assert_eq!(
            serde_json::from_str::<Status>("\"CANCELADO\"").unwrap(),
            Status::Cancelado,
        );
        assert_eq!(Status::Cerrado.to_string(), "CERRADO");
    }

    #[test]
    fn validates_terms() {
        let body = new_contract(serde_json::json!({
            "profesorId": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "pais": "ve",
            "fechaInicio": "2024-01-01",
            "fechaFin": "2024-12-31",
            "funcion": "Profesor de Física",
            "lugarTrabajo": "Liceo Bolivariano",
            "salario": "1500.50USD",
            "observaciones": "",
        }));

        let terms = body.terms.validate().unwrap();

        assert_eq!(terms.country.to_string(), "VE");
        assert_eq!(terms.salary.unwrap().to_string(), "1500.50USD");
        assert!(terms.notes.is_none());
    }

    #[test]
    fn rejects_invalid_terms() {
        let body = new_contract(serde_json::json!({
            "profesorId": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "pais": "VEN",
            "fechaInicio": "2024-01-01",
            "fechaFin": "2024-12-31",
            "funcion": "Profesor",
            "lugarTrabajo": "Liceo",
        }));

        let err = body.terms.validate().unwrap_err();

        assert_eq!(err.code, "VALIDATION_ERROR");
        assert!(err.message.contains("pais"), "{}", err.message);
    }

    #[test]
    fn maps_terminated_to_invalid_state() {
        use command::terminate_contract::ExecutionError as E;

        let err = E::ContractAlreadyTerminated {
            id: contract::Id::new(),
            status: contract::Status::Closed,
        }
        .as_error();

        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "INVALID_STATE");
        assert_eq!(err.message, "El contrato ya está CERRADO");
    }

    #[test]
    fn maps_missing_contract_to_not_found() {
        let err = command::delete_contract::ExecutionError::ContractNotExists(
            contract::Id::new(),
        )
        .as_error();

        assert_eq!(err.status_code, http::StatusCode::NOT_FOUND);
    }
}
