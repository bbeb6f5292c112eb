//! [`Extension`]-related definitions.

use axum::{extract::Path, Json};
use axum_extra::extract::WithRejection;
use common::{Date, DateTime};
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain::{self, contract, extension, user},
    query, read, Query as _,
};

use crate::{
    api::{self, contract::terminated, Teacher},
    define_error, AsError, Context, Error,
};

/// Extension ("prórroga") of a contract period.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Extension {
    /// ID of this [`Extension`].
    pub id: extension::Id,

    /// ID of the extended contract.
    pub contrato_id: contract::Id,

    /// Ordinal number of this [`Extension`] within its contract.
    pub numero: i32,

    /// Date this [`Extension`] starts at.
    pub fecha_desde: Date,

    /// Date this [`Extension`] ends at.
    pub fecha_hasta: Date,

    /// Reason of this [`Extension`].
    pub motivo: String,

    /// Free-text notes.
    pub observaciones: Option<String>,

    /// ID of the operator who registered this [`Extension`].
    pub creado_por: user::Id,

    /// [`DateTime`] when this [`Extension`] was registered.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub creado_en: DateTime,
}

impl From<domain::Extension> for Extension {
    fn from(ext: domain::Extension) -> Self {
        Self {
            id: ext.id,
            contrato_id: ext.contract_id,
            numero: ext.number.into(),
            fecha_desde: ext.from_date.coerce(),
            fecha_hasta: ext.to_date.coerce(),
            motivo: ext.reason.to_string(),
            observaciones: ext.notes.map(|n| n.to_string()),
            creado_por: ext.created_by,
            creado_en: ext.created_at.coerce(),
        }
    }
}

/// Period and description of an [`Extension`].
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Terms {
    /// Date the [`Extension`] starts at.
    pub fecha_desde: Date,

    /// Date the [`Extension`] ends at.
    pub fecha_hasta: Date,

    /// Reason of the [`Extension`].
    pub motivo: String,

    /// Free-text notes.
    pub observaciones: Option<String>,
}

impl Terms {
    /// Validates the free-text fields of these [`Terms`].
    fn validate(
        self,
    ) -> Result<
        (
            extension::FromDate,
            extension::ToDate,
            extension::Reason,
            Option<extension::Notes>,
        ),
        Error,
    > {
        let reason = api::required(
            extension::Reason::new(self.motivo.trim()),
            "motivo",
        )?;
        let notes = api::optional(
            self.observaciones,
            |n| extension::Notes::new(n.trim()),
            "observaciones",
        )?;
        Ok((
            self.fecha_desde.coerce(),
            self.fecha_hasta.coerce(),
            reason,
            notes,
        ))
    }
}

/// Body of a new [`Extension`] registration.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExtension {
    /// ID of the contract to extend.
    pub contrato_id: contract::Id,

    /// [`Terms`] of the new [`Extension`].
    #[serde(flatten)]
    pub terms: Terms,
}

/// Data of a contract supplement formalizing an [`Extension`].
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplement {
    /// `{numero}/{anio}` code of the supplemented contract.
    pub contrato: String,

    /// Destination country code.
    pub pais: String,

    /// Function the teacher performs.
    pub funcion: String,

    /// Workplace of the teacher.
    pub lugar_trabajo: String,

    /// Date the contract started at.
    pub fecha_inicio_contrato: Date,

    /// Contracted teacher.
    pub profesor: Teacher,

    /// Formalized [`Extension`].
    pub prorroga: Extension,
}

impl From<read::extension::Supplement> for Supplement {
    fn from(supplement: read::extension::Supplement) -> Self {
        let read::extension::Supplement {
            contract,
            teacher,
            extension,
        } = supplement;
        Self {
            contrato: format!(
                "{}/{}",
                i32::from(contract.number),
                i32::from(contract.year),
            ),
            pais: contract.country.to_string(),
            funcion: contract.function.to_string(),
            lugar_trabajo: contract.workplace.to_string(),
            fecha_inicio_contrato: contract.start_date.coerce(),
            profesor: teacher.into(),
            prorroga: extension.into(),
        }
    }
}

/// Registers a new [`Extension`] of a contract.
#[tracing::instrument(
    skip_all,
    fields(
        contract.id = %body.contrato_id,
        http.handler = "createExtension",
        otel.name = api::SPAN_NAME,
    ),
)]
pub async fn create(
    ctx: Context,
    WithRejection(Json(body), _): WithRejection<Json<NewExtension>, Error>,
) -> Result<(http::StatusCode, Json<Extension>), Error> {
    let NewExtension { contrato_id, terms } = body;
    let (from_date, to_date, reason, notes) = terms.validate()?;

    ctx.service()
        .execute(command::CreateExtension {
            contract_id: contrato_id,
            from_date,
            to_date,
            reason,
            notes,
            initiator_id: ctx.session().user_id,
        })
        .await
        .map_err(AsError::into_error)
        .map(|e| (http::StatusCode::CREATED, Json(e.into())))
}

/// Updates the [`Terms`] of an [`Extension`].
#[tracing::instrument(
    skip_all,
    fields(
        extension.id = %id,
        http.handler = "updateExtension",
        otel.name = api::SPAN_NAME,
    ),
)]
pub async fn update(
    ctx: Context,
    WithRejection(Path(id), _): WithRejection<Path<extension::Id>, Error>,
    WithRejection(Json(terms), _): WithRejection<Json<Terms>, Error>,
) -> Result<Json<Extension>, Error> {
    let (from_date, to_date, reason, notes) = terms.validate()?;

    ctx.service()
        .execute(command::UpdateExtension {
            extension_id: id,
            from_date,
            to_date,
            reason,
            notes,
        })
        .await
        .map_err(AsError::into_error)
        .map(|e| Json(e.into()))
}

/// Deletes the last [`Extension`] of a contract.
#[tracing::instrument(
    skip_all,
    fields(
        extension.id = %id,
        http.handler = "deleteExtension",
        otel.name = api::SPAN_NAME,
    ),
)]
pub async fn delete(
    ctx: Context,
    WithRejection(Path(id), _): WithRejection<Path<extension::Id>, Error>,
) -> Result<http::StatusCode, Error> {
    ctx.service()
        .execute(command::DeleteExtension { extension_id: id })
        .await
        .map_err(AsError::into_error)
        .map(|_| http::StatusCode::NO_CONTENT)
}

/// Returns the data of a contract [`Supplement`] formalizing an
/// [`Extension`].
#[tracing::instrument(
    skip_all,
    fields(
        extension.id = %id,
        http.handler = "generateSupplement",
        otel.name = api::SPAN_NAME,
    ),
)]
pub async fn supplement(
    ctx: Context,
    WithRejection(Path(id), _): WithRejection<Path<extension::Id>, Error>,
) -> Result<Json<Supplement>, Error> {
    ctx.service()
        .execute(query::extension::Supplement { extension_id: id })
        .await
        .map_err(AsError::into_error)
        .map(|s| Json(s.into()))
}

/// Builds a `NOT_FOUND` [`Error`] about a missing [`Extension`].
fn not_exists() -> Error {
    Error::not_found(&"La prórroga no existe")
}

/// Builds a `NOT_FOUND` [`Error`] about a missing contract.
fn contract_not_exists() -> Error {
    Error::not_found(&"El contrato no existe")
}

/// Builds a `VALIDATION_ERROR` [`Error`] about an empty [`Extension`] period.
fn invalid_period() -> Error {
    Error::validation(
        &"La fecha hasta debe ser posterior a la fecha desde",
    )
}

impl AsError for command::create_extension::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::ContractNotExists(_) => Some(contract_not_exists()),
            Self::ContractTerminated { status, .. } => {
                Some(terminated(*status))
            }
            Self::Db(e) => e.try_as_error(),
            Self::InvalidPeriod { .. } => Some(invalid_period()),
            Self::StartsBeforeContractEnd { end, .. } => {
                Some(Error::validation(&format!(
                    "La prórroga debe comenzar a partir del fin del contrato \
                     ({end})",
                )))
            }
        }
    }
}

impl AsError for command::update_extension::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::ContractNotExists(_) => Some(contract_not_exists()),
            Self::ContractTerminated { status, .. } => {
                Some(terminated(*status))
            }
            Self::Db(e) => e.try_as_error(),
            Self::ExtensionNotExists(_) => Some(not_exists()),
            Self::InvalidPeriod { .. } => Some(invalid_period()),
        }
    }
}

impl AsError for command::delete_extension::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::ContractNotExists(_) => Some(contract_not_exists()),
            Self::ContractTerminated { status, .. } => {
                Some(terminated(*status))
            }
            Self::Db(e) => e.try_as_error(),
            Self::ExtensionNotExists(_) => Some(not_exists()),
            Self::NotLastExtension { .. } => {
                Some(ExtensionError::NotLast.into())
            }
        }
    }
}

impl AsError for query::extension::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::ContractNotExists(_) => Some(contract_not_exists()),
            Self::Db(e) => e.try_as_error(),
            Self::ExtensionNotExists(_) => Some(not_exists()),
            Self::TeacherNotExists(_) => {
                Some(Error::not_found(&"El profesor no existe"))
            }
        }
    }
}

define_error! {
    enum ExtensionError {
        #[code = "INVALID_STATE"]
        #[status = BAD_REQUEST]
        #[message = "Solo se puede eliminar la última prórroga"]
        NotLast,
    }
}

#[cfg(test)]
mod spec {
    use service::{
        command,
        domain::{contract, extension},
    };

    use crate::AsError as _;

    use super::NewExtension;

    #[test]
    fn parses_camel_case_body() {
        let body: NewExtension = serde_json::from_value(serde_json::json!({
            "contratoId": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "fechaDesde": "2025-01-01",
            "fechaHasta": "2025-06-30",
            "motivo": " Necesidad del centro ",
        }))
        .unwrap();

        let (from, to, reason, notes) = body.terms.validate().unwrap();

        assert!(from < to.coerce());
        assert_eq!(reason.to_string(), "Necesidad del centro");
        assert!(notes.is_none());
    }

    #[test]
    fn rejects_blank_reason() {
        let body: NewExtension = serde_json::from_value(serde_json::json!({
            "contratoId": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "fechaDesde": "2025-01-01",
            "fechaHasta": "2025-06-30",
            "motivo": "   ",
        }))
        .unwrap();

        let err = body.terms.validate().unwrap_err();

        assert_eq!(err.code, "VALIDATION_ERROR");
    }

    #[test]
    fn rejects_malformed_dates() {
        let res = serde_json::from_value::<NewExtension>(serde_json::json!({
            "contratoId": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "fechaDesde": "01/01/2025",
            "fechaHasta": "2025-06-30",
            "motivo": "Motivo",
        }));

        assert!(res.is_err());
    }

    #[test]
    fn maps_not_last_to_invalid_state() {
        let err = command::delete_extension::ExecutionError::NotLastExtension {
            id: extension::Id::new(),
            last: extension::Number::new(3).unwrap(),
        }
        .as_error();

        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "INVALID_STATE");
        assert_eq!(err.message, "Solo se puede eliminar la última prórroga");
    }

    #[test]
    fn names_status_of_terminated_contract() {
        use command::create_extension::ExecutionError as E;

        let err = E::ContractTerminated {
            id: contract::Id::new(),
            status: contract::Status::Cancelled,
        }
        .as_error();

        assert_eq!(err.code, "INVALID_STATE");
        assert!(err.message.contains("CANCELADO"), "{}", err.message);
    }

    #[test]
    fn maps_missing_extension_to_not_found() {
        let err = command::update_extension::ExecutionError::ExtensionNotExists(
            extension::Id::new(),
        )
        .as_error();

        assert_eq!(err.status_code, http::StatusCode::NOT_FOUND);
    }
}
