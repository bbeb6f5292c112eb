//! [`Passport`]-related definitions.

use axum::{
    body::Bytes,
    extract::{Path, Query},
    Json,
};
use axum_extra::extract::WithRejection;
use common::{Date, DateTime};
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain::{self, import, passport, teacher},
    query, read, Query as _,
};

use crate::{
    api::{self, Page},
    AsError, Context, Error,
};

/// Passport of a teacher.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Passport {
    /// ID of this [`Passport`].
    pub id: passport::Id,

    /// ID of the teacher owning this [`Passport`].
    pub profesor_id: teacher::Id,

    /// Number of this [`Passport`].
    pub numero: String,

    /// [`Kind`] of this [`Passport`].
    pub tipo: Kind,

    /// Date this [`Passport`] was issued on.
    pub fecha_expedicion: Date,

    /// Date this [`Passport`] expires on.
    pub fecha_vencimiento: Date,

    /// Indicator whether this [`Passport`] is expired today.
    pub vencido: bool,
}

impl Passport {
    /// Converts the provided [`domain::Passport`] as seen at the `today`
    /// date.
    fn at(passport: domain::Passport, today: Date) -> Self {
        Self {
            vencido: passport.is_expired_at(today),
            id: passport.id,
            profesor_id: passport.teacher_id,
            numero: passport.number.to_string(),
            tipo: passport.kind.into(),
            fecha_expedicion: passport.issued_on.coerce(),
            fecha_vencimiento: passport.expires_on.coerce(),
        }
    }
}

/// Kind of a [`Passport`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Kind {
    /// Ordinary passport.
    Ordinario,

    /// Official passport.
    Oficial,

    /// Diplomatic passport.
    Diplomatico,
}

impl From<passport::Kind> for Kind {
    fn from(kind: passport::Kind) -> Self {
        match kind {
            passport::Kind::Ordinary => Self::Ordinario,
            passport::Kind::Official => Self::Oficial,
            passport::Kind::Diplomatic => Self::Diplomatico,
        }
    }
}

/// Summary of a bulk [`Passport`]s import.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Import {
    /// ID of this [`Import`].
    pub id: import::Id,

    /// Name of the uploaded file.
    pub archivo: String,

    /// Checksum of the uploaded file contents.
    ///
    /// Equal checksums in the history mean the same file was uploaded again.
    pub checksum: String,

    /// Number of processed rows.
    pub total: usize,

    /// Number of imported rows.
    pub importados: usize,

    /// Number of skipped rows.
    pub omitidos: usize,

    /// Number of failed rows.
    pub fallidos: usize,

    /// [`DateTime`] when this [`Import`] was performed.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub creado_en: DateTime,

    /// Outcomes of every processed row.
    pub filas: Vec<Row>,
}

impl From<domain::Import> for Import {
    fn from(import: domain::Import) -> Self {
        Self {
            total: import.total(),
            importados: import.count(import::Outcome::Imported),
            omitidos: import.count(import::Outcome::Skipped),
            fallidos: import.count(import::Outcome::Failed),
            id: import.id,
            archivo: import.file_name.to_string(),
            checksum: import.checksum.to_string(),
            creado_en: import.created_at.coerce(),
            filas: import.rows.into_iter().map(Into::into).collect(),
        }
    }
}

/// Outcome of a single row of an [`Import`].
#[derive(Clone, Debug, Serialize)]
pub struct Row {
    /// Line number of the row in the uploaded file.
    pub fila: u32,

    /// [`Outcome`] of the row.
    pub resultado: Outcome,

    /// Explanation of the [`Outcome`].
    pub mensaje: String,
}

impl From<import::Row> for Row {
    fn from(row: import::Row) -> Self {
        Self {
            fila: row.line,
            resultado: row.outcome.into(),
            mensaje: row.message,
        }
    }
}

/// Outcome of a single [`Row`] of an [`Import`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// A new [`Passport`] was registered.
    Importado,

    /// The [`Row`] was ignored.
    Omitido,

    /// The [`Row`] was malformed or couldn't be stored.
    Fallido,
}

impl From<import::Outcome> for Outcome {
    fn from(outcome: import::Outcome) -> Self {
        match outcome {
            import::Outcome::Imported => Self::Importado,
            import::Outcome::Skipped => Self::Omitido,
            import::Outcome::Failed => Self::Fallido,
        }
    }
}

/// Query parameters of a [`Passport`]s import.
#[derive(Clone, Debug, Deserialize)]
pub struct ImportParams {
    /// Name of the uploaded file.
    pub archivo: String,
}

/// Query parameters of the [`Import`]s history.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct ImportsParams {
    /// Requested page number.
    pub pagina: Option<u32>,

    /// Requested page size.
    pub limite: Option<u32>,
}

/// Lists the [`Passport`]s of a teacher.
#[tracing::instrument(
    skip_all,
    fields(
        teacher.id = %id,
        http.handler = "teacherPassports",
        otel.name = api::SPAN_NAME,
    ),
)]
pub async fn by_teacher(
    ctx: Context,
    WithRejection(Path(id), _): WithRejection<Path<teacher::Id>, Error>,
) -> Result<Json<Vec<Passport>>, Error> {
    let today = Date::today();
    ctx.service()
        .execute(query::passports::ByTeacher::by(id))
        .await
        .map_err(AsError::into_error)
        .map(|ps| {
            Json(ps.into_iter().map(|p| Passport::at(p, today)).collect())
        })
}

/// Imports [`Passport`]s out of the CSV file sent as the request body.
#[tracing::instrument(
    skip_all,
    fields(
        http.handler = "importPassports",
        import.file = %params.archivo,
        import.size = body.len(),
        otel.name = api::SPAN_NAME,
    ),
)]
pub async fn import(
    ctx: Context,
    WithRejection(Query(params), _): WithRejection<
        Query<ImportParams>,
        Error,
    >,
    body: Bytes,
) -> Result<Json<Import>, Error> {
    let file_name = api::required(
        import::FileName::new(params.archivo.trim()),
        "archivo",
    )?;

    ctx.service()
        .execute(command::ImportPassports {
            file_name,
            contents: body.to_vec(),
            initiator_id: ctx.session().user_id,
        })
        .await
        .map_err(AsError::into_error)
        .map(|i| Json(i.into()))
}

/// Lists the [`Import`]s performed by the current operator, most recent
/// first.
#[tracing::instrument(
    skip_all,
    fields(http.handler = "listImports", otel.name = api::SPAN_NAME),
)]
pub async fn imports(
    ctx: Context,
    WithRejection(Query(params), _): WithRejection<
        Query<ImportsParams>,
        Error,
    >,
) -> Result<Json<Page<Import>>, Error> {
    let selector = read::import::list::Selector {
        arguments: api::pagination(params.pagina, params.limite)?,
        filter: read::import::list::Filter {
            user_id: ctx.session().user_id,
        },
    };

    ctx.service()
        .execute(query::imports::List::by(selector))
        .await
        .map_err(AsError::into_error)
        .map(|page| Json(page.into()))
}

impl AsError for command::import_passports::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::MalformedFile(e) => Some(Error::validation(&format!(
                "El archivo no es un CSV válido: {e}",
            ))),
            Self::MissingColumn(column) => Some(Error::validation(&format!(
                "Falta la columna `{column}` en el archivo",
            ))),
            Self::TooManyRows { rows, max } => {
                Some(Error::validation(&format!(
                    "El archivo tiene {rows} filas, pero se admiten como \
                     máximo {max}",
                )))
            }
        }
    }
}
