//! [`Teacher`]-related definitions.

use axum::{
    extract::{Path, Query},
    Json,
};
use axum_extra::extract::WithRejection;
use common::DateTime;
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain::{self, teacher},
    query, read, Query as _,
};

use crate::{
    api::{self, Page},
    define_error, AsError, Context, Error,
};

/// Teacher serving in the cooperation.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    /// ID of this [`Teacher`].
    pub id: teacher::Id,

    /// Full name of this [`Teacher`].
    pub nombre: String,

    /// National identity card number.
    pub carnet_identidad: String,

    /// [`DateTime`] when this [`Teacher`] was registered.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub creado_en: DateTime,
}

impl From<domain::Teacher> for Teacher {
    fn from(teacher: domain::Teacher) -> Self {
        Self {
            id: teacher.id,
            nombre: teacher.full_name.to_string(),
            carnet_identidad: teacher.identity_card.to_string(),
            creado_en: teacher.created_at.coerce(),
        }
    }
}

/// Body of a new [`Teacher`] registration.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTeacher {
    /// Full name of the new [`Teacher`].
    pub nombre: String,

    /// National identity card number of the new [`Teacher`].
    pub carnet_identidad: String,
}

/// Query parameters of the [`Teacher`]s list.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ListParams {
    /// Requested page number.
    pub pagina: Option<u32>,

    /// Requested page size.
    pub limite: Option<u32>,

    /// Name (or its words) to search for.
    pub nombre: Option<String>,
}

/// Lists [`Teacher`]s, searching them by name.
#[tracing::instrument(
    skip_all,
    fields(http.handler = "listTeachers", otel.name = api::SPAN_NAME),
)]
pub async fn list(
    ctx: Context,
    WithRejection(Query(params), _): WithRejection<Query<ListParams>, Error>,
) -> Result<Json<Page<Teacher>>, Error> {
    let selector = read::teacher::list::Selector {
        arguments: api::pagination(params.pagina, params.limite)?,
        filter: read::teacher::list::Filter {
            name: params.nombre.and_then(teacher::NormalizedName::new),
        },
    };

    ctx.service()
        .execute(query::teachers::List::by(selector))
        .await
        .map_err(AsError::into_error)
        .map(|page| Json(page.into()))
}

/// Registers a new [`Teacher`].
#[tracing::instrument(
    skip_all,
    fields(http.handler = "createTeacher", otel.name = api::SPAN_NAME),
)]
pub async fn create(
    ctx: Context,
    WithRejection(Json(body), _): WithRejection<Json<NewTeacher>, Error>,
) -> Result<(http::StatusCode, Json<Teacher>), Error> {
    let full_name = api::required(
        teacher::FullName::new(body.nombre.trim()),
        "nombre",
    )?;
    let identity_card = api::required(
        teacher::IdentityCard::new(&body.carnet_identidad),
        "carnetIdentidad",
    )?;

    ctx.service()
        .execute(command::CreateTeacher {
            full_name,
            identity_card,
        })
        .await
        .map_err(AsError::into_error)
        .map(|t| (http::StatusCode::CREATED, Json(t.into())))
}

/// Returns the [`Teacher`].
#[tracing::instrument(
    skip_all,
    fields(
        teacher.id = %id,
        http.handler = "getTeacher",
        otel.name = api::SPAN_NAME,
    ),
)]
pub async fn get(
    ctx: Context,
    WithRejection(Path(id), _): WithRejection<Path<teacher::Id>, Error>,
) -> Result<Json<Teacher>, Error> {
    ctx.service()
        .execute(query::teacher::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .map(|t| Json(t.into()))
        .ok_or_else(|| Error::not_found(&"El profesor no existe"))
}

impl AsError for command::create_teacher::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::IdentityCardOccupied(_) => {
                Some(TeacherError::IdentityCardOccupied.into())
            }
        }
    }
}

define_error! {
    enum TeacherError {
        #[code = "CONFLICT"]
        #[status = CONFLICT]
        #[message = "Ya existe un profesor con ese carné de identidad"]
        IdentityCardOccupied,
    }
}

#[cfg(test)]
mod spec {
    use axum::extract::Query;
    use service::{command, domain::teacher};

    use crate::AsError as _;

    #[test]
    fn maps_occupied_identity_card_to_conflict() {
        let err = command::create_teacher::ExecutionError::IdentityCardOccupied(
            teacher::IdentityCard::new("85010112345").unwrap(),
        )
        .as_error();

        assert_eq!(err.status_code, http::StatusCode::CONFLICT);
        assert_eq!(err.code, "CONFLICT");
    }

    #[test]
    fn parses_list_params() {
        let uri: http::Uri =
            "/profesores?pagina=2&nombre=maria%20gonzalez".parse().unwrap();
        let Query(params) =
            Query::<super::ListParams>::try_from_uri(&uri).unwrap();

        assert_eq!(params.pagina, Some(2));
        assert_eq!(params.limite, None);
        assert_eq!(params.nombre.as_deref(), Some("maria gonzalez"));
    }
}
