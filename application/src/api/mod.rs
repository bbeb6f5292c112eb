//! REST API definitions.

pub mod contract;
pub mod extension;
pub mod health;
pub mod passport;
pub mod teacher;

use axum::{
    routing::{get, post, put},
    Router,
};
use common::pagination;
use serde::Serialize;

use crate::{define_error, Error};

pub use self::{
    contract::Contract, extension::Extension, passport::Passport,
    teacher::Teacher,
};

/// Name of the [`tracing::Span`] for the API handlers.
const SPAN_NAME: &str = "REST handler";

/// Builds the [`Router`] of the whole REST API.
///
/// Handlers expect the [`Service`] to be provided as an [`Extension`] layer.
///
/// [`Extension`]: axum::Extension
/// [`Service`]: crate::Service
pub fn router() -> Router {
    Router::new()
        .route("/health", get(health::check))
        .route("/contratos", get(contract::list).post(contract::create))
        .route(
            "/contratos/:id",
            get(contract::get)
                .put(contract::update)
                .delete(contract::delete),
        )
        .route("/contratos/:id/cerrar", post(contract::close))
        .route("/contratos/:id/cancelar", post(contract::cancel))
        .route("/prorrogas", post(extension::create))
        .route(
            "/prorrogas/:id",
            put(extension::update).delete(extension::delete),
        )
        .route(
            "/prorrogas/:id/generar-suplemento",
            post(extension::supplement),
        )
        .route("/profesores", get(teacher::list).post(teacher::create))
        .route("/profesores/:id", get(teacher::get))
        .route("/profesores/:id/pasaportes", get(passport::by_teacher))
        .route("/pasaportes/importar", post(passport::import))
        .route("/pasaportes/importaciones", get(passport::imports))
}

/// A page of listed items.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this [`Page`].
    pub items: Vec<T>,

    /// Total number of items across all pages.
    pub total: u64,

    /// Number of this [`Page`], starting from `1`.
    pub pagina: u32,

    /// Maximum number of items on this [`Page`].
    pub limite: u32,

    /// Total number of pages.
    pub total_paginas: u64,
}

impl<I, T> From<pagination::Page<I>> for Page<T>
where
    T: From<I>,
{
    fn from(page: pagination::Page<I>) -> Self {
        let total_paginas = page.total_pages();
        let pagination::Page {
            items,
            total,
            arguments,
        } = page;
        Self {
            items: items.into_iter().map(Into::into).collect(),
            total,
            pagina: arguments.page(),
            limite: arguments.limit(),
            total_paginas,
        }
    }
}

/// Builds [`pagination::Arguments`] out of the `pagina` and `limite` query
/// parameters.
///
/// # Errors
///
/// If the parameters are out of range.
fn pagination(
    pagina: Option<u32>,
    limite: Option<u32>,
) -> Result<pagination::Arguments, Error> {
    pagination::Arguments::new(pagina, limite)
        .ok_or_else(|| PaginationError::OutOfRange.into())
}

/// Validates a required input `field` parsed with a domain constructor.
///
/// # Errors
///
/// If the constructor rejected the value.
fn required<T>(parsed: Option<T>, field: &str) -> Result<T, Error> {
    parsed.ok_or_else(|| {
        Error::validation(&format!("El campo `{field}` no es válido"))
    })
}

/// Validates an optional free-text input `field`, treating a blank value as
/// absent.
///
/// # Errors
///
/// If the non-blank value was rejected by the provided constructor.
fn optional<T>(
    value: Option<String>,
    new: impl FnOnce(String) -> Option<T>,
    field: &str,
) -> Result<Option<T>, Error> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| required(new(v), field))
        .transpose()
}

define_error! {
    enum PaginationError {
        #[code = "VALIDATION_ERROR"]
        #[status = BAD_REQUEST]
        #[message = "`pagina` debe ser positiva y `limite` estar entre 1 y \
                     100"]
        OutOfRange,
    }
}

#[cfg(test)]
mod spec {
    use common::pagination::{Arguments, Page as Selected};

    use super::{optional, pagination, required, Page};

    #[test]
    fn builds_router() {
        drop(super::router());
    }

    #[test]
    fn validates_pagination() {
        assert_eq!(pagination(None, None).unwrap().limit(), 10);
        assert_eq!(
            pagination(Some(0), None).unwrap_err().status_code,
            http::StatusCode::BAD_REQUEST,
        );
        assert!(pagination(Some(2), Some(101)).is_err());
    }

    #[test]
    fn converts_page() {
        let args = Arguments::new(Some(2), Some(2)).unwrap();
        let page: Page<u16> = Selected::<u8>::new(args, [5u8], 3).into();

        assert_eq!(page.items, [5]);
        assert_eq!(page.pagina, 2);
        assert_eq!(page.total_paginas, 2);
    }

    #[test]
    fn treats_blank_optional_as_absent() {
        let new = |v: String| (v.len() < 5).then_some(v);

        assert_eq!(optional(Some("  ".into()), new, "x").unwrap(), None);
        assert_eq!(optional(None, new, "x").unwrap(), None);
        assert_eq!(
            optional(Some("abc".into()), new, "x").unwrap().as_deref(),
            Some("abc"),
        );
        assert!(optional(Some("abcdef".into()), new, "x").is_err());
        assert!(required(None::<u8>, "x").is_err());
    }
}
