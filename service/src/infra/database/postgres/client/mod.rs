//! Postgres database client definitions.
//!
//! Both clients acquire their [`Connection`] lazily, so a command that fails
//! validation before touching the database never takes a [`Pool`] slot.
//!
//! [`Connection`]: super::Connection
//! [`Pool`]: super::connection::Pool

pub mod non_tx;
pub mod tx;

use std::future::Future;

use tokio::sync::{RwLock, RwLockReadGuard};
use tracerr::Traced;

use crate::infra::database;

pub use self::{non_tx::NonTx, tx::Tx};

/// Returns the value stored in the provided `slot`, initializing it with the
/// provided `init` function if it's empty.
///
/// # Errors
///
/// If the provided `init` function fails.
async fn get_or_init<T, F, Fut>(
    slot: &RwLock<Option<T>>,
    init: F,
) -> Result<RwLockReadGuard<'_, T>, Traced<database::Error>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, Traced<database::Error>>>,
{
    let read = slot.read().await;
    let guard = if read.is_some() {
        read
    } else {
        drop(read);

        let mut write = slot.write().await;
        if write.is_none() {
            *write = Some(init().await.map_err(tracerr::wrap!())?);
        }
        write.downgrade()
    };

    Ok(RwLockReadGuard::map(guard, |conn| {
        conn.as_ref()
            .expect("connection cannot be dropped while guard is alive")
    }))
}

/// Implements [`Connection`] for a client type having an inherent
/// `connection()` method, by delegating to the returned [`Connection`].
///
/// [`Connection`]: super::Connection
macro_rules! delegate_connection {
    ($client:ty) => {
        impl $crate::infra::database::postgres::Connection for $client {
            async fn query<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ::tokio_postgres::types::ToSql + Sync)],
            ) -> Result<
                Vec<::tokio_postgres::Row>,
                ::tracerr::Traced<$crate::infra::database::Error>,
            >
            where
                T: ::tokio_postgres::ToStatement + ?Sized,
            {
                let conn =
                    self.connection().await.map_err(::tracerr::wrap!())?;
                $crate::infra::database::postgres::Connection::query(
                    &*conn, stmt, params,
                )
                .await
                .map_err(::tracerr::wrap!())
            }

            async fn query_opt<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ::tokio_postgres::types::ToSql + Sync)],
            ) -> Result<
                Option<::tokio_postgres::Row>,
                ::tracerr::Traced<$crate::infra::database::Error>,
            >
            where
                T: ::tokio_postgres::ToStatement + ?Sized,
            {
                let conn =
                    self.connection().await.map_err(::tracerr::wrap!())?;
                $crate::infra::database::postgres::Connection::query_opt(
                    &*conn, stmt, params,
                )
                .await
                .map_err(::tracerr::wrap!())
            }

            async fn exec<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ::tokio_postgres::types::ToSql + Sync)],
            ) -> Result<u64, ::tracerr::Traced<$crate::infra::database::Error>>
            where
                T: ::tokio_postgres::ToStatement + ?Sized,
            {
                let conn =
                    self.connection().await.map_err(::tracerr::wrap!())?;
                $crate::infra::database::postgres::Connection::exec(
                    &*conn, stmt, params,
                )
                .await
                .map_err(::tracerr::wrap!())
            }

            async fn batch_exec(
                &self,
                query: &str,
            ) -> Result<(), ::tracerr::Traced<$crate::infra::database::Error>>
            {
                let conn =
                    self.connection().await.map_err(::tracerr::wrap!())?;
                $crate::infra::database::postgres::Connection::batch_exec(
                    &*conn, query,
                )
                .await
                .map_err(::tracerr::wrap!())
            }
        }
    };
}

use delegate_connection;
