//! [`Extension`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Select};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{contract, extension, Extension},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Columns of the `extensions` table in the order [`from_row()`] expects.
const COLUMNS: &str = "\
    id, contract_id, number, \
    from_date, to_date, \
    reason, notes, \
    created_by, created_at";

/// Builds an [`Extension`] out of the provided `extensions` table [`Row`].
fn from_row(row: &Row) -> Extension {
    Extension {
        id: row.get("id"),
        contract_id: row.get("contract_id"),
        number: row.get("number"),
        from_date: row.get("from_date"),
        to_date: row.get("to_date"),
        reason: row.get("reason"),
        notes: row.get("notes"),
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Extension>, extension::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Extension>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Extension>, extension::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: extension::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM extensions \
             WHERE id = $1::UUID \
             LIMIT 1",
        );
        Ok(self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Extension>, contract::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Extension>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Extension>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let contract_id: contract::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM extensions \
             WHERE contract_id = $1::UUID \
             ORDER BY number ASC",
        );
        Ok(self
            .query(&sql, &[&contract_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Extension>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(extension): Insert<Extension>,
    ) -> Result<Self::Ok, Self::Err> {
        let Extension {
            id,
            contract_id,
            number,
            from_date,
            to_date,
            reason,
            notes,
            created_by,
            created_at,
        } = extension;

        const SQL: &str = "\
            INSERT INTO extensions (\
                id, contract_id, number, \
                from_date, to_date, \
                reason, notes, \
                created_by, created_at \
            ) VALUES (\
                $1::UUID, $2::UUID, $3::INT4, \
                $4::DATE, $5::DATE, \
                $6::VARCHAR, $7::VARCHAR, \
                $8::UUID, $9::TIMESTAMPTZ \
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET from_date = EXCLUDED.from_date, \
                to_date = EXCLUDED.to_date, \
                reason = EXCLUDED.reason, \
                notes = EXCLUDED.notes";
        self.exec(
            SQL,
            &[
                &id,
                &contract_id,
                &number,
                &from_date,
                &to_date,
                &reason,
                &notes,
                &created_by,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Extension, extension::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Extension, extension::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: extension::Id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM extensions \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
