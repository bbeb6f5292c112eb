//! [`Passport`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{passport, teacher, Passport},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Columns of the `passports` table in the order [`from_row()`] expects.
const COLUMNS: &str = "\
    id, teacher_id, number, kind, \
    issued_on, expires_on, \
    created_at";

/// Builds a [`Passport`] out of the provided `passports` table [`Row`].
fn from_row(row: &Row) -> Passport {
    Passport {
        id: row.get("id"),
        teacher_id: row.get("teacher_id"),
        number: row.get("number"),
        kind: row.get("kind"),
        issued_on: row.get("issued_on"),
        expires_on: row.get("expires_on"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Passport>, passport::Number>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Passport>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Passport>, passport::Number>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let number: passport::Number = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM passports \
             WHERE number = $1::VARCHAR \
             LIMIT 1",
        );
        Ok(self
            .query_opt(&sql, &[&number])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Passport>, teacher::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Passport>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Passport>, teacher::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let teacher_id: teacher::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM passports \
             WHERE teacher_id = $1::UUID \
             ORDER BY expires_on DESC",
        );
        Ok(self
            .query(&sql, &[&teacher_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Passport>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(passport): Insert<Passport>,
    ) -> Result<Self::Ok, Self::Err> {
        let Passport {
            id,
            teacher_id,
            number,
            kind,
            issued_on,
            expires_on,
            created_at,
        } = passport;

        const SQL: &str = "\
            INSERT INTO passports (\
                id, teacher_id, number, kind, \
                issued_on, expires_on, \
                created_at \
            ) VALUES (\
                $1::UUID, $2::UUID, $3::VARCHAR, $4::INT2, \
                $5::DATE, $6::DATE, \
                $7::TIMESTAMPTZ \
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET kind = EXCLUDED.kind, \
                issued_on = EXCLUDED.issued_on, \
                expires_on = EXCLUDED.expires_on";
        self.exec(
            SQL,
            &[
                &id,
                &teacher_id,
                &number,
                &kind,
                &issued_on,
                &expires_on,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
