//! [`Contract`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Lock, Select},
    Money,
};
use postgres_types::ToSql;
use rust_decimal::Decimal;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{contract, Contract},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of the `contracts` table in the order [`from_row()`] expects.
const COLUMNS: &str = "\
    id, number, year, teacher_id, country, \
    start_date, end_date, base_end_date, \
    function, workplace, \
    salary, salary_currency, \
    status, notes, \
    created_at, deleted_at";

/// Builds a [`Contract`] out of the provided `contracts` table [`Row`].
fn from_row(row: &Row) -> Contract {
    Contract {
        id: row.get("id"),
        number: row.get("number"),
        year: row.get("year"),
        teacher_id: row.get("teacher_id"),
        country: row.get("country"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        base_end_date: row.get("base_end_date"),
        function: row.get("function"),
        workplace: row.get("workplace"),
        salary: row.get::<_, Option<Decimal>>("salary").map(|amount| Money {
            amount,
            currency: row.get("salary_currency"),
        }),
        status: row.get("status"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        deleted_at: row.get("deleted_at"),
    }
}

impl<C> Database<Select<By<Option<Contract>, contract::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Contract>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: contract::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM contracts \
             WHERE id = $1::UUID \
               AND deleted_at IS NULL \
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

impl<C> Database<Select<By<Option<contract::Number>, contract::Year>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<contract::Number>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<contract::Number>, contract::Year>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let year: contract::Year = by.into_inner();

        // Deleted `Contract`s still occupy their numbers.
        const SQL: &str = "\
            SELECT MAX(number) AS number \
            FROM contracts \
            WHERE year = $1::INT4";
        Ok(self
            .query_opt(SQL, &[&year])
            .await
            .map_err(tracerr::wrap!())?
            .and_then(|row| row.get("number")))
    }
}

impl<C> Database<Insert<Contract>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(contract): Insert<Contract>,
    ) -> Result<Self::Ok, Self::Err> {
        let Contract {
            id,
            number,
            year,
            teacher_id,
            country,
            start_date,
            end_date,
            base_end_date,
            function,
            workplace,
            salary,
            status,
            notes,
            created_at,
            deleted_at,
        } = contract;

        const SQL: &str = "\
            INSERT INTO contracts (\
                id, number, year, teacher_id, country, \
                start_date, end_date, base_end_date, \
                function, workplace, \
                salary, salary_currency, \
                status, notes, \
                created_at, deleted_at \
            ) VALUES (\
                $1::UUID, $2::INT4, $3::INT4, $4::UUID, $5::CHAR(2), \
                $6::DATE, $7::DATE, $8::DATE, \
                $9::VARCHAR, $10::VARCHAR, \
                $11::NUMERIC, $12::INT2, \
                $13::INT2, $14::VARCHAR, \
                $15::TIMESTAMPTZ, $16::TIMESTAMPTZ \
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET teacher_id = EXCLUDED.teacher_id, \
                country = EXCLUDED.country, \
                start_date = EXCLUDED.start_date, \
                end_date = EXCLUDED.end_date, \
                base_end_date = EXCLUDED.base_end_date, \
                function = EXCLUDED.function, \
                workplace = EXCLUDED.workplace, \
                salary = EXCLUDED.salary, \
                salary_currency = EXCLUDED.salary_currency, \
                status = EXCLUDED.status, \
                notes = EXCLUDED.notes, \
                deleted_at = EXCLUDED.deleted_at";
        self.exec(
            SQL,
            &[
                &id,
                &number,
                &year,
                &teacher_id,
                &country,
                &start_date,
                &end_date,
                &base_end_date,
                &function,
                &workplace,
                &salary.map(|s| s.amount),
                &salary.map(|s| s.currency),
                &status,
                &notes,
                &created_at,
                &deleted_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Contract, contract::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Contract, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: contract::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM contracts \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Contract, contract::Year>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Contract, contract::Year>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let year: contract::Year = by.into_inner();

        // Released automatically on the transaction end.
        const SQL: &str = "\
            SELECT pg_advisory_xact_lock(hashtext('contracts'), $1::INT4)";
        self.query(SQL, &[&year])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C>
    Database<
        Select<By<read::contract::list::Page, read::contract::list::Selector>>,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::contract::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::contract::list::Page, read::contract::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::contract::list::Selector {
            arguments,
            filter:
                read::contract::list::Filter {
                    country,
                    status,
                    teacher_id,
                },
        } = by.into_inner();

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];
        let mut conditions = vec!["deleted_at IS NULL".to_owned()];
        if let Some(country) = &country {
            ps.push(country);
            conditions.push(format!("country = ${}::CHAR(2)", ps.len()));
        }
        if let Some(status) = &status {
            ps.push(status);
            conditions.push(format!("status = ${}::INT2", ps.len()));
        }
        if let Some(teacher_id) = &teacher_id {
            ps.push(teacher_id);
            conditions.push(format!("teacher_id = ${}::UUID", ps.len()));
        }
        let conditions = conditions.join(" AND ");

        let sql = format!(
            "SELECT COUNT(*) AS total \
             FROM contracts \
             WHERE {conditions}",
        );
        let total = self
            .query_opt(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?
            .map_or(0, |row| row.get::<_, i64>("total"));

        let limit = i64::from(arguments.limit());
        let offset = i64::try_from(arguments.offset()).unwrap_or(i64::MAX);
        ps.push(&limit);
        let limit_idx = ps.len();
        ps.push(&offset);
        let offset_idx = ps.len();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM contracts \
             WHERE {conditions} \
             ORDER BY year DESC, number DESC \
             LIMIT ${limit_idx}::INT8 \
             OFFSET ${offset_idx}::INT8",
        );
        let items = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect::<Vec<_>>();

        Ok(read::contract::list::Page::new(
            arguments,
            items,
            u64::try_from(total).unwrap_or_default(),
        ))
    }
}
