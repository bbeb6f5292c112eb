//! [`Teacher`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{teacher, Teacher},
    infra::{
        database::{
            self,
            postgres::{Connection, FuzzPattern},
            Postgres,
        },
        Database,
    },
    read,
};

/// Columns of the `teachers` table in the order [`from_row()`] expects.
const COLUMNS: &str = "\
    id, full_name, normalized_name, identity_card, \
    created_at, deleted_at";

/// Builds a [`Teacher`] out of the provided `teachers` table [`Row`].
fn from_row(row: &Row) -> Teacher {
    Teacher {
        id: row.get("id"),
        full_name: row.get("full_name"),
        normalized_name: row.get("normalized_name"),
        identity_card: row.get("identity_card"),
        created_at: row.get("created_at"),
        deleted_at: row.get("deleted_at"),
    }
}

impl<C> Database<Select<By<Option<Teacher>, teacher::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Teacher>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Teacher>, teacher::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: teacher::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM teachers \
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

impl<C> Database<Select<By<Option<Teacher>, teacher::IdentityCard>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Teacher>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Teacher>, teacher::IdentityCard>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let identity_card: teacher::IdentityCard = by.into_inner();

        // Deleted `Teacher`s keep occupying their cards.
        let sql = format!(
            "SELECT {COLUMNS} \
             FROM teachers \
             WHERE identity_card = $1::CHAR(11) \
             LIMIT 1",
        );
        Ok(self
            .query_opt(&sql, &[&identity_card])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Teacher>, teacher::NormalizedName>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Teacher>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Teacher>, teacher::NormalizedName>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let name: teacher::NormalizedName = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM teachers \
             WHERE normalized_name = $1::VARCHAR \
               AND deleted_at IS NULL",
        );
        Ok(self
            .query(&sql, &[&name])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Teacher>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(teacher): Insert<Teacher>,
    ) -> Result<Self::Ok, Self::Err> {
        let Teacher {
            id,
            full_name,
            normalized_name,
            identity_card,
            created_at,
            deleted_at,
        } = teacher;

        const SQL: &str = "\
            INSERT INTO teachers (\
                id, full_name, normalized_name, identity_card, \
                created_at, deleted_at \
            ) VALUES (\
                $1::UUID, $2::VARCHAR, $3::VARCHAR, $4::CHAR(11), \
                $5::TIMESTAMPTZ, $6::TIMESTAMPTZ \
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET full_name = EXCLUDED.full_name, \
                normalized_name = EXCLUDED.normalized_name, \
                identity_card = EXCLUDED.identity_card, \
                deleted_at = EXCLUDED.deleted_at";
        self.exec(
            SQL,
            &[
                &id,
                &full_name,
                &normalized_name,
                &identity_card,
                &created_at,
                &deleted_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C>
    Database<
        Select<By<read::teacher::list::Page, read::teacher::list::Selector>>,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::teacher::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::teacher::list::Page, read::teacher::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::teacher::list::Selector {
            arguments,
            filter: read::teacher::list::Filter { name },
        } = by.into_inner();

        let name_pattern = name.as_ref().map(FuzzPattern::new);

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];
        let name_filtering =
            name_pattern.as_ref().map_or_else(String::new, |p| {
                ps.push(p);
                format!("AND normalized_name SIMILAR TO ${}::VARCHAR", ps.len())
            });

        let sql = format!(
            "SELECT COUNT(*) AS total \
             FROM teachers \
             WHERE deleted_at IS NULL \
                   {name_filtering}",
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
             FROM teachers \
             WHERE deleted_at IS NULL \
                   {name_filtering} \
             ORDER BY normalized_name ASC, id ASC \
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

        Ok(read::teacher::list::Page::new(
            arguments,
            items,
            u64::try_from(total).unwrap_or_default(),
        ))
    }
}
