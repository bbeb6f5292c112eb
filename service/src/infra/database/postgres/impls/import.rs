//! [`Import`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use itertools::Itertools as _;
use tracerr::Traced;

use crate::{
    domain::{import, Import},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

impl<C> Database<Insert<Import>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(import): Insert<Import>,
    ) -> Result<Self::Ok, Self::Err> {
        let Import {
            id,
            user_id,
            file_name,
            checksum,
            rows,
            created_at,
        } = import;

        const SQL: &str = "\
            INSERT INTO imports (\
                id, user_id, file_name, checksum, created_at \
            ) VALUES (\
                $1::UUID, $2::UUID, $3::VARCHAR, $4::UUID, $5::TIMESTAMPTZ \
            ) \
            ON CONFLICT (id) DO NOTHING";
        self.exec(SQL, &[&id, &user_id, &file_name, &checksum, &created_at])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;

        if rows.is_empty() {
            return Ok(());
        }
        let (lines, outcomes, messages): (Vec<_>, Vec<_>, Vec<_>) = rows
            .into_iter()
            .map(|r| {
                (
                    i32::try_from(r.line).unwrap_or(i32::MAX),
                    i16::from(r.outcome.u8()),
                    r.message,
                )
            })
            .multiunzip();

        const ROWS_SQL: &str = "\
            INSERT INTO import_rows (import_id, line, outcome, message) \
            SELECT $1::UUID, line, outcome, message \
            FROM UNNEST($2::INT4[], $3::INT2[], $4::TEXT[]) \
                 AS r (line, outcome, message) \
            ON CONFLICT (import_id, line) DO UPDATE \
            SET outcome = EXCLUDED.outcome, \
                message = EXCLUDED.message";
        self.exec(ROWS_SQL, &[&id, &lines, &outcomes, &messages])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C>
    Database<Select<By<read::import::list::Page, read::import::list::Selector>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::import::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::import::list::Page, read::import::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::import::list::Selector {
            arguments,
            filter: read::import::list::Filter { user_id },
        } = by.into_inner();

        const COUNT_SQL: &str = "\
            SELECT COUNT(*) AS total \
            FROM imports \
            WHERE user_id = $1::UUID";
        let total = self
            .query_opt(COUNT_SQL, &[&user_id])
            .await
            .map_err(tracerr::wrap!())?
            .map_or(0, |row| row.get::<_, i64>("total"));

        let limit = i64::from(arguments.limit());
        let offset = i64::try_from(arguments.offset()).unwrap_or(i64::MAX);

        const SQL: &str = "\
            SELECT id, user_id, file_name, checksum, created_at \
            FROM imports \
            WHERE user_id = $1::UUID \
            ORDER BY created_at DESC, id DESC \
            LIMIT $2::INT8 \
            OFFSET $3::INT8";
        let mut imports = self
            .query(SQL, &[&user_id, &limit, &offset])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| Import {
                id: row.get("id"),
                user_id: row.get("user_id"),
                file_name: row.get("file_name"),
                checksum: row.get("checksum"),
                rows: vec![],
                created_at: row.get("created_at"),
            })
            .collect::<Vec<_>>();
        if imports.is_empty() {
            return Ok(read::import::list::Page::new(
                arguments,
                imports,
                u64::try_from(total).unwrap_or_default(),
            ));
        }
        let ids = imports.iter().map(|i| i.id).collect::<Vec<_>>();

        const ROWS_SQL: &str = "\
            SELECT import_id, line, outcome, message \
            FROM import_rows \
            WHERE import_id = ANY($1::UUID[]) \
            ORDER BY import_id, line ASC";
        let mut rows = self
            .query(ROWS_SQL, &[&ids])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                (
                    row.get::<_, import::Id>("import_id"),
                    import::Row {
                        line: u32::try_from(row.get::<_, i32>("line"))
                            .unwrap_or_default(),
                        outcome: row.get("outcome"),
                        message: row.get("message"),
                    },
                )
            })
            .into_group_map();
        for import in &mut imports {
            import.rows = rows.remove(&import.id).unwrap_or_default();
        }

        Ok(read::import::list::Page::new(
            arguments,
            imports,
            u64::try_from(total).unwrap_or_default(),
        ))
    }
}
