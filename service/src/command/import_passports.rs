//! [`Command`] for importing [`Passport`]s in bulk out of a CSV file.

use std::collections::{HashMap, HashSet};

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use smart_default::SmartDefault;
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::user::User;
use crate::{
    domain::{import, passport, teacher, user, Import, Passport, Teacher},
    infra::{database, Database},
    Service,
};

use super::Command;

/// Column holding the full name of a [`Teacher`].
const TEACHER_COLUMN: &str = "profesor";

/// Column holding the [`passport::Number`].
const NUMBER_COLUMN: &str = "numero";

/// Optional column holding the [`passport::Kind`].
const KIND_COLUMN: &str = "tipo";

/// Column holding the [`passport::IssueDate`].
const ISSUE_DATE_COLUMN: &str = "fecha_expedicion";

/// Column holding the [`passport::ExpirationDate`].
const EXPIRATION_DATE_COLUMN: &str = "fecha_vencimiento";

/// Name of the unique constraint on [`passport::Number`]s.
const NUMBER_CONSTRAINT: &str = "passports_number_key";

/// Configuration for [`ImportPassports`] [`Command`].
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Maximum number of data rows accepted in a single file.
    #[default(5000)]
    pub max_rows: usize,
}

/// [`Command`] for importing [`Passport`]s out of a CSV file.
///
/// Every row is stored on its own, so a failed row never affects the others.
/// The outcome of every row is recorded into an [`Import`].
#[derive(Clone, Debug)]
pub struct ImportPassports {
    /// Name of the uploaded file.
    pub file_name: import::FileName,

    /// Raw contents of the uploaded file.
    pub contents: Vec<u8>,

    /// ID of the [`User`] who uploaded the file.
    pub initiator_id: user::Id,
}

impl<Db> Command<ImportPassports> for Service<Db>
where
    Db: Database<
            Select<By<Vec<Teacher>, teacher::NormalizedName>>,
            Ok = Vec<Teacher>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Passport>, passport::Number>>,
            Ok = Option<Passport>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Passport>, Err = Traced<database::Error>>
        + Database<Insert<Import>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Import;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ImportPassports,
    ) -> Result<Self::Ok, Self::Err> {
        use import::Outcome as O;
        use ExecutionError as E;

        let ImportPassports {
            file_name,
            contents,
            initiator_id,
        } = cmd;

        let (columns, records) = read_file(&contents)?;
        let max = self.config().import_passports.max_rows;
        if records.len() > max {
            return Err(tracerr::new!(E::TooManyRows {
                rows: records.len(),
                max,
            }));
        }

        let mut rows = Vec::with_capacity(records.len());
        let mut seen = HashSet::new();
        for (line, record) in records {
            let candidate = match record
                .map_err(|e| format!("Fila ilegible: {e}"))
                .and_then(|r| Candidate::parse(&r, &columns))
            {
                Ok(c) => c,
                Err(message) => {
                    rows.push(import::Row {
                        line,
                        outcome: O::Failed,
                        message,
                    });
                    continue;
                }
            };
            let number = candidate.number.clone();

            let (outcome, message) = if seen.insert(number.clone()) {
                match self.import_passport(candidate).await {
                    Ok(res) => res,
                    Err(e) => {
                        log::warn!(
                            "failed to import `Passport` at line {line}: {e}",
                        );
                        (
                            O::Failed,
                            format!("Error al guardar el pasaporte {number}"),
                        )
                    }
                }
            } else {
                (
                    O::Skipped,
                    format!("Pasaporte {number} repetido en el archivo"),
                )
            };
            rows.push(import::Row {
                line,
                outcome,
                message,
            });
        }

        let import = Import {
            id: import::Id::new(),
            user_id: initiator_id,
            file_name,
            checksum: import::Checksum::new(&contents),
            rows,
            created_at: DateTime::now().coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(import.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`Import(id: {})` of `{}` by `User(id: {initiator_id})`: \
             {} rows, {} imported, {} skipped, {} failed",
            import.id,
            import.file_name,
            import.total(),
            import.count(O::Imported),
            import.count(O::Skipped),
            import.count(O::Failed),
        );

        Ok(import)
    }
}

impl<Db> Service<Db>
where
    Db: Database<
            Select<By<Vec<Teacher>, teacher::NormalizedName>>,
            Ok = Vec<Teacher>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Passport>, passport::Number>>,
            Ok = Option<Passport>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Passport>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    /// Resolves the [`Teacher`] of the provided [`Candidate`] and stores it as
    /// a new [`Passport`], unless it's registered already.
    async fn import_passport(
        &self,
        candidate: Candidate,
    ) -> Result<(import::Outcome, String), Traced<database::Error>> {
        use import::Outcome as O;

        let Candidate {
            teacher_name,
            number,
            kind,
            issued_on,
            expires_on,
        } = candidate;

        let teachers = self
            .database()
            .execute(Select(By::<Vec<Teacher>, _>::new(teacher_name.clone())))
            .await
            .map_err(tracerr::wrap!())?;
        let teacher = match teachers.as_slice() {
            [t] => t,
            [] => {
                return Ok((
                    O::Skipped,
                    format!("No se encontró el profesor «{teacher_name}»"),
                ));
            }
            _ => {
                return Ok((
                    O::Skipped,
                    format!(
                        "Nombre de profesor ambiguo: «{teacher_name}» \
                         ({} coincidencias)",
                        teachers.len(),
                    ),
                ));
            }
        };

        let existing = self
            .database()
            .execute(Select(By::<Option<Passport>, _>::new(number.clone())))
            .await
            .map_err(tracerr::wrap!())?;
        if existing.is_some() {
            return Ok((
                O::Skipped,
                format!("Pasaporte {number} ya registrado"),
            ));
        }

        let passport = Passport {
            id: passport::Id::new(),
            teacher_id: teacher.id,
            number,
            kind,
            issued_on,
            expires_on,
            created_at: DateTime::now().coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::wrap!())?;
        let inserted = tx.execute(Insert(passport.clone())).await;
        // Concurrent import of the same number.
        if let Err(e) = &inserted {
            if e.as_ref().is_unique_violation(Some(NUMBER_CONSTRAINT)) {
                return Ok((
                    O::Skipped,
                    format!("Pasaporte {} ya registrado", passport.number),
                ));
            }
        }
        inserted.map_err(tracerr::wrap!()).map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;

        Ok((
            O::Imported,
            format!(
                "Pasaporte {} registrado para {}",
                passport.number, teacher.full_name,
            ),
        ))
    }
}

/// Data of a [`Passport`] parsed out of a single CSV row.
#[derive(Clone, Debug)]
struct Candidate {
    /// Normalized name of the [`Teacher`] owning the [`Passport`].
    teacher_name: teacher::NormalizedName,

    /// [`passport::Number`] of the [`Passport`].
    number: passport::Number,

    /// [`passport::Kind`] of the [`Passport`].
    kind: passport::Kind,

    /// Date the [`Passport`] was issued at.
    issued_on: passport::IssueDate,

    /// Date the [`Passport`] expires at.
    expires_on: passport::ExpirationDate,
}

impl Candidate {
    /// Parses a [`Candidate`] out of the provided CSV `record`.
    ///
    /// Errors are human-readable explanations of what's wrong with the row.
    fn parse(
        record: &csv::StringRecord,
        columns: &Columns,
    ) -> Result<Self, String> {
        let field = |idx: usize| record.get(idx).unwrap_or_default();

        let teacher_name = teacher::NormalizedName::new(field(columns.teacher))
            .ok_or_else(|| "Falta el nombre del profesor".to_owned())?;

        let raw = field(columns.number);
        let number = passport::Number::new(raw)
            .ok_or_else(|| format!("Número de pasaporte inválido: «{raw}»"))?;

        let kind = match columns.kind.map(field).filter(|k| !k.is_empty()) {
            Some(raw) => passport::Kind::from_name(raw).ok_or_else(|| {
                format!("Tipo de pasaporte desconocido: «{raw}»")
            })?,
            None => passport::Kind::Ordinary,
        };

        let raw = field(columns.issue_date);
        let issued_on = raw
            .parse::<passport::IssueDate>()
            .map_err(|_| format!("Fecha de expedición inválida: «{raw}»"))?;

        let raw = field(columns.expiration_date);
        let expires_on = raw
            .parse::<passport::ExpirationDate>()
            .map_err(|_| format!("Fecha de vencimiento inválida: «{raw}»"))?;

        if expires_on.coerce::<()>() <= issued_on.coerce() {
            return Err("La fecha de vencimiento debe ser posterior a la de \
                        expedición"
                .to_owned());
        }

        Ok(Self {
            teacher_name,
            number,
            kind,
            issued_on,
            expires_on,
        })
    }
}

/// Indices of the recognized columns of an uploaded file.
#[derive(Clone, Copy, Debug)]
struct Columns {
    /// Index of the [`TEACHER_COLUMN`].
    teacher: usize,

    /// Index of the [`NUMBER_COLUMN`].
    number: usize,

    /// Index of the [`KIND_COLUMN`], if present.
    kind: Option<usize>,

    /// Index of the [`ISSUE_DATE_COLUMN`].
    issue_date: usize,

    /// Index of the [`EXPIRATION_DATE_COLUMN`].
    expiration_date: usize,
}

impl Columns {
    /// Locates the recognized columns in the provided `headers`.
    ///
    /// Header names are matched ignoring case, accents and spaces.
    fn locate(headers: &csv::StringRecord) -> Result<Self, ExecutionError> {
        let indices = headers
            .iter()
            .enumerate()
            .filter_map(|(idx, name)| {
                let name = teacher::NormalizedName::new(name)?;
                Some((name.as_ref().replace(' ', "_"), idx))
            })
            .collect::<HashMap<_, _>>();
        let required = |column: &'static str| {
            indices
                .get(column)
                .copied()
                .ok_or(ExecutionError::MissingColumn(column))
        };

        Ok(Self {
            teacher: required(TEACHER_COLUMN)?,
            number: required(NUMBER_COLUMN)?,
            kind: indices.get(KIND_COLUMN).copied(),
            issue_date: required(ISSUE_DATE_COLUMN)?,
            expiration_date: required(EXPIRATION_DATE_COLUMN)?,
        })
    }
}

/// Data rows of an uploaded file along with their line numbers.
type Records = Vec<(u32, Result<csv::StringRecord, csv::Error>)>;

/// Reads the header and all the non-blank data rows of the provided CSV
/// `contents`.
fn read_file(
    contents: &[u8],
) -> Result<(Columns, Records), Traced<ExecutionError>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(contents);

    let headers = reader
        .headers()
        .map_err(|e| tracerr::new!(ExecutionError::MalformedFile(e)))?;
    let columns = Columns::locate(headers).map_err(tracerr::wrap!())?;

    let records = reader
        .records()
        .enumerate()
        .filter_map(|(idx, record)| {
            let line = record
                .as_ref()
                .ok()
                .and_then(csv::StringRecord::position)
                .or_else(|| record.as_ref().err()?.position())
                .map_or_else(
                    || u32::try_from(idx + 2).unwrap_or(u32::MAX),
                    |p| u32::try_from(p.line()).unwrap_or(u32::MAX),
                );
            let blank = record
                .as_ref()
                .is_ok_and(|r| r.iter().all(str::is_empty));
            (!blank).then_some((line, record))
        })
        .collect();

    Ok((columns, records))
}

/// Error of [`ImportPassports`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Uploaded file is not a valid CSV.
    #[display("Malformed CSV file: {_0}")]
    MalformedFile(csv::Error),

    /// Uploaded file has no required column.
    #[display("Missing `{_0}` column")]
    MissingColumn(#[error(not(source))] &'static str),

    /// Uploaded file has too many data rows.
    #[display("File has {rows} rows, while at most {max} are allowed")]
    TooManyRows {
        /// Number of data rows in the uploaded file.
        rows: usize,

        /// Maximum allowed number of data rows.
        max: usize,
    },
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select};

    use crate::{
        command::ImportPassports,
        domain::{import, passport, teacher, user, Passport},
        infra::Database as _,
        testing, Service,
    };

    use super::{Config, ExecutionError};

    fn upload(contents: &str) -> ImportPassports {
        ImportPassports {
            file_name: import::FileName::new("pasaportes.csv").unwrap(),
            contents: contents.as_bytes().to_vec(),
            initiator_id: user::Id::new(),
        }
    }

    fn outcomes(import: &import::Import) -> Vec<(u32, import::Outcome)> {
        import.rows.iter().map(|r| (r.line, r.outcome)).collect()
    }

    #[tokio::test]
    async fn imports_rows_independently() {
        use import::Outcome as O;

        let svc = Service::in_memory();
        let maria = testing::teacher(&svc, "María José Pérez").await;
        _ = testing::teacher(&svc, "Luis Gómez").await;
        _ = testing::teacher(&svc, "Luis  GOMEZ").await;

        let import = svc
            .execute(upload(
                "profesor,numero,tipo,fecha_expedicion,fecha_vencimiento\n\
                 MARIA JOSE PEREZ,k123456,oficial,2022-01-10,2032-01-09\n\
                 Nadie Conocido,K654321,,2022-01-10,2032-01-09\n\
                 maría josé pérez,K123456,,2022-01-10,2032-01-09\n\
                 Luis Gómez,K777777,,2022-01-10,2032-01-09\n\
                 María José Pérez,K88,,2022-01-10,2032-01-09\n\
                 María José Pérez,K999999,,2032-01-10,2022-01-09\n\
                 María José Pérez,K111111,,,2032-01-09\n",
            ))
            .await
            .unwrap();

        assert_eq!(
            outcomes(&import),
            [
                (2, O::Imported),
                (3, O::Skipped),
                (4, O::Skipped),
                (5, O::Skipped),
                (6, O::Failed),
                (7, O::Failed),
                (8, O::Failed),
            ],
        );
        assert_eq!(import.total(), 7);
        assert_eq!(import.count(O::Imported), 1);

        let passports = svc
            .database()
            .execute(Select(By::<Vec<Passport>, _>::new(maria.id)))
            .await
            .unwrap();
        assert_eq!(passports.len(), 1);
        assert_eq!(passports[0].number.to_string(), "K123456");
        assert_eq!(passports[0].kind, passport::Kind::Official);
    }

    #[tokio::test]
    async fn skips_already_registered_numbers() {
        use import::Outcome as O;

        let svc = Service::in_memory();
        _ = testing::teacher(&svc, "Ana Rodríguez").await;
        let csv = "Profesor,Número,Fecha Expedición,Fecha Vencimiento\n\
                   Ana Rodríguez,AB12345,2020-05-01,2030-04-30\n";

        let first = svc.execute(upload(csv)).await.unwrap();
        let second = svc.execute(upload(csv)).await.unwrap();

        assert_eq!(outcomes(&first), [(2, O::Imported)]);
        assert_eq!(outcomes(&second), [(2, O::Skipped)]);
        assert_eq!(first.checksum, second.checksum);
    }

    #[tokio::test]
    async fn records_import_history() {
        let svc = Service::in_memory();
        let cmd = upload(
            "profesor,numero,fecha_expedicion,fecha_vencimiento\n\
             Desconocido,AB12345,2020-05-01,2030-04-30\n\
             \n\
             ,,,\n",
        );
        let user_id = cmd.initiator_id;

        let import = svc.execute(cmd).await.unwrap();

        assert_eq!(import.total(), 1);
        let history = svc
            .execute(crate::query::imports::List::by(
                crate::read::import::list::Selector {
                    arguments: crate::read::import::list::Arguments::new(
                        None, None,
                    )
                    .unwrap(),
                    filter: crate::read::import::list::Filter { user_id },
                },
            ))
            .await
            .unwrap()
            .items;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, import.id);
        assert_eq!(history[0].rows, import.rows);
    }

    #[tokio::test]
    async fn rejects_missing_column() {
        let svc = Service::in_memory();

        let err = svc
            .execute(upload("profesor,numero,fecha_expedicion\n"))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::MissingColumn("fecha_vencimiento"),
        ));
    }

    #[tokio::test]
    async fn rejects_too_many_rows() {
        let mut svc = Service::in_memory();
        svc.config.import_passports = Config { max_rows: 1 };
        _ = testing::teacher(&svc, "Ana Rodríguez").await;

        let err = svc
            .execute(upload(
                "profesor,numero,fecha_expedicion,fecha_vencimiento\n\
                 Ana Rodríguez,AB12345,2020-05-01,2030-04-30\n\
                 Ana Rodríguez,AB12346,2020-05-01,2030-04-30\n",
            ))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::TooManyRows { rows: 2, max: 1 },
        ));
        let teachers = svc
            .database()
            .execute(Select(By::<Vec<teacher::Teacher>, _>::new(
                teacher::NormalizedName::new("ana rodriguez").unwrap(),
            )))
            .await
            .unwrap();
        let passports = svc
            .database()
            .execute(Select(By::<Vec<Passport>, _>::new(teachers[0].id)))
            .await
            .unwrap();
        assert!(passports.is_empty());
    }
}
