//! Relational data access.
//!
//! [`DataAccess`] reads query scripts and runs them through a
//! [`RelationalStore`], and writes datasets back as tables. The shipped store
//! is SQLite; each call opens its own connection and drops it on return.

use crate::config::ConnectionConfig;
use crate::dataset::{Column, TabularDataset, Value};
use crate::error::{PipelineError, PipelineResult};
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection, OpenFlags, ToSql};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// Where a dataset is read from. Only SQL query scripts are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceType {
    #[default]
    Sql,
}

impl FromStr for SourceType {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sql" => Ok(Self::Sql),
            other => Err(PipelineError::UnsupportedFormat(format!("source type '{other}'"))),
        }
    }
}

/// What happens to an existing destination table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Drop and recreate the table, discarding its contents.
    #[default]
    Replace,
}

impl FromStr for WriteMode {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replace" => Ok(Self::Replace),
            other => Err(PipelineError::UnsupportedFormat(format!("write mode '{other}'"))),
        }
    }
}

/// A relational backend able to run one query and replace one table.
pub trait RelationalStore {
    /// Runs `query` and returns the full result set.
    fn fetch(&self, query: &str) -> PipelineResult<TabularDataset>;

    /// Drops `namespace.table` if present, recreates it from the dataset's
    /// columns and inserts every row. Returns the number of rows written.
    fn replace_table(
        &self,
        dataset: &TabularDataset,
        namespace: Option<&str>,
        table: &str,
    ) -> PipelineResult<usize>;
}

/// SQLite database file.
///
/// Namespaces other than `main` are attached as sibling files named
/// `<namespace>.db`.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_existing(&self) -> PipelineResult<Connection> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        Ok(Connection::open_with_flags(&self.path, flags)?)
    }

    fn namespace_path(&self, namespace: &str) -> PathBuf {
        let dir = self.path.parent().unwrap_or_else(|| Path::new(""));
        dir.join(format!("{namespace}.db"))
    }
}

impl RelationalStore for SqliteStore {
    fn fetch(&self, query: &str) -> PipelineResult<TabularDataset> {
        let conn = self.open_existing()?;
        let mut stmt = conn.prepare(query)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut values: Vec<Vec<Value>> = vec![Vec::new(); names.len()];

        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            for (idx, column) in values.iter_mut().enumerate() {
                column.push(from_sql(row.get_ref(idx)?));
            }
        }

        TabularDataset::new(names.into_iter().zip(values).map(|(n, v)| Column::new(n, v)).collect())
    }

    fn replace_table(
        &self,
        dataset: &TabularDataset,
        namespace: Option<&str>,
        table: &str,
    ) -> PipelineResult<usize> {
        let mut conn = Connection::open(&self.path)?;

        let qualified = match namespace.filter(|ns| *ns != "main") {
            Some(ns) => {
                let file = self.namespace_path(ns);
                conn.execute(
                    &format!("ATTACH DATABASE ?1 AS {}", quote_ident(ns)),
                    [file.to_string_lossy().into_owned()],
                )?;
                format!("{}.{}", quote_ident(ns), quote_ident(table))
            }
            None => quote_ident(table),
        };

        // Not transactional: a failure after the drop leaves the table gone or empty.
        conn.execute(&format!("DROP TABLE IF EXISTS {qualified}"), [])?;
        let column_defs: Vec<String> = dataset
            .columns()
            .iter()
            .map(|c| format!("{} {}", quote_ident(&c.name), sql_type(c)))
            .collect();
        conn.execute(&format!("CREATE TABLE {qualified} ({})", column_defs.join(", ")), [])?;

        let names: Vec<String> = dataset.columns().iter().map(|c| quote_ident(&c.name)).collect();
        let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
        let insert = format!(
            "INSERT INTO {qualified} ({}) VALUES ({})",
            names.join(", "),
            placeholders.join(", ")
        );

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&insert)?;
            for row in 0..dataset.n_rows() {
                stmt.execute(params_from_iter(dataset.row(row)))?;
            }
        }
        tx.commit()?;

        Ok(dataset.n_rows())
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Self::Integer(v) => ToSqlOutput::Borrowed(ValueRef::Integer(*v)),
            Self::Real(v) => ToSqlOutput::Borrowed(ValueRef::Real(*v)),
            Self::Text(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
        })
    }
}

fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Integer(v),
        ValueRef::Real(v) => Value::Real(v),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

/// Declared column type: INTEGER if every value is an integer, REAL if every
/// value is numeric, TEXT otherwise. Nulls do not count.
fn sql_type(column: &Column) -> &'static str {
    let mut saw_real = false;
    let mut saw_value = false;
    for value in &column.values {
        match value {
            Value::Null => {}
            Value::Integer(_) => saw_value = true,
            Value::Real(_) => {
                saw_value = true;
                saw_real = true;
            }
            Value::Text(_) => return "TEXT",
        }
    }
    match (saw_value, saw_real) {
        (false, _) => "TEXT",
        (true, false) => "INTEGER",
        (true, true) => "REAL",
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Query-script retrieval and table write-back over a [`RelationalStore`].
#[derive(Debug, Clone)]
pub struct DataAccess<S = SqliteStore> {
    store: S,
}

impl DataAccess<SqliteStore> {
    /// Validates the connection parameters and targets their SQLite database.
    pub fn connect(config: &ConnectionConfig) -> PipelineResult<Self> {
        let path = config.database_path()?;
        info!(target_db = %config.redacted(), path = %path.display(), "Using relational store");
        Ok(Self { store: SqliteStore::new(path) })
    }
}

impl<S: RelationalStore> DataAccess<S> {
    pub fn with_store(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reads the query in `script_path` and runs it.
    ///
    /// A missing script is reported before any connection is opened.
    pub fn retrieve(&self, script_path: &Path) -> PipelineResult<TabularDataset> {
        if !script_path.exists() {
            return Err(PipelineError::NotFound(format!("query script {}", script_path.display())));
        }
        let query = std::fs::read_to_string(script_path)?;
        debug!(script = %script_path.display(), bytes = query.len(), "Running retrieval query");

        let dataset = self.store.fetch(&query)?;
        info!(
            script = %script_path.display(),
            rows = dataset.n_rows(),
            columns = dataset.n_columns(),
            "Retrieved dataset"
        );
        Ok(dataset)
    }

    /// Dispatches on the source type, then retrieves.
    pub fn retrieve_from(&self, path: &Path, source: SourceType) -> PipelineResult<TabularDataset> {
        match source {
            SourceType::Sql => self.retrieve(path),
        }
    }

    /// Writes `dataset` as `namespace.destination`.
    pub fn materialize(
        &self,
        dataset: &TabularDataset,
        destination: &str,
        namespace: Option<&str>,
        mode: WriteMode,
    ) -> PipelineResult<usize> {
        let rows = match mode {
            WriteMode::Replace => self.store.replace_table(dataset, namespace, destination)?,
        };
        info!(
            table = destination,
            namespace = namespace.unwrap_or("main"),
            rows,
            "Materialized dataset"
        );
        Ok(rows)
    }
}
