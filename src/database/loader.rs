use std::fmt;
use std::path::Path;
use std::time::Instant;

use rusqlite::params_from_iter;

use crate::error::{Error, Result};
use crate::storage::csv::CsvReader;
use crate::storage::table::Table;

use super::connection::{quote_identifier, Database};
use super::tables::{TableDef, RETAIL_TABLES};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLoad {
    pub table: String,
    pub rows: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub tables: Vec<TableLoad>,
}

impl LoadReport {
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for load in &self.tables {
            writeln!(f, "Loaded {:<10} {} rows", load.table, load.rows)?;
        }
        write!(f, "({} rows total)", self.total_rows())
    }
}

/// Replaces each retail table wholesale from its CSV file.
pub struct Loader<'a> {
    db: &'a mut Database,
    reader: CsvReader,
}

impl<'a> Loader<'a> {
    pub fn new(db: &'a mut Database) -> Self {
        Self {
            db,
            reader: CsvReader::new(),
        }
    }

    pub fn with_reader(mut self, reader: CsvReader) -> Self {
        self.reader = reader;
        self
    }

    /// Loads every table in [`RETAIL_TABLES`] from `data_dir`.
    ///
    /// Tables are committed one at a time; an error stops the load and leaves
    /// the tables already replaced in place.
    #[tracing::instrument(skip(self, data_dir), fields(data_dir = %data_dir.display()))]
    pub fn load_directory(&mut self, data_dir: &Path) -> Result<LoadReport> {
        let started = Instant::now();
        let mut report = LoadReport::default();

        for def in RETAIL_TABLES {
            let path = data_dir.join(def.csv_file);
            if !path.is_file() {
                return Err(Error::MissingCsv(path.to_string_lossy().to_string()));
            }

            let table = self.reader.read_file(&path)?;
            tracing::debug!(
                file = def.csv_file,
                rows = table.row_count(),
                columns = table.column_count(),
                "csv read"
            );
            let rows = self.replace_table(def, &table)?;
            tracing::info!(table = def.name, rows, "table replaced");
            report.tables.push(TableLoad {
                table: def.name.to_string(),
                rows,
            });
        }

        tracing::info!(
            total_rows = report.total_rows(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "load finished"
        );
        Ok(report)
    }

    /// Drops, recreates and refills one table inside a single transaction.
    /// Values bind by CSV header name; a header the table does not declare
    /// fails at prepare time.
    pub fn replace_table(&mut self, def: &TableDef, table: &Table) -> Result<usize> {
        let tx = self.db.connection_mut().transaction()?;

        tx.execute_batch(&format!("DROP TABLE IF EXISTS {};", quote_identifier(def.name)))?;
        tx.execute_batch(def.ddl)?;

        let columns: Vec<String> = table
            .schema
            .column_names()
            .into_iter()
            .map(quote_identifier)
            .collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        let insert = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_identifier(def.name),
            columns.join(", "),
            placeholders.join(", ")
        );

        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(&insert)?;
            for row in table.iter() {
                inserted += stmt.execute(params_from_iter(row.values.iter()))?;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }
}
