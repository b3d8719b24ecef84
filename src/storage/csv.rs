use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::table::{Column, DataType, Row, Schema, Table, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CsvError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("Empty CSV file")]
    EmptyFile,
}

pub struct CsvReader {
    delimiter: u8,
}

impl Default for CsvReader {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvReader {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn read_file(&self, path: &Path) -> Result<Table, CsvError> {
        let file = File::open(path)?;
        let table_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("table")
            .to_string();

        self.read_from_reader(file, &table_name)
    }

    pub fn read_from_reader<R: Read>(&self, reader: R, table_name: &str) -> Result<Table, CsvError> {
        let mut csv_reader = ::csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .trim(::csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut records = csv_reader.records();

        let headers: Vec<String> = match records.next() {
            Some(record) => record
                .map_err(|e| parse_error(&e))?
                .iter()
                .map(str::to_string)
                .collect(),
            None => return Err(CsvError::EmptyFile),
        };

        let mut raw_rows: Vec<Vec<String>> = Vec::new();
        for record in records {
            let record = record.map_err(|e| parse_error(&e))?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            raw_rows.push(record.iter().map(str::to_string).collect());
        }

        let types = self.infer_types(&raw_rows, headers.len());

        let columns: Vec<Column> = headers
            .iter()
            .zip(types.iter())
            .map(|(name, dtype)| Column::new(name.clone(), dtype.clone()))
            .collect();
        let schema = Schema::new(columns);

        // Short rows are padded with NULL; surplus cells are kept so the
        // engine reports the column-count mismatch on insert.
        let rows: Vec<Row> = raw_rows
            .iter()
            .map(|raw_row| {
                let mut values: Vec<Value> = raw_row
                    .iter()
                    .enumerate()
                    .map(|(i, s)| match types.get(i) {
                        Some(dtype) => self.parse_value(s, dtype),
                        None => self.parse_value(s, &DataType::String),
                    })
                    .collect();
                while values.len() < types.len() {
                    values.push(Value::Null);
                }
                Row::new(values)
            })
            .collect();

        Ok(Table::with_rows(table_name, schema, rows))
    }

    fn infer_types(&self, rows: &[Vec<String>], num_columns: usize) -> Vec<DataType> {
        let mut types = vec![DataType::Null; num_columns];

        for row in rows {
            for (i, value) in row.iter().enumerate() {
                if i >= num_columns {
                    break;
                }
                let inferred = self.infer_single_type(value);
                types[i] = self.merge_types(&types[i], &inferred);
            }
        }

        for dtype in &mut types {
            if *dtype == DataType::Null {
                *dtype = DataType::String;
            }
        }

        types
    }

    fn infer_single_type(&self, value: &str) -> DataType {
        if is_null_marker(value) {
            return DataType::Null;
        }

        if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false") {
            return DataType::Boolean;
        }

        if value.parse::<i64>().is_ok() {
            return DataType::Integer;
        }

        if value.parse::<f64>().is_ok() {
            return DataType::Float;
        }

        DataType::String
    }

    fn merge_types(&self, current: &DataType, new: &DataType) -> DataType {
        match (current, new) {
            (DataType::Null, other) | (other, DataType::Null) => other.clone(),
            (DataType::Integer, DataType::Float) | (DataType::Float, DataType::Integer) => DataType::Float,
            (a, b) if a == b => a.clone(),
            _ => DataType::String,
        }
    }

    fn parse_value(&self, value: &str, dtype: &DataType) -> Value {
        if is_null_marker(value) {
            return Value::Null;
        }

        match dtype {
            DataType::Integer => value.parse::<i64>().map(Value::Integer).unwrap_or(Value::Null),
            DataType::Float => value.parse::<f64>().map(Value::Float).unwrap_or(Value::Null),
            DataType::Boolean => {
                if value.eq_ignore_ascii_case("true") {
                    Value::Boolean(true)
                } else if value.eq_ignore_ascii_case("false") {
                    Value::Boolean(false)
                } else {
                    Value::Null
                }
            }
            DataType::String => Value::String(value.to_string()),
            DataType::Null => Value::Null,
        }
    }
}

fn is_null_marker(value: &str) -> bool {
    value.is_empty()
        || value.eq_ignore_ascii_case("null")
        || value.eq_ignore_ascii_case("na")
        || value.eq_ignore_ascii_case("n/a")
}

fn parse_error(err: &::csv::Error) -> CsvError {
    let line = err
        .position()
        .map(|p| p.line() as usize)
        .unwrap_or(0);
    CsvError::Parse {
        line,
        message: err.to_string(),
    }
}
