//! Tools the agent loop can call. Every tool returns text; failures come back
//! as prefixed messages for the model to read, never as `Err`.

use chrono::Local;

use crate::database::{Database, QueryResult, StatementOutcome};

pub trait Tool {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn run(&self, input: &str) -> String;
}

pub const NO_ROWS: &str = "No rows found.";
pub const EXECUTED: &str = "SQL executed successfully.";

/// Runs one SQL statement against the live connection.
pub struct QueryDb<'a> {
    db: &'a Database,
}

impl<'a> QueryDb<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }
}

impl Tool for QueryDb<'_> {
    fn name(&self) -> &'static str {
        "query_db"
    }

    fn description(&self) -> &'static str {
        "Executes a given SQL command and returns the result."
    }

    fn run(&self, input: &str) -> String {
        match self.db.execute(input) {
            Ok(StatementOutcome::Rows(result)) => format_rows(&result),
            Ok(StatementOutcome::Executed { .. }) => EXECUTED.to_string(),
            Err(e) => format!("SQL execution error: {}", e),
        }
    }
}

pub fn format_rows(result: &QueryResult) -> String {
    if result.rows.is_empty() {
        return NO_ROWS.to_string();
    }

    let mut lines = Vec::with_capacity(result.rows.len() + 1);
    lines.push(result.columns.join(", "));
    for row in &result.rows {
        let values: Vec<String> = row.values.iter().map(|v| v.to_string()).collect();
        lines.push(values.join(", "));
    }
    lines.join("\n")
}

/// Lists the distinct values of one column, given as `table,column`.
pub struct ColumnValues<'a> {
    db: &'a Database,
}

impl<'a> ColumnValues<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn fetch(&self, input: &str) -> Result<Vec<String>, String> {
        let parts: Vec<&str> = input.split(',').map(str::trim).collect();
        let (table, column) = match parts.as_slice() {
            [table, column] if !table.is_empty() && !column.is_empty() => (*table, *column),
            _ => return Err(format!("expected \"table,column\", got \"{}\"", input)),
        };

        let schema = self.db.schema().map_err(|e| e.to_string())?;
        let table_schema = schema
            .table(table)
            .ok_or_else(|| format!("no such table: {}", table))?;
        let column_info = table_schema
            .column(column)
            .ok_or_else(|| format!("no such column: {}.{}", table_schema.name, column))?;

        let values = self
            .db
            .distinct_values(&table_schema.name, &column_info.name)
            .map_err(|e| e.to_string())?;
        Ok(values.iter().map(|v| v.to_string()).collect())
    }
}

impl Tool for ColumnValues<'_> {
    fn name(&self) -> &'static str {
        "get_column_values"
    }

    fn description(&self) -> &'static str {
        "Fetches all distinct values from a column in a table. Input format: \"table,column\". Example: \"customers,state\""
    }

    fn run(&self, input: &str) -> String {
        match self.fetch(input) {
            Ok(values) if values.is_empty() => "No values found.".to_string(),
            Ok(values) => values.join("\n"),
            Err(e) => format!("Error fetching values: {}", e),
        }
    }
}

/// Describes every table with its columns and declared types.
pub struct GetSchema<'a> {
    db: &'a Database,
}

impl<'a> GetSchema<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }
}

impl Tool for GetSchema<'_> {
    fn name(&self) -> &'static str {
        "get_schema"
    }

    fn description(&self) -> &'static str {
        "Returns the schema of all tables."
    }

    fn run(&self, _input: &str) -> String {
        match self.db.schema() {
            Ok(schema) => schema.render_summary(),
            Err(e) => format!("Error fetching schema: {}", e),
        }
    }
}

pub struct CurrentDatetime;

impl Tool for CurrentDatetime {
    fn name(&self) -> &'static str {
        "get_current_datetime"
    }

    fn description(&self) -> &'static str {
        "Returns the current date and time in the format YYYY-MM-DD HH:MM:SS."
    }

    fn run(&self, _input: &str) -> String {
        Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// The four tools exposed to the agent, in prompt order.
pub fn retail_tools(db: &Database) -> Vec<Box<dyn Tool + '_>> {
    vec![
        Box::new(QueryDb::new(db)),
        Box::new(ColumnValues::new(db)),
        Box::new(GetSchema::new(db)),
        Box::new(CurrentDatetime),
    ]
}
