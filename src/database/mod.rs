mod connection;
mod loader;
mod schema;
pub mod tables;

pub use connection::{quote_identifier, AccessMode, Database, QueryResult, StatementOutcome};
pub use loader::{LoadReport, Loader, TableLoad};
pub use schema::{ColumnInfo, DatabaseSchema, ForeignKey, TableSchema};
