//! Catalog introspection and the text renderings of it that each front end uses.

use std::fmt::Write as _;

use rusqlite::Connection;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub not_null: bool,
    pub primary_key: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub from: String,
    pub table: String,
    pub to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseSchema {
    pub tables: Vec<TableSchema>,
}

impl DatabaseSchema {
    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    /// Banner listing printed after a load.
    pub fn render_listing(&self) -> String {
        let mut out = String::from("\nDatabase Schema:\n================\n");
        for table in &self.tables {
            let _ = writeln!(out, "\nTable: {}", table.name);
            let _ = writeln!(out, "{}", "-".repeat(table.name.len() + 7));
            for col in &table.columns {
                let pk = if col.primary_key { "Primary Key" } else { "" };
                let _ = writeln!(out, "Column: {:<20} Type: {:<10} {}", col.name, col.data_type, pk);
            }
        }
        out
    }

    /// Compact form handed to the agent, one `  - name (TYPE)` line per column.
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        for table in &self.tables {
            let _ = writeln!(out, "\nTable: {}", table.name);
            let lines: Vec<String> = table
                .columns
                .iter()
                .map(|c| format!("  - {} ({})", c.name, c.data_type))
                .collect();
            let _ = writeln!(out, "{}", lines.join("\n"));
        }
        out.trim().to_string()
    }

    /// Column constraints plus foreign keys, as embedded in the translator prompt.
    pub fn render_prompt_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for table in &self.tables {
            lines.push(format!("\nTable: {}", table.name));
            for col in &table.columns {
                let mut constraints = Vec::new();
                if col.not_null {
                    constraints.push("NOT NULL");
                }
                if col.primary_key {
                    constraints.push("PRIMARY KEY");
                }
                lines.push(
                    format!("- {} {} {}", col.name, col.data_type, constraints.join(" "))
                        .trim()
                        .to_string(),
                );
            }
        }

        for table in &self.tables {
            for fk in &table.foreign_keys {
                lines.push(format!(
                    "Foreign Key: {}.{} references {}({})",
                    table.name,
                    fk.from,
                    fk.table,
                    fk.to.as_deref().unwrap_or("")
                ));
            }
        }
        lines
    }
}

pub(crate) fn introspect(conn: &Connection) -> Result<DatabaseSchema> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        let columns = table_columns(conn, &name)?;
        let foreign_keys = table_foreign_keys(conn, &name)?;
        tables.push(TableSchema {
            name,
            columns,
            foreign_keys,
        });
    }

    Ok(DatabaseSchema { tables })
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<ColumnInfo>> {
    let mut stmt =
        conn.prepare("SELECT name, type, \"notnull\", pk FROM pragma_table_info(?1) ORDER BY cid")?;
    let columns = stmt
        .query_map([table], |row| {
            let not_null: i64 = row.get(2)?;
            let pk: i64 = row.get(3)?;
            Ok(ColumnInfo {
                name: row.get(0)?,
                data_type: row.get(1)?,
                not_null: not_null != 0,
                primary_key: pk > 0,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(columns)
}

fn table_foreign_keys(conn: &Connection, table: &str) -> Result<Vec<ForeignKey>> {
    let mut stmt = conn.prepare(
        "SELECT \"from\", \"table\", \"to\" FROM pragma_foreign_key_list(?1) ORDER BY id, seq",
    )?;
    let keys = stmt
        .query_map([table], |row| {
            Ok(ForeignKey {
                from: row.get(0)?,
                table: row.get(1)?,
                to: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> DatabaseSchema {
        DatabaseSchema {
            tables: vec![
                TableSchema {
                    name: "customers".to_string(),
                    columns: vec![
                        ColumnInfo {
                            name: "customer_id".to_string(),
                            data_type: "INTEGER".to_string(),
                            not_null: false,
                            primary_key: true,
                        },
                        ColumnInfo {
                            name: "name".to_string(),
                            data_type: "TEXT".to_string(),
                            not_null: true,
                            primary_key: false,
                        },
                    ],
                    foreign_keys: vec![],
                },
                TableSchema {
                    name: "orders".to_string(),
                    columns: vec![ColumnInfo {
                        name: "customer_id".to_string(),
                        data_type: "INTEGER".to_string(),
                        not_null: false,
                        primary_key: false,
                    }],
                    foreign_keys: vec![ForeignKey {
                        from: "customer_id".to_string(),
                        table: "customers".to_string(),
                        to: Some("customer_id".to_string()),
                    }],
                },
            ],
        }
    }

    #[test]
    fn test_render_summary() {
        let summary = sample_schema().render_summary();
        assert!(summary.starts_with("Table: customers\n  - customer_id (INTEGER)\n  - name (TEXT)"));
        assert!(summary.ends_with("Table: orders\n  - customer_id (INTEGER)"));
    }

    #[test]
    fn test_render_prompt_lines() {
        let lines = sample_schema().render_prompt_lines();
        assert!(lines.contains(&"- customer_id INTEGER PRIMARY KEY".to_string()));
        assert!(lines.contains(&"- name TEXT NOT NULL".to_string()));
        assert_eq!(
            lines.last().unwrap(),
            "Foreign Key: orders.customer_id references customers(customer_id)"
        );
    }

    #[test]
    fn test_render_listing_pads_columns() {
        let listing = sample_schema().render_listing();
        assert!(listing.contains("Table: customers\n----------------\n"));
        assert!(listing.contains("Column: customer_id          Type: INTEGER    Primary Key"));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let schema = sample_schema();
        let table = schema.table("Customers").unwrap();
        assert!(table.column("NAME").is_some());
        assert!(schema.table("invoices").is_none());
        assert_eq!(schema.table_names(), vec!["customers", "orders"]);
    }

    #[test]
    fn test_introspect_reads_declared_types() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE customers (customer_id INTEGER PRIMARY KEY, name TEXT NOT NULL);
             CREATE TABLE orders (order_id INTEGER PRIMARY KEY, customer_id INTEGER,
                 payment DECIMAL(10, 2),
                 FOREIGN KEY (customer_id) REFERENCES customers (customer_id));",
        )
        .unwrap();

        let schema = introspect(&conn).unwrap();
        assert_eq!(schema.table_names(), vec!["customers", "orders"]);

        let orders = schema.table("orders").unwrap();
        assert_eq!(orders.column("payment").unwrap().data_type, "DECIMAL(10, 2)");
        assert_eq!(orders.foreign_keys.len(), 1);
        assert_eq!(orders.foreign_keys[0].table, "customers");
    }
}
