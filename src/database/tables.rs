//! Declared shape of the retail store.
//!
//! Foreign keys are declared for introspection only; `PRAGMA foreign_keys`
//! is never enabled, so SQLite does not enforce them.

/// A table the loader knows how to (re)create, paired with its CSV source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub csv_file: &'static str,
    pub ddl: &'static str,
}

pub const CUSTOMERS: TableDef = TableDef {
    name: "customers",
    csv_file: "customers.csv",
    ddl: "
    CREATE TABLE IF NOT EXISTS customers (
        customer_id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT,
        gender TEXT,
        address TEXT,
        city TEXT,
        state TEXT
    )",
};

pub const PRODUCTS: TableDef = TableDef {
    name: "products",
    csv_file: "products.csv",
    ddl: "
    CREATE TABLE IF NOT EXISTS products (
        product_id INTEGER PRIMARY KEY,
        product_name TEXT NOT NULL,
        description TEXT,
        price DECIMAL(10, 2),
        stock_quantity INTEGER,
        category TEXT
    )",
};

pub const ORDERS: TableDef = TableDef {
    name: "orders",
    csv_file: "orders.csv",
    ddl: "
    CREATE TABLE IF NOT EXISTS orders (
        order_id INTEGER PRIMARY KEY,
        customer_id INTEGER,
        order_date DATE,
        payment DECIMAL(10, 2),
        FOREIGN KEY (customer_id) REFERENCES customers (customer_id)
    )",
};

pub const SALES: TableDef = TableDef {
    name: "sales",
    csv_file: "sales.csv",
    ddl: "
    CREATE TABLE IF NOT EXISTS sales (
        sale_id INTEGER PRIMARY KEY,
        order_id INTEGER,
        product_id INTEGER,
        quantity INTEGER,
        unit_price DECIMAL(10, 2),
        total_price DECIMAL(10, 2),
        FOREIGN KEY (order_id) REFERENCES orders (order_id),
        FOREIGN KEY (product_id) REFERENCES products (product_id)
    )",
};

/// Load order. Referenced tables come before the tables pointing at them.
pub const RETAIL_TABLES: &[TableDef] = &[CUSTOMERS, PRODUCTS, ORDERS, SALES];
